//! Background music.
//!
//! The page plays one looped track once the lamp is lit. Playback sits
//! behind [`MusicPlayer`] so the celebration runs the same with or without
//! an audio device:
//!
//! - [`SilentPlayer`]: no device, only tracks state
//! - `RodioPlayer`: real playback through rodio (`rodio-backend` feature)

use std::cell::RefCell;
use std::rc::Rc;

use diya_common::{AudioError, AudioResult};
use tracing::debug;

/// A single looped music track.
pub trait MusicPlayer {
    /// Starts or resumes playback. May be rejected by the host.
    fn play(&mut self) -> AudioResult<()>;

    /// Pauses playback.
    fn pause(&mut self);

    /// Mutes or unmutes without pausing.
    fn set_muted(&mut self, muted: bool);

    /// Whether output is muted.
    fn is_muted(&self) -> bool;

    /// Whether the track is playing.
    fn is_playing(&self) -> bool;

    /// Stops playback and frees the device. Later `play` calls fail.
    fn release(&mut self);
}

impl<P: MusicPlayer + ?Sized> MusicPlayer for Rc<RefCell<P>> {
    fn play(&mut self) -> AudioResult<()> {
        self.borrow_mut().play()
    }

    fn pause(&mut self) {
        self.borrow_mut().pause();
    }

    fn set_muted(&mut self, muted: bool) {
        self.borrow_mut().set_muted(muted);
    }

    fn is_muted(&self) -> bool {
        self.borrow().is_muted()
    }

    fn is_playing(&self) -> bool {
        self.borrow().is_playing()
    }

    fn release(&mut self) {
        self.borrow_mut().release();
    }
}

/// Player without an output device.
#[derive(Debug, Default, Clone)]
pub struct SilentPlayer {
    playing: bool,
    muted: bool,
    released: bool,
    play_count: u32,
    rejection: Option<String>,
}

impl SilentPlayer {
    /// Creates a player that accepts `play`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a player whose `play` is always refused, like a host that
    /// blocks autoplay.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Successful `play` calls.
    #[must_use]
    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    /// Whether `release` was called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl MusicPlayer for SilentPlayer {
    fn play(&mut self) -> AudioResult<()> {
        if self.released {
            return Err(AudioError::Released);
        }
        if let Some(reason) = &self.rejection {
            return Err(AudioError::PlaybackRejected(reason.clone()));
        }
        self.playing = true;
        self.play_count += 1;
        debug!("Music playing (silent)");
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn release(&mut self) {
        self.playing = false;
        self.released = true;
    }
}

#[cfg(feature = "rodio-backend")]
pub use backend::RodioPlayer;

#[cfg(feature = "rodio-backend")]
mod backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};

    use diya_common::{AudioError, AudioResult};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, info};

    use super::MusicPlayer;

    /// Looped track played through the default output device.
    pub struct RodioPlayer {
        path: PathBuf,
        // Dropping the stream silences the sink, so it lives as long as we do.
        device: Option<(OutputStream, OutputStreamHandle)>,
        sink: Option<Sink>,
        muted: bool,
    }

    impl std::fmt::Debug for RodioPlayer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RodioPlayer")
                .field("path", &self.path)
                .field("muted", &self.muted)
                .finish_non_exhaustive()
        }
    }

    impl RodioPlayer {
        /// Opens the default output device for the track at `path`.
        ///
        /// The file is decoded on the first `play`.
        pub fn new(path: impl AsRef<Path>) -> AudioResult<Self> {
            let device = OutputStream::try_default()
                .map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;
            info!("Audio device initialized");
            Ok(Self {
                path: path.as_ref().to_path_buf(),
                device: Some(device),
                sink: None,
                muted: false,
            })
        }

        fn volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                1.0
            }
        }

        fn load(&self, handle: &OutputStreamHandle) -> AudioResult<Sink> {
            let file = File::open(&self.path).map_err(|e| AudioError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|e| AudioError::DecodeFailed(e.to_string()))?;
            let sink =
                Sink::try_new(handle).map_err(|e| AudioError::DeviceInitFailed(e.to_string()))?;
            sink.set_volume(self.volume());
            sink.append(source.repeat_infinite());
            debug!("Loaded music from {:?}", self.path);
            Ok(sink)
        }
    }

    impl MusicPlayer for RodioPlayer {
        fn play(&mut self) -> AudioResult<()> {
            let Some((_, handle)) = &self.device else {
                return Err(AudioError::Released);
            };
            if self.sink.is_none() {
                self.sink = Some(self.load(handle)?);
            }
            if let Some(sink) = &self.sink {
                sink.play();
            }
            Ok(())
        }

        fn pause(&mut self) {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if let Some(sink) = &self.sink {
                sink.set_volume(self.volume());
            }
        }

        fn is_muted(&self) -> bool {
            self.muted
        }

        fn is_playing(&self) -> bool {
            self.sink
                .as_ref()
                .is_some_and(|sink| !sink.is_paused() && !sink.empty())
        }

        fn release(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            self.device = None;
            debug!("Audio device released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_player_tracks_state() {
        let mut player = SilentPlayer::new();
        assert!(!player.is_playing());
        player.play().expect("silent play");
        assert!(player.is_playing());
        player.set_muted(true);
        assert!(player.is_muted());
        assert!(player.is_playing());
        player.pause();
        assert!(!player.is_playing());
        assert_eq!(player.play_count(), 1);
    }

    #[test]
    fn test_rejected_play_reports_reason() {
        let mut player = SilentPlayer::rejecting("autoplay blocked");
        let err = player.play().expect_err("rejected");
        assert!(matches!(err, AudioError::PlaybackRejected(ref r) if r == "autoplay blocked"));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_play_after_release_fails() {
        let mut player = SilentPlayer::new();
        player.play().expect("play");
        player.release();
        assert!(player.is_released());
        assert!(!player.is_playing());
        assert!(matches!(player.play(), Err(AudioError::Released)));
    }

    #[test]
    fn test_shared_player_forwards() {
        let shared = Rc::new(RefCell::new(SilentPlayer::new()));
        let mut boxed: Box<dyn MusicPlayer> = Box::new(shared.clone());
        boxed.play().expect("play");
        boxed.set_muted(true);
        assert_eq!(shared.borrow().play_count(), 1);
        assert!(shared.borrow().is_muted());
    }
}
