//! Lamp lighting and the celebration it starts.
//!
//! A [`Celebration`] owns every background activity of the page: the
//! render loop, the firecracker spawner, the confetti show and the music.
//! Lighting the lamp starts them once; [`Celebration::teardown`] (or
//! dropping the celebration) stops them all and releases the audio device.
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use diya_kernel::prelude::*;
//!
//! let host = Rc::new(HostLoop::default());
//! let canvas = share(PixelCanvas::new(320, 240));
//! let parts = CelebrationParts::new(host.clone(), host.clone(), Viewport::new(320, 240))
//!     .with_surface(canvas);
//! let mut celebration = Celebration::new(&ShowConfig::default().with_seed(7), parts);
//!
//! celebration.light_lamp();
//! host.advance(Duration::from_secs(2));
//! assert!(!celebration.field().borrow().is_empty());
//!
//! celebration.teardown();
//! assert_eq!(host.pending_callbacks(), 0);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use diya_common::DiyaError;
use tracing::{debug, info, warn};

use crate::audio::{MusicPlayer, SilentPlayer};
use crate::confetti::{ConfettiShow, FieldConfetti, SharedLauncher, TracingConfetti};
use crate::config::ShowConfig;
use crate::decor::SceneState;
use crate::field::{ParticleField, SharedField};
use crate::host::{FrameScheduler, IntervalHandle, TimerService};
use crate::render_loop::RenderLoop;
use crate::spawner::Spawner;
use crate::surface::{SharedSurface, SurfaceManager, Viewport};

/// Host services and collaborators a celebration runs on.
pub struct CelebrationParts {
    /// Display frame source.
    pub frames: Rc<dyn FrameScheduler>,
    /// Interval timers.
    pub timers: Rc<dyn TimerService>,
    /// Drawing surface, `None` when the host cannot draw.
    pub surface: Option<SharedSurface>,
    /// Initial viewport.
    pub viewport: Viewport,
    /// Music track.
    pub music: Box<dyn MusicPlayer>,
    /// Confetti sink. Defaults to confetti particles in a field of their
    /// own, or to logging when there is no surface.
    pub confetti: Option<SharedLauncher>,
}

impl CelebrationParts {
    /// Parts with no surface, silent music and the default confetti sink.
    #[must_use]
    pub fn new(
        frames: Rc<dyn FrameScheduler>,
        timers: Rc<dyn TimerService>,
        viewport: Viewport,
    ) -> Self {
        Self {
            frames,
            timers,
            surface: None,
            viewport,
            music: Box::new(SilentPlayer::new()),
            confetti: None,
        }
    }

    /// Sets the drawing surface.
    #[must_use]
    pub fn with_surface(mut self, surface: SharedSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Sets the music player.
    #[must_use]
    pub fn with_music(mut self, music: Box<dyn MusicPlayer>) -> Self {
        self.music = music;
        self
    }

    /// Sets the confetti sink.
    #[must_use]
    pub fn with_confetti(mut self, confetti: SharedLauncher) -> Self {
        self.confetti = Some(confetti);
        self
    }
}

/// The festive page's state machine: unlit, then celebrating until torn down.
pub struct Celebration {
    config: ShowConfig,
    timers: Rc<dyn TimerService>,
    surfaces: SurfaceManager,
    field: SharedField,
    confetti_field: Option<SharedField>,
    render: RenderLoop,
    spawner: Spawner,
    show: ConfettiShow,
    confetti: SharedLauncher,
    music: Box<dyn MusicPlayer>,
    spawn_timer: Option<IntervalHandle>,
    confetti_timer: Option<IntervalHandle>,
    lamp_lit: bool,
    torn_down: bool,
}

impl Celebration {
    /// Creates an unlit celebration. The config is clamped first.
    #[must_use]
    pub fn new(config: &ShowConfig, parts: CelebrationParts) -> Self {
        let mut config = config.clone();
        config.validate();

        let mut rng = config.rng();
        let field = ParticleField::from_config(&config).shared();
        let spawner = Spawner::new(&config, fastrand::Rng::with_seed(rng.u64(..)));
        let show = ConfettiShow::new(&config.confetti, fastrand::Rng::with_seed(rng.u64(..)));

        let mut confetti_field = None;
        let confetti = match (parts.confetti, &parts.surface) {
            (Some(confetti), _) => confetti,
            (None, Some(surface)) => {
                let launcher = FieldConfetti::new(
                    &config.confetti,
                    surface.clone(),
                    fastrand::Rng::with_seed(rng.u64(..)),
                );
                confetti_field = Some(launcher.field().clone());
                Rc::new(RefCell::new(launcher)) as SharedLauncher
            },
            (None, None) => Rc::new(RefCell::new(TracingConfetti::default())) as SharedLauncher,
        };

        Self {
            timers: parts.timers,
            surfaces: SurfaceManager::new(parts.surface, parts.viewport),
            field,
            confetti_field,
            render: RenderLoop::new(parts.frames),
            spawner,
            show,
            confetti,
            music: parts.music,
            spawn_timer: None,
            confetti_timer: None,
            lamp_lit: false,
            torn_down: false,
            config,
        }
    }

    /// Lights the lamp and starts the celebration.
    ///
    /// Only the first call before teardown does anything; returns whether
    /// this call lit it.
    pub fn light_lamp(&mut self) -> bool {
        if self.torn_down {
            debug!("Celebration torn down, lamp stays dark");
            return false;
        }
        if self.lamp_lit {
            debug!("Lamp already lit");
            return false;
        }
        self.lamp_lit = true;
        info!("Lamp lit, celebration starting");

        if let Err(e) = self.music.play() {
            warn!("Music did not start: {}", e);
        }

        self.confetti_timer = Some(self.show.start(&self.timers, self.confetti.clone()));

        match self.surfaces.activate() {
            Some(surface) => {
                let count = self.config.fountain_count;
                if count > 0 {
                    let bounds = surface.borrow().bounds();
                    let fountain = self.spawner.seed_fountain(bounds, count);
                    self.field.borrow_mut().add(fountain);
                }
                self.spawn_timer =
                    Some(self.spawner.start(&self.timers, self.field.clone(), surface.clone()));
                let mut layers = vec![self.field.clone()];
                layers.extend(self.confetti_field.clone());
                self.render.start_layers(layers, surface);
            },
            None => warn!("{}, firecrackers disabled", DiyaError::SurfaceUnavailable),
        }
        true
    }

    /// Flips the music mute flag and returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.music.is_muted();
        self.music.set_muted(muted);
        debug!("Music {}", if muted { "muted" } else { "unmuted" });
        muted
    }

    /// Forwards a viewport resize to the surface.
    pub fn resize(&mut self, viewport: Viewport) {
        self.surfaces.on_resize(viewport);
    }

    /// Stops every background activity and releases the audio device.
    ///
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.render.stop();
        if let Some(mut timer) = self.spawn_timer.take() {
            timer.cancel();
        }
        if let Some(mut timer) = self.confetti_timer.take() {
            timer.cancel();
        }
        self.surfaces.deactivate();
        self.music.pause();
        self.music.release();
        info!("Celebration torn down");
    }

    /// Whether the lamp has been lit.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lamp_lit
    }

    /// Whether the celebration is running.
    #[must_use]
    pub fn is_celebrating(&self) -> bool {
        self.lamp_lit && !self.torn_down
    }

    /// Whether the music is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.music.is_muted()
    }

    /// What the decorations should show.
    #[must_use]
    pub fn scene_state(&self) -> SceneState {
        SceneState {
            lamp_lit: self.lamp_lit,
            celebrating: self.is_celebrating(),
        }
    }

    /// The firecracker field.
    #[must_use]
    pub fn field(&self) -> &SharedField {
        &self.field
    }

    /// The confetti field, when the default confetti sink is in use.
    #[must_use]
    pub fn confetti_field(&self) -> Option<&SharedField> {
        self.confetti_field.as_ref()
    }

    /// The render loop.
    #[must_use]
    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    /// The surface binding.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    /// The clamped config in use.
    #[must_use]
    pub fn config(&self) -> &ShowConfig {
        &self.config
    }
}

impl Drop for Celebration {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Celebration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Celebration")
            .field("lamp_lit", &self.lamp_lit)
            .field("torn_down", &self.torn_down)
            .field("particles", &self.field.borrow().len())
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}
