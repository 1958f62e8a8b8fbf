//! Headless celebration run.
//!
//! Drives the kernel on a virtual host clock: lights the lamp after the
//! configured delay, repaints at the refresh rate and writes a composed
//! PNG every few frames (backdrop, firecrackers, then the foreground
//! decorations).

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use diya_common::Rgb;
use diya_kernel::audio::{MusicPlayer, SilentPlayer};
use diya_kernel::canvas::PixelCanvas;
use diya_kernel::celebration::{Celebration, CelebrationParts};
use diya_kernel::decor::Scene;
use diya_kernel::host::HostLoop;
use diya_kernel::surface::{SharedSurface, Viewport};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::timing::FramePacer;

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames simulated.
    pub frames: u64,
    /// PNG files written.
    pub captures: Vec<PathBuf>,
    /// Most particles alive at once, confetti included.
    pub peak_particles: usize,
    /// Particles refused by the caps.
    pub dropped: u64,
}

/// Runs the celebration for the configured duration.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let viewport = Viewport::new(config.viewport_width, config.viewport_height);
    let host = Rc::new(HostLoop::new(config.refresh_hz));
    // Sized to the viewport when the lamp is lit.
    let particles = Rc::new(RefCell::new(PixelCanvas::new(1, 1)));
    let surface: SharedSurface = particles.clone();

    let parts = CelebrationParts::new(host.clone(), host.clone(), viewport)
        .with_surface(surface)
        .with_music(music_player(config));
    let mut celebration = Celebration::new(&config.show, parts);
    if config.muted {
        celebration.toggle_mute();
    }

    let mut rng = config.show.rng();
    let scene = Scene::generate(&mut rng);

    if config.capture_every > 0 {
        fs::create_dir_all(&config.output_dir).with_context(|| {
            format!("creating output directory {}", config.output_dir.display())
        })?;
    }

    let total_frames = config.total_frames();
    let mut pacer = FramePacer::new(config.refresh_hz).with_realtime(config.realtime);
    let mut summary = RunSummary::default();
    info!(
        "Running {} frames of {:?} ({}x{})",
        total_frames,
        pacer.frame_budget(),
        viewport.width,
        viewport.height
    );

    for frame in 0..total_frames {
        pacer.begin_frame();

        if !celebration.is_lit() && host.now() >= config.light_after() {
            celebration.light_lamp();
        }
        host.advance_frame();
        summary.frames += 1;

        let live = celebration.field().borrow().len()
            + celebration.confetti_field().map_or(0, |f| f.borrow().len());
        summary.peak_particles = summary.peak_particles.max(live);

        if config.capture_every > 0 && frame % u64::from(config.capture_every) == 0 {
            let mut composed = PixelCanvas::new(viewport.width, viewport.height);
            composed.fill_vertical_gradient(Rgb::INDIGO, Rgb::BLACK);
            let t = host.now();
            scene.draw_backdrop(&mut composed, t);
            composed.composite(&particles.borrow());
            scene.draw_foreground(&mut composed, t, celebration.scene_state());

            let path = config.output_dir.join(format!("frame_{frame:05}.png"));
            composed
                .save_png(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            debug!("Captured frame {} ({} particles)", frame, live);
            summary.captures.push(path);
        }

        pacer.end_frame();
    }

    summary.dropped = celebration.field().borrow().dropped()
        + celebration.confetti_field().map_or(0, |f| f.borrow().dropped());
    celebration.teardown();
    if host.pending_callbacks() > 0 {
        warn!("{} host callbacks still pending after teardown", host.pending_callbacks());
    }

    info!(
        "Run complete: {} frames, {} captures, peak {} particles, avg {:.2} ms/frame",
        summary.frames,
        summary.captures.len(),
        summary.peak_particles,
        pacer.average_frame_time_ms()
    );
    Ok(summary)
}

#[cfg(feature = "rodio-backend")]
fn music_player(config: &EngineConfig) -> Box<dyn MusicPlayer> {
    use diya_kernel::audio::RodioPlayer;

    let Some(path) = &config.music_path else {
        return Box::new(SilentPlayer::new());
    };
    match RodioPlayer::new(path) {
        Ok(player) => Box::new(player),
        Err(e) => {
            warn!("Audio unavailable, running silent: {}", e);
            Box::new(SilentPlayer::new())
        },
    }
}

#[cfg(not(feature = "rodio-backend"))]
fn music_player(config: &EngineConfig) -> Box<dyn MusicPlayer> {
    if let Some(path) = &config.music_path {
        warn!(
            "Built without audio support, not playing {}",
            path.display()
        );
    }
    Box::new(SilentPlayer::new())
}
