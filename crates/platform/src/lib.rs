//! Platform layer: windowing, event loop and frame pacing.
//!
//! - Redraws are requested after each presented frame; vsync paces the loop.
//! - Resize/scale/close are handled here, rendering is delegated to `GpuState`.
//! - Animation time comes from a `TimeSource` chosen at startup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use corelib::clock::{ManualClock, TimeSource, WallClock};
use renderer::{GpuState, RenderError};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Everything the host needs to open a window and build the scene.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    pub show_fps: bool,
    /// Mesh text for the imported-mesh renderable.
    pub mesh_text: String,
    /// Freeze animation at this time (seconds) instead of the wall clock.
    pub fixed_time: Option<f32>,
}

/// Pick the animation clock for a run.
pub fn make_clock(fixed_time: Option<f32>) -> Box<dyn TimeSource> {
    match fixed_time {
        Some(t) => Box::new(ManualClock::at(t)),
        None => Box::new(WallClock::new()),
    }
}

/// Counts frames and reports a rate once per interval.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    interval: Duration,
}

impl FpsCounter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            interval: Duration::from_secs(1),
        }
    }

    fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}

struct App {
    config: RunConfig,
    clock: Box<dyn TimeSource>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    fps: Option<FpsCounter>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RunConfig) -> Self {
        let clock = make_clock(config.fixed_time);
        Self {
            config,
            clock,
            window: None,
            gpu: None,
            fps: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Lumen3D")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.config.mesh_text,
        ))
        .context("Failed to build renderer")?;

        if self.config.show_fps {
            self.fps = Some(FpsCounter::new(Instant::now()));
        }
        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        match gpu.render(self.clock.seconds()) {
            Ok(()) => {}
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated; reconfiguring");
                gpu.recreate_surface();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout; skipping frame");
            }
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Render failed"));
                return;
            }
        }

        if let Some(fps) = self.fps.as_mut().and_then(|c| c.tick(Instant::now())) {
            log::info!("FPS: {:.1}", fps);
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {:.3}", scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and render the scene until it is closed.
pub fn run_with_renderer(config: RunConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_uses_manual_clock() {
        let clock = make_clock(Some(0.75));
        assert_eq!(clock.seconds(), 0.75);
        assert_eq!(clock.seconds(), 0.75);
    }

    #[test]
    fn default_clock_starts_near_zero() {
        let clock = make_clock(None);
        assert!(clock.seconds() < 60.0);
    }

    #[test]
    fn fps_reports_once_per_interval() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        for i in 1..60 {
            assert_eq!(fps.tick(start + Duration::from_millis(i * 16)), None);
        }
        let rate = fps.tick(start + Duration::from_secs(1)).expect("report");
        assert!((rate - 60.0).abs() < 1e-3);
        assert_eq!(fps.frames, 0);
    }
}
