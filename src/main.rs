mod camera;
mod camera_controller;
mod config;
mod grid;
mod oscillator;
mod renderer;
mod scene;
mod surface;

use config::SurfaceConfig;
use oscillator::Animation;
use renderer::State;
use scene::Scene;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

struct App {
    config: SurfaceConfig,
    window: Option<Arc<Window>>,
    state: Option<State>,
    animation: Animation,
    next_frame_at: Instant,
}

impl App {
    fn new(config: SurfaceConfig) -> Self {
        Self {
            animation: Animation::new(config.period_frames),
            config,
            window: None,
            state: None,
            next_frame_at: Instant::now(),
        }
    }

    /// Advances the animation by one frame once its interval has elapsed.
    /// After a stall the schedule restarts from `now`; missed frames are
    /// not replayed.
    fn tick(&mut self, now: Instant) -> bool {
        if now < self.next_frame_at {
            return false;
        }
        if self.animation.advance() {
            log::debug!("animation cycle restarted");
        }
        self.next_frame_at += self.config.frame_interval;
        if self.next_frame_at <= now {
            self.next_frame_at = now + self.config.frame_interval;
        }
        true
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes().with_title(config::TITLE);
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let scene = Scene::new(self.config.clone());
        match pollster::block_on(State::new(window, scene)) {
            Ok(state) => {
                self.state = Some(state);
                self.next_frame_at = Instant::now() + self.config.frame_interval;
            }
            Err(e) => {
                log::error!("failed to create render state: {e:?}");
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = self.state.as_mut() {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.mouse_motion(delta);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let window = match self.window.as_ref() {
            Some(w) => w,
            None => return,
        };
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        if id != window.id() {
            return;
        }

        if state.input(&event) {
            window.request_redraw();
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size);
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                state.update_camera();
                match state.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::warn!("surface lost, reconfiguring");
                        state.resize(state.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of GPU memory");
                        event_loop.exit();
                    }
                    Err(e) => log::error!("render failed: {e:?}"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let camera_moving = state.is_camera_moving();

        if self.tick(Instant::now()) {
            let frame = self.animation.frame();
            if let Some(state) = self.state.as_mut() {
                state.set_frame(frame);
            }
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        } else if camera_moving {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_at));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = SurfaceConfig::default();
    log::info!(
        "{}x{} grid, {} frame period at {:?} per frame",
        config.grid_size,
        config.grid_size,
        config.period_frames,
        config.frame_interval
    );
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tick_steps_once_per_interval() {
        let mut app = App::new(SurfaceConfig::default());
        let start = app.next_frame_at;
        assert!(!app.tick(start - Duration::from_millis(1)));
        assert_eq!(app.animation.frame(), 0);
        assert!(app.tick(start));
        assert_eq!(app.animation.frame(), 1);
        assert!(!app.tick(start + Duration::from_millis(99)));
        assert!(app.tick(start + Duration::from_millis(100)));
        assert_eq!(app.animation.frame(), 2);
        assert_eq!(app.next_frame_at, start + Duration::from_millis(200));
    }

    #[test]
    fn stall_does_not_fast_forward() {
        let mut app = App::new(SurfaceConfig::default());
        let start = app.next_frame_at;
        let late = start + Duration::from_millis(2500);
        assert!(app.tick(late));
        assert_eq!(app.animation.frame(), 1);
        assert_eq!(app.next_frame_at, late + Duration::from_millis(100));
        assert!(!app.tick(late + Duration::from_millis(50)));
        assert_eq!(app.animation.frame(), 1);
    }

    #[test]
    fn driver_repeats_after_the_last_frame() {
        let mut app = App::new(SurfaceConfig::default());
        let start = app.next_frame_at;
        for k in 0..600u64 {
            assert!(app.tick(start + Duration::from_millis(100 * k)));
        }
        assert_eq!(app.animation.frame(), 0);
        app.tick(start + Duration::from_millis(100 * 600));
        assert_eq!(app.animation.frame(), 1);
    }
}
