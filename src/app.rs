//! Window shell and input handling.
//!
//! The loop order per iteration is: winit drains pending events (input),
//! then `RedrawRequested` updates the simulation and draws, then the
//! frame limiter paces to ~60 Hz before the next redraw is requested.

use crate::renderer::Renderer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Degrees of angular drift added per ArrowUp/ArrowDown press.
const VELOCITY_STEP: f64 = 1.0;
/// Years added to every period per Digit1/Digit2 press.
const PERIOD_STEP: f64 = 0.1;

const TARGET_FPS: u32 = 60;

/// Single frame-rate limiter: sleeps away the remainder of each frame's
/// budget after present.
struct FrameLimiter {
    budget: Duration,
    last: Instant,
}

impl FrameLimiter {
    fn new(target_fps: u32) -> Self {
        Self {
            budget: Duration::from_secs(1) / target_fps,
            last: Instant::now(),
        }
    }

    /// Time left in the current frame's budget at `now`.
    fn remaining(&self, now: Instant) -> Duration {
        (self.last + self.budget).saturating_duration_since(now)
    }

    fn pace(&mut self) {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
        self.last = Instant::now();
    }
}

pub struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,

    // Input state
    mouse_pressed: bool,

    limiter: FrameLimiter,
}

impl App {
    pub fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            mouse_pressed: false,
            limiter: FrameLimiter::new(TARGET_FPS),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attrs = Window::default_attributes()
            .with_title("Solar System")
            .with_inner_size(PhysicalSize::new(800, 600));

        // Window or GPU acquisition failure is fatal before the loop runs.
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );
        let renderer = pollster::block_on(Renderer::new(Arc::clone(&window)))
            .expect("Failed to create renderer");

        self.window = Some(window);
        self.renderer = Some(renderer);

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };

                if key == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }

                if let Some(renderer) = &mut self.renderer {
                    match key {
                        KeyCode::ArrowUp => renderer.sim.nudge_velocity(VELOCITY_STEP),
                        KeyCode::ArrowDown => renderer.sim.nudge_velocity(-VELOCITY_STEP),
                        KeyCode::Digit1 => renderer.sim.nudge_period(PERIOD_STEP),
                        KeyCode::Digit2 => renderer.sim.nudge_period(-PERIOD_STEP),
                        _ => {}
                    }
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.mouse_pressed = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                // One discrete ±1 zoom step per scroll event, regardless of
                // the delta's magnitude. Scroll up zooms in.
                let step = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };

                if let Some(renderer) = &mut self.renderer {
                    if step > 0.0 {
                        renderer.camera.zoom(1.0);
                    } else if step < 0.0 {
                        renderer.camera.zoom(-1.0);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                // A quit delivered earlier in this batch wins: no further
                // frame is drawn or presented.
                if event_loop.exiting() {
                    return;
                }

                if let Some(renderer) = &mut self.renderer {
                    renderer.update();
                    if let Err(e) = renderer.render() {
                        tracing::error!("Render failed: {e:#}");
                        event_loop.exit();
                        return;
                    }

                    if let Some(window) = &self.window {
                        window.set_title(&format!("Solar System | {}", renderer.info()));
                    }
                }

                self.limiter.pace();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        // Pointer displacement only rotates while the primary button is
        // held; nothing accumulates while it is up.
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.mouse_pressed {
                if let Some(renderer) = &mut self.renderer {
                    renderer.camera.rotate(dx as f32, dy as f32);
                }
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_budget() {
        let limiter = FrameLimiter::new(60);
        let budget_ms = limiter.budget.as_secs_f64() * 1000.0;
        assert!((budget_ms - 1000.0 / 60.0).abs() < 0.1);
    }

    #[test]
    fn test_limiter_remaining_counts_down() {
        let limiter = FrameLimiter::new(60);

        let immediately = limiter.remaining(limiter.last);
        assert_eq!(immediately, limiter.budget);

        // Past the budget nothing remains (saturates, never panics).
        let late = limiter.remaining(limiter.last + limiter.budget * 2);
        assert_eq!(late, Duration::ZERO);
    }
}
