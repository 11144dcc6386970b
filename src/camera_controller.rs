use crate::camera::OrbitCamera;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Interactive rotation and zoom of the plot, applied once per redraw.
#[derive(Default)]
pub struct CameraController {
    is_left_pressed: bool,
    is_right_pressed: bool,
    is_up_pressed: bool,
    is_down_pressed: bool,
    is_middle_mouse_pressed: bool,

    rotation_speed: f32,
    mouse_sensitivity: f32,

    mouse_delta_x: f32,
    mouse_delta_y: f32,
    zoom_delta: f32,
}

impl CameraController {
    pub fn new(rotation_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            rotation_speed,
            mouse_sensitivity,
            ..Default::default()
        }
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let pressed = key_event.state == ElementState::Pressed;
                match &key_event.logical_key {
                    Key::Named(NamedKey::ArrowLeft) => self.is_left_pressed = pressed,
                    Key::Named(NamedKey::ArrowRight) => self.is_right_pressed = pressed,
                    Key::Named(NamedKey::ArrowUp) => self.is_up_pressed = pressed,
                    Key::Named(NamedKey::ArrowDown) => self.is_down_pressed = pressed,
                    _ => return false,
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * -1.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * -0.1,
                };
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Middle {
                    self.is_middle_mouse_pressed = *state == ElementState::Pressed;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.is_middle_mouse_pressed {
            self.mouse_delta_x += delta_x as f32;
            self.mouse_delta_y += delta_y as f32;
        }
    }

    /// True while a held key or drag keeps the view moving.
    pub fn is_active(&self) -> bool {
        self.is_left_pressed
            || self.is_right_pressed
            || self.is_up_pressed
            || self.is_down_pressed
            || self.mouse_delta_x != 0.0
            || self.mouse_delta_y != 0.0
            || self.zoom_delta != 0.0
    }

    pub fn update_camera(&mut self, camera: &mut OrbitCamera) {
        let zoom_sensitivity = 0.25;

        if self.is_left_pressed {
            camera.azimuth -= self.rotation_speed;
        }
        if self.is_right_pressed {
            camera.azimuth += self.rotation_speed;
        }
        if self.is_up_pressed {
            camera.elevation += self.rotation_speed;
        }
        if self.is_down_pressed {
            camera.elevation -= self.rotation_speed;
        }

        camera.azimuth -= self.mouse_delta_x * self.mouse_sensitivity;
        camera.elevation += self.mouse_delta_y * self.mouse_sensitivity;
        camera.elevation = camera.elevation.clamp(-89.0, 89.0);
        camera.azimuth = camera.azimuth.rem_euclid(360.0);

        camera.distance += self.zoom_delta * zoom_sensitivity;
        camera.distance = camera.distance.clamp(1.5, 20.0);

        self.zoom_delta = 0.0;
        self.mouse_delta_x = 0.0;
        self.mouse_delta_y = 0.0;
    }
}
