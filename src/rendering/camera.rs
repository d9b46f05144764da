//! Orbit camera with view presets and the camera uniform shared by all
//! render pipelines.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Camera uniform (must match the Camera struct in the WGSL shaders).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _padding: f32,
}

/// Canned viewpoints, Z-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    /// Three-quarter isometric-style view.
    Iso,
    Front,
    Top,
}

/// Orbit camera controller: yaw/pitch around a center point, Z-up.
pub struct CameraController {
    pub center: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,

    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,

    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,

    is_dragging: bool,
    last_mouse_pos: Option<PhysicalPosition<f64>>,
}

impl CameraController {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            center: Vec3::ZERO,
            distance: 40.0,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect,
            mouse_sensitivity: 0.005,
            zoom_speed: 0.1,
            is_dragging: false,
            last_mouse_pos: None,
        };
        camera.set_view(ViewPreset::Iso, 40.0);
        camera
    }

    /// Jump to a canned viewpoint at the given distance from the center.
    pub fn set_view(&mut self, preset: ViewPreset, distance: f32) {
        self.distance = distance.max(self.near * 2.0);
        match preset {
            ViewPreset::Iso => {
                self.yaw = -std::f32::consts::FRAC_PI_4;
                self.pitch = 30f32.to_radians();
            }
            ViewPreset::Front => {
                self.yaw = -std::f32::consts::FRAC_PI_2;
                self.pitch = 0.0;
            }
            ViewPreset::Top => {
                self.yaw = 0.0;
                self.pitch = std::f32::consts::FRAC_PI_2 * 0.99;
            }
        }
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.center
            + Vec3::new(
                cos_yaw * cos_pitch * self.distance,
                sin_yaw * cos_pitch * self.distance,
                sin_pitch * self.distance,
            )
    }

    /// Move the eye to `eye`, keeping the current orbit center. Used by the
    /// inspector's camera panel.
    pub fn set_position(&mut self, eye: Vec3) {
        let offset = eye - self.center;
        let distance = offset.length();
        if distance < 1e-4 {
            return;
        }
        self.distance = distance;
        self.pitch = (offset.z / distance).clamp(-1.0, 1.0).asin();
        self.yaw = offset.y.atan2(offset.x);
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_dragging = state == ElementState::Pressed;
            if !self.is_dragging {
                self.last_mouse_pos = None;
            }
        }
    }

    pub fn handle_mouse_move(&mut self, position: PhysicalPosition<f64>) {
        if self.is_dragging {
            if let Some(last) = self.last_mouse_pos {
                let dx = (position.x - last.x) as f32;
                let dy = (position.y - last.y) as f32;
                self.yaw -= dx * self.mouse_sensitivity;
                self.pitch = (self.pitch + dy * self.mouse_sensitivity).clamp(
                    -std::f32::consts::FRAC_PI_2 * 0.99,
                    std::f32::consts::FRAC_PI_2 * 0.99,
                );
            }
        }
        self.last_mouse_pos = Some(position);
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
        };
        self.distance = (self.distance * (1.0 - amount * self.zoom_speed)).clamp(1.0, 500.0);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn uniform(&self) -> CameraUniform {
        let eye = self.position();
        let view = Mat4::look_at_rh(eye, self.center, Vec3::Z);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        CameraUniform {
            view_proj: (proj * view).to_cols_array_2d(),
            position: eye.to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_position_roundtrip() {
        let mut camera = CameraController::new(16.0 / 9.0);
        let target = Vec3::new(0.7, -35.0, 7.4);
        camera.set_position(target);
        assert!((camera.position() - target).length() < 1e-3);
    }

    #[test]
    fn test_presets_keep_distance() {
        let mut camera = CameraController::new(1.0);
        camera.set_view(ViewPreset::Top, 30.0);
        assert!((camera.distance - 30.0).abs() < 1e-6);
        assert!((camera.position() - camera.center).length() - 30.0 < 1e-3);
    }
}
