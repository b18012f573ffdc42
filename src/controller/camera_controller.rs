use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::model::{Camera, PlayerState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians of rotation per pixel of pointer motion
    pub look_sensitivity: f32,
    pub fov_deg: f32,
    pub min_fov_deg: f32,
    pub max_fov_deg: f32,
    /// Degrees of FOV per wheel delta unit
    pub zoom_per_unit: f32,
    pub pitch_limit_deg: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_sensitivity: 0.002,
            fov_deg: 60.0,
            min_fov_deg: 30.0,
            max_fov_deg: 90.0,
            zoom_per_unit: 0.05,
            pitch_limit_deg: 89.0,
        }
    }
}

/// Handles camera orientation and zoom
pub struct CameraController {
    pub config: CameraConfig,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Apply pointer look delta to the player's orientation
    pub fn apply_look(&self, player: &mut PlayerState, delta: Vec2) {
        let sens = self.config.look_sensitivity;
        let limit = self.config.pitch_limit_deg.to_radians();
        player.yaw += delta.x * sens;
        player.pitch = (player.pitch - delta.y * sens).clamp(-limit, limit);
    }

    /// Wheel adjusts field of view only; the simulation never sees it.
    pub fn apply_zoom(&self, camera: &mut Camera, scroll_delta: f32) {
        if scroll_delta == 0.0 {
            return;
        }
        let c = &self.config;
        let fov = camera.fov_y.to_degrees() + scroll_delta * c.zoom_per_unit;
        camera.fov_y = fov.clamp(c.min_fov_deg, c.max_fov_deg).to_radians();
    }

    /// Copy the player's eye and orientation onto the camera
    pub fn sync_camera_from_player(&self, camera: &mut Camera, player: &PlayerState) {
        camera.eye = player.position;
        camera.yaw = player.yaw;
        camera.pitch = player.pitch;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_pitch_is_clamped_below_vertical() {
        let ctl = CameraController::default();
        let mut p = PlayerState::new(Vec3::ZERO, 0.0, 1.7);
        ctl.apply_look(&mut p, Vec2::new(0.0, -1.0e6));
        assert!(p.pitch < std::f32::consts::FRAC_PI_2);
        assert!((p.pitch - 89f32.to_radians()).abs() < 1e-5);
        ctl.apply_look(&mut p, Vec2::new(0.0, 1.0e6));
        assert!((p.pitch + 89f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_follows_horizontal_motion() {
        let ctl = CameraController::default();
        let mut p = PlayerState::new(Vec3::ZERO, 1.0, 1.7);
        ctl.apply_look(&mut p, Vec2::new(100.0, 0.0));
        assert!((p.yaw - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_stays_in_bounds() {
        let ctl = CameraController::default();
        let mut cam = Camera::new(800, 600);
        ctl.apply_zoom(&mut cam, 1.0e5);
        assert!((cam.fov_y.to_degrees() - 90.0).abs() < 1e-3);
        ctl.apply_zoom(&mut cam, -1.0e5);
        assert!((cam.fov_y.to_degrees() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_sync_copies_pose() {
        let ctl = CameraController::default();
        let mut cam = Camera::new(800, 600);
        let mut p = PlayerState::new(Vec3::new(1.0, 2.0, 3.0), 0.5, 1.7);
        p.pitch = 0.25;
        ctl.sync_camera_from_player(&mut cam, &p);
        assert_eq!(cam.eye, p.position);
        assert_eq!((cam.yaw, cam.pitch), (0.5, 0.25));
    }
}
