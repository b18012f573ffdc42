use glam::{Mat4, Vec2, Vec3};

use crate::model::scene::Ray;

/// Slightly less than π/2 to avoid gimbal lock
pub const PITCH_LIMIT: f32 = 1.5533;

pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 1.7, 5.0),
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: width.max(1) as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    /// World-space ray through a point in normalized device coordinates
    /// ((0, 0) is screen center, y up).
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let forward = self.forward();
        let right = self.right();
        let up = right.cross(forward);
        let half_h = (self.fov_y * 0.5).tan();
        let half_w = half_h * self.aspect;

        let dir = (forward + right * ndc.x * half_w + up * ndc.y * half_h).normalize();
        Ray::new(self.eye, dir)
    }
}
