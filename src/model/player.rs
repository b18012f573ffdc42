use glam::Vec3;

/// Player position, velocity and orientation - position is the eye, not the feet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub eye_height: f32,
}

impl PlayerState {
    pub fn new(position: Vec3, yaw: f32, eye_height: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw,
            pitch: 0.0,
            eye_height,
        }
    }

    pub fn feet_y(&self) -> f32 {
        self.position.y - self.eye_height
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }

    /// Planar forward from yaw only; pitch never tilts movement.
    pub fn forward_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn right_flat(&self) -> Vec3 {
        self.forward_flat().cross(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_basis_ignores_pitch() {
        let mut p = PlayerState::new(Vec3::ZERO, 0.0, 1.7);
        p.pitch = 1.2;
        assert_eq!(p.forward_flat().y, 0.0);
        assert!((p.forward_flat() - Vec3::X).length() < 1e-6);
        assert!((p.right_flat() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_feet_height() {
        let p = PlayerState::new(Vec3::new(0.0, 9.2, 0.0), 0.0, 1.7);
        assert!((p.feet_y() - 7.5).abs() < 1e-5);
    }
}
