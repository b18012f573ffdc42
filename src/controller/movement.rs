//! Player movement: velocity integration, axis-separated collision and
//! vertical support resolution.
//!
//! `MovementIntegrator::tick` is pure. It takes the previous player
//! state plus read-only views of the layout and the elevator and returns
//! the next state; the frame loop decides what to do with it.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::controller::input::MovementKeys;
use crate::model::elevator::{ElevatorState, ElevatorStatus};
use crate::model::layout::HallLayout;
use crate::model::PlayerState;

/// Vertical gap below which the eye snaps onto its target height
const HEIGHT_SNAP: f32 = 1.0e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Exponential velocity decay rate, per second
    pub damping: f32,
    /// Terminal walking speed, units per second
    pub walk_speed: f32,
    pub run_multiplier: f32,
    pub eye_height: f32,
    /// Fraction of the remaining height gap closed each frame
    pub height_blend: f32,
    /// Longest step the integrator will take, in seconds
    pub max_delta: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            damping: 10.0,
            walk_speed: 10.0,
            run_multiplier: 1.75,
            eye_height: 1.7,
            height_blend: 0.15,
            max_delta: 0.1,
        }
    }
}

/// Result of one movement tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStep {
    pub player: PlayerState,
    /// Player stands inside the cabin footprint
    pub player_inside: bool,
    /// Floor index used for boundaries and obstacles this tick
    pub level: usize,
}

pub struct MovementIntegrator {
    pub config: MovementConfig,
}

impl MovementIntegrator {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Steady-state speed for the held keys
    pub fn terminal_speed(&self, keys: MovementKeys) -> f32 {
        if !keys.any_direction() {
            return 0.0;
        }
        let run = if keys.run { self.config.run_multiplier } else { 1.0 };
        self.config.walk_speed * run
    }

    /// Unit planar direction requested by the keys, or zero
    pub fn wish_direction(&self, player: &PlayerState, keys: MovementKeys) -> Vec3 {
        let (forward, strafe) = keys.axes();
        (player.forward_flat() * forward + player.right_flat() * strafe).normalize_or_zero()
    }

    /// Floor whose boundary and obstacles apply at the player's current spot
    pub fn current_level(&self, player: &PlayerState, layout: &HallLayout, elevator: &ElevatorState) -> usize {
        let p = player.position;
        if layout.in_cabin(p.x, p.z) {
            layout.nearest_floor(elevator.y())
        } else {
            layout.support_floor(p.x, p.z, player.feet_y())
        }
    }

    pub fn tick(
        &self,
        player: &PlayerState,
        keys: MovementKeys,
        dt: f32,
        layout: &HallLayout,
        elevator: &ElevatorState,
    ) -> MovementStep {
        let dt = dt.clamp(0.0, self.config.max_delta);
        let mut next = *player;
        let start = player.position;

        // Riding: pinned to the cabin, no horizontal motion until it stops
        if layout.in_cabin(start.x, start.z) && elevator.status() == ElevatorStatus::Moving {
            next.velocity = Vec3::ZERO;
            next.position.y = elevator.y() + next.eye_height;
            return MovementStep {
                player: next,
                player_inside: true,
                level: layout.nearest_floor(elevator.y()),
            };
        }

        // Exact solution of dv/dt = k * (speed * wish - v) over dt; the new
        // velocity is a blend of the old one and the terminal one, so it never
        // exceeds terminal speed when starting below it.
        let decay = (-self.config.damping * dt).exp();
        let wish = self.wish_direction(player, keys);
        let planar = Vec3::new(player.velocity.x, 0.0, player.velocity.z);
        next.velocity = planar * decay + wish * self.terminal_speed(keys) * (1.0 - decay);

        let level = self.current_level(player, layout, elevator);
        let feet = player.feet_y();

        // X first against the current Z, then Z against the updated X
        let cand_x = start.x + next.velocity.x * dt;
        if self.can_step(layout, elevator, level, feet, (start.x, start.z), (cand_x, start.z)) {
            next.position.x = cand_x;
        } else {
            trace!(cand_x, level, "x step rejected");
            next.velocity.x = 0.0;
        }

        let x = next.position.x;
        let cand_z = start.z + next.velocity.z * dt;
        if self.can_step(layout, elevator, level, feet, (x, start.z), (x, cand_z)) {
            next.position.z = cand_z;
        } else {
            trace!(cand_z, level, "z step rejected");
            next.velocity.z = 0.0;
        }

        let inside = layout.in_cabin(next.position.x, next.position.z);
        let support = if inside {
            elevator.y()
        } else {
            let floor = layout.support_floor(next.position.x, next.position.z, feet);
            layout.floor_height(floor).unwrap_or(0.0)
        };
        next.position.y = self.settle_height(next.position.y, support + next.eye_height);

        MovementStep { player: next, player_inside: inside, level }
    }

    /// Fixed-fraction approach to the target eye height; never overshoots.
    fn settle_height(&self, y: f32, target: f32) -> f32 {
        let gap = target - y;
        if gap.abs() < HEIGHT_SNAP {
            target
        } else {
            y + gap * self.config.height_blend.clamp(0.0, 1.0)
        }
    }

    fn can_step(
        &self,
        layout: &HallLayout,
        elevator: &ElevatorState,
        level: usize,
        feet: f32,
        from: (f32, f32),
        to: (f32, f32),
    ) -> bool {
        if !layout.is_walkable(level, to.0, to.1) {
            return false;
        }
        let crossing = layout.in_cabin(from.0, from.1) != layout.in_cabin(to.0, to.1);
        if crossing {
            let e = &layout.elevator;
            let doors_open = elevator.door_openness() >= e.door_clearance;
            let level_with_floor = (elevator.y() - feet).abs() <= e.level_tolerance;
            return doors_open && level_with_floor && elevator.status() != ElevatorStatus::Moving;
        }
        true
    }
}

impl Default for MovementIntegrator {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}
