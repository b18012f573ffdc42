//! Elevator state machine.
//!
//! Three states, each with its own transition function:
//!
//! ```text
//! idle ──(target != current)──▶ door_action ──(closed, travel needed)──▶ moving
//!   ▲                               │   ▲                                  │
//!   └──(open, at target: commit)────┘   └──────(arrived: snap y)───────────┘
//! ```
//!
//! Requests are accepted in `idle` and `door_action` only; a cabin in
//! motion always finishes its trip.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::model::elevator::{ElevatorState, ElevatorStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevatorConfig {
    /// Cabin travel speed, units per second
    pub travel_speed: f32,
    /// Door openness change per second
    pub door_speed: f32,
    /// Remaining distance below which the cabin snaps onto the floor
    pub arrival_epsilon: f32,
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        Self {
            travel_speed: 2.5,
            door_speed: 2.0,
            arrival_epsilon: 0.05,
        }
    }
}

/// Outcome of a single tick, for the frame loop to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElevatorTick {
    /// Floor committed this tick
    pub arrived: Option<usize>,
}

pub struct ElevatorMachine {
    pub config: ElevatorConfig,
    floor_heights: Vec<f32>,
    state: ElevatorState,
}

impl ElevatorMachine {
    /// Cabin parked with open doors at the ground floor.
    pub fn new(config: ElevatorConfig, floor_heights: Vec<f32>) -> Self {
        let ground = floor_heights.first().copied().unwrap_or(0.0);
        Self {
            config,
            floor_heights,
            state: ElevatorState::parked(0, ground),
        }
    }

    pub fn state(&self) -> &ElevatorState {
        &self.state
    }

    pub fn floor_heights(&self) -> &[f32] {
        &self.floor_heights
    }

    /// Rider flag is the one field the movement side writes
    pub fn set_player_inside(&mut self, inside: bool) {
        if inside != self.state.player_inside() {
            debug!(inside, "elevator rider changed");
        }
        self.state.set_player_inside(inside);
    }

    /// Request a trip. Returns whether the request was taken.
    pub fn call_floor(&mut self, floor: usize) -> bool {
        if floor >= self.floor_heights.len() {
            warn!(floor, floors = self.floor_heights.len(), "elevator call for unknown floor");
            return false;
        }
        match self.state.status() {
            ElevatorStatus::Idle | ElevatorStatus::DoorAction => {
                debug!(floor, from = self.state.current_floor(), "elevator call accepted");
                self.state.set_target_floor(floor);
                true
            }
            ElevatorStatus::Moving => {
                debug!(floor, "elevator call ignored while moving");
                false
            }
        }
    }

    pub fn tick(&mut self, dt: f32) -> ElevatorTick {
        let dt = dt.max(0.0);
        let before = self.state.status();
        let tick = match before {
            ElevatorStatus::Idle => self.tick_idle(dt),
            ElevatorStatus::DoorAction => self.tick_door_action(dt),
            ElevatorStatus::Moving => self.tick_moving(dt),
        };
        let after = self.state.status();
        if before != after {
            debug!(?before, ?after, y = self.state.y(), rider = self.state.player_inside(), "elevator transition");
        }
        tick
    }

    fn target_y(&self) -> f32 {
        self.floor_heights
            .get(self.state.target_floor())
            .copied()
            .unwrap_or(self.state.y())
    }

    fn open_doors(&mut self, dt: f32) {
        let o = self.state.door_openness();
        self.state.set_door_openness((o + self.config.door_speed * dt).min(1.0));
    }

    fn close_doors(&mut self, dt: f32) {
        let o = self.state.door_openness();
        self.state.set_door_openness((o - self.config.door_speed * dt).max(0.0));
    }

    fn tick_idle(&mut self, dt: f32) -> ElevatorTick {
        if self.state.target_floor() != self.state.current_floor() {
            self.state.set_status(ElevatorStatus::DoorAction);
        } else if self.state.door_openness() < 1.0 {
            self.open_doors(dt);
        }
        ElevatorTick::default()
    }

    fn tick_door_action(&mut self, dt: f32) -> ElevatorTick {
        let needs_travel = self.state.y() != self.target_y();
        if needs_travel {
            if self.state.door_openness() > 0.0 {
                self.close_doors(dt);
            } else {
                self.state.set_status(ElevatorStatus::Moving);
            }
            return ElevatorTick::default();
        }

        if self.state.door_openness() < 1.0 {
            self.open_doors(dt);
            return ElevatorTick::default();
        }

        self.state.commit_floor();
        self.state.set_status(ElevatorStatus::Idle);
        let floor = self.state.current_floor();
        info!(floor, rider = self.state.player_inside(), "elevator arrived");
        ElevatorTick { arrived: Some(floor) }
    }

    fn tick_moving(&mut self, dt: f32) -> ElevatorTick {
        let target = self.target_y();
        let diff = target - self.state.y();
        if diff.abs() < self.config.arrival_epsilon {
            self.state.set_y(target);
            self.state.set_status(ElevatorStatus::DoorAction);
        } else {
            // Capped at the remaining distance so the cabin cannot oscillate around the floor
            let step = (self.config.travel_speed * dt).min(diff.abs());
            self.state.set_y(self.state.y() + diff.signum() * step);
            trace!(y = self.state.y(), target, "cabin moving");
        }
        ElevatorTick::default()
    }
}
