//! Shared elevator state.
//!
//! Ownership of the fields is split between two writers:
//!
//! | field                                   | writer                   | readers            |
//! |-----------------------------------------|--------------------------|--------------------|
//! | `y`, `status`, `door_openness`, floors  | `ElevatorMachine`        | integrator, scene  |
//! | `player_inside`                         | frame loop (integrator)  | `ElevatorMachine`  |
//!
//! Fields are private; state-machine writes go through `pub(crate)`
//! setters that only `controller::elevator` calls, and the rider flag is
//! the one public mutator.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevatorStatus {
    Idle,
    DoorAction,
    Moving,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevatorState {
    y: f32,
    status: ElevatorStatus,
    door_openness: f32,
    current_floor: usize,
    target_floor: usize,
    player_inside: bool,
}

impl ElevatorState {
    /// Cabin parked at `floor` with its doors open.
    pub fn parked(floor: usize, y: f32) -> Self {
        Self {
            y,
            status: ElevatorStatus::Idle,
            door_openness: 1.0,
            current_floor: floor,
            target_floor: floor,
            player_inside: false,
        }
    }

    pub fn y(&self) -> f32 { self.y }
    pub fn status(&self) -> ElevatorStatus { self.status }
    pub fn door_openness(&self) -> f32 { self.door_openness }
    pub fn current_floor(&self) -> usize { self.current_floor }
    pub fn target_floor(&self) -> usize { self.target_floor }
    pub fn player_inside(&self) -> bool { self.player_inside }

    pub fn is_busy(&self) -> bool {
        self.status != ElevatorStatus::Idle || self.target_floor != self.current_floor
    }

    /// Requested floor awaiting arrival (the lit call button).
    pub fn pending_floor(&self) -> Option<usize> {
        (self.target_floor != self.current_floor).then_some(self.target_floor)
    }

    /// Floor indicator text: "G" for the ground floor, else the floor number.
    pub fn display_label(&self, floor_heights: &[f32]) -> String {
        let nearest = floor_heights
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - self.y).abs().total_cmp(&(*b - self.y).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0);
        if nearest == 0 { "G".to_string() } else { nearest.to_string() }
    }

    /// Written by the movement side only.
    pub fn set_player_inside(&mut self, inside: bool) {
        self.player_inside = inside;
    }

    pub(crate) fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub(crate) fn set_status(&mut self, status: ElevatorStatus) {
        self.status = status;
    }

    pub(crate) fn set_door_openness(&mut self, openness: f32) {
        self.door_openness = openness.clamp(0.0, 1.0);
    }

    pub(crate) fn set_target_floor(&mut self, floor: usize) {
        self.target_floor = floor;
    }

    pub(crate) fn commit_floor(&mut self) {
        self.current_floor = self.target_floor;
    }
}

/// Max sliding distance of each door panel
pub const DOOR_TRAVEL: f32 = 0.9;

/// Cabin-local x offsets of the two sliding door panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoorPanels {
    pub left_x: f32,
    pub right_x: f32,
}

impl DoorPanels {
    pub fn from_openness(openness: f32) -> Self {
        let offset = openness.clamp(0.0, 1.0) * DOOR_TRAVEL;
        Self {
            left_x: -0.5 - offset,
            right_x: 0.5 + offset,
        }
    }
}
