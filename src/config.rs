//! Startup configuration: hall layout plus tuning for every subsystem.
//!
//! All sections are optional in JSON; missing ones fall back to the
//! default expo hall and its tuning.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::controller::camera_controller::CameraConfig;
use crate::controller::elevator::ElevatorConfig;
use crate::controller::input::KeyBindings;
use crate::controller::interaction::InteractionConfig;
use crate::controller::movement::MovementConfig;
use crate::error::{ConfigError, Result};
use crate::model::layout::HallLayout;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpoConfig {
    pub layout: HallLayout,
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub elevator: ElevatorConfig,
    pub interaction: InteractionConfig,
    pub bindings: KeyBindings,
}

impl ExpoConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        debug!(
            floors = config.layout.floor_heights.len(),
            obstacles = config.layout.obstacles.len(),
            booths = config.layout.booths.len(),
            "config parsed"
        );
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;

        let m = &self.movement;
        positive("movement.damping", m.damping)?;
        positive("movement.walk_speed", m.walk_speed)?;
        positive("movement.run_multiplier", m.run_multiplier)?;
        positive("movement.max_delta", m.max_delta)?;
        if !(m.height_blend > 0.0 && m.height_blend <= 1.0) {
            return Err(invalid("movement.height_blend", "must be in (0, 1]"));
        }

        let c = &self.camera;
        if !(c.min_fov_deg > 0.0 && c.min_fov_deg <= c.max_fov_deg && c.max_fov_deg < 180.0) {
            return Err(invalid("camera.min_fov_deg", "need 0 < min <= max < 180"));
        }
        if !(c.pitch_limit_deg > 0.0 && c.pitch_limit_deg < 90.0) {
            return Err(invalid("camera.pitch_limit_deg", "must be in (0, 90)"));
        }

        let e = &self.elevator;
        positive("elevator.travel_speed", e.travel_speed)?;
        positive("elevator.door_speed", e.door_speed)?;
        positive("elevator.arrival_epsilon", e.arrival_epsilon)?;

        positive("interaction.max_distance", self.interaction.max_distance)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSetting { field, reason: reason.into() }
}
