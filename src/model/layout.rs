//! Static hall configuration: floors, walkable bounds, obstacles, the
//! elevator shaft and booth placement.
//!
//! Everything here is supplied once at startup and never mutated by the
//! simulation. Padding around booths and walls lives in the data, so the
//! movement code has no hidden constants.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Axis-aligned rectangle on the XZ plane. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl Rect {
    pub const fn new(x_min: f32, x_max: f32, z_min: f32, z_max: f32) -> Self {
        Self { x_min, x_max, z_min, z_max }
    }

    /// Rectangle of the given half extents around a center point.
    pub fn around(cx: f32, cz: f32, half_x: f32, half_z: f32) -> Self {
        Self::new(cx - half_x, cx + half_x, cz - half_z, cz + half_z)
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.x_min && x <= self.x_max && z >= self.z_min && z <= self.z_max
    }

    fn is_well_formed(&self) -> bool {
        self.x_min.is_finite()
            && self.x_max.is_finite()
            && self.z_min.is_finite()
            && self.z_max.is_finite()
            && self.x_min <= self.x_max
            && self.z_min <= self.z_max
    }
}

/// Static box the player cannot stand inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(flatten)]
    pub bounds: Rect,
    /// Floor index this obstacle blocks; `None` blocks every floor.
    #[serde(default)]
    pub level: Option<usize>,
}

impl Obstacle {
    pub fn everywhere(bounds: Rect) -> Self {
        Self { bounds, level: None }
    }

    pub fn on_level(bounds: Rect, level: usize) -> Self {
        Self { bounds, level: Some(level) }
    }

    pub fn applies_to(&self, level: usize) -> bool {
        self.level.map_or(true, |l| l == level)
    }
}

/// Raised walkable area (balcony/mezzanine).
///
/// The player is supported by it only while inside the footprint and with
/// feet above `threshold`. Walking underneath keeps ground support, which
/// stops the support height from flickering at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mezzanine {
    pub footprint: Rect,
    pub floor: usize,
    pub threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevatorLayout {
    /// Cabin floor area; inside it the cabin is the support.
    pub footprint: Rect,
    /// Cabin center on the XZ plane, used to place the cabin in the scene.
    pub center: Vec3,
    /// Minimum door openness required to step across the cabin threshold.
    pub door_clearance: f32,
    /// Max distance between cabin floor and feet for the threshold to be crossable.
    pub level_tolerance: f32,
}

/// Booth placement. Content only: used to build the default scene and
/// its obstacles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoothSpec {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub position: Vec3,
    /// Rotation about Y in radians.
    #[serde(default)]
    pub facing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallLayout {
    /// Floor Y coordinates, ground first, strictly increasing.
    pub floor_heights: Vec<f32>,
    /// Walkable rectangle for each floor index.
    pub boundaries: Vec<Rect>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub mezzanines: Vec<Mezzanine>,
    pub elevator: ElevatorLayout,
    #[serde(default)]
    pub booths: Vec<BoothSpec>,
    /// Initial eye position.
    pub spawn: Vec3,
    #[serde(default)]
    pub spawn_yaw: f32,
}

pub const BOOTH_HALF_WIDTH: f32 = 2.0;
pub const BOOTH_HALF_DEPTH: f32 = 3.0;

impl HallLayout {
    /// The two-level expo hall: six booths along the side aisles, a rear
    /// mezzanine at 7.5 and an elevator against the back wall.
    pub fn expo_default() -> Self {
        let booth = |id, name: &str, x: f32, z: f32, facing: f32| BoothSpec {
            id,
            name: name.to_string(),
            color: "#00ffff".to_string(),
            position: Vec3::new(x, 0.0, z),
            facing,
        };
        let half_pi = std::f32::consts::FRAC_PI_2;
        let booths = vec![
            booth(1, "TechCorp", -12.0, -5.0, half_pi),
            booth(2, "InnovateX", -12.0, -25.0, half_pi),
            booth(3, "AlphaSystems", -12.0, -45.0, half_pi),
            booth(4, "FutureVis", 12.0, -5.0, -half_pi),
            booth(5, "GreenEnergy", 12.0, -25.0, -half_pi),
            booth(6, "BlueSky", 12.0, -45.0, -half_pi),
        ];

        let mut obstacles: Vec<Obstacle> = booths
            .iter()
            .map(|b| {
                Obstacle::on_level(
                    Rect::around(b.position.x, b.position.z, BOOTH_HALF_WIDTH, BOOTH_HALF_DEPTH),
                    0,
                )
            })
            .collect();

        // Shaft walls on three sides; the door faces +Z.
        obstacles.push(Obstacle::everywhere(Rect::new(-1.6, -1.35, -54.6, -51.75)));
        obstacles.push(Obstacle::everywhere(Rect::new(1.35, 1.6, -54.6, -51.75)));
        obstacles.push(Obstacle::everywhere(Rect::new(-1.6, 1.6, -54.6, -54.35)));

        Self {
            floor_heights: vec![0.0, 7.5],
            boundaries: vec![
                Rect::new(-19.0, 19.0, -56.0, 9.0),
                Rect::new(-19.0, 19.0, -56.0, -47.0),
            ],
            obstacles,
            mezzanines: vec![Mezzanine {
                footprint: Rect::new(-19.0, 19.0, -56.0, -47.0),
                floor: 1,
                threshold: 3.0,
            }],
            elevator: ElevatorLayout {
                footprint: Rect::new(-1.25, 1.25, -54.25, -51.75),
                center: Vec3::new(0.0, 0.0, -53.0),
                door_clearance: 0.8,
                level_tolerance: 0.3,
            },
            booths,
            spawn: Vec3::new(0.0, 1.7, 5.0),
            spawn_yaw: -half_pi,
        }
    }

    pub fn floor_height(&self, floor: usize) -> Option<f32> {
        self.floor_heights.get(floor).copied()
    }

    /// Index of the floor whose height is closest to `y`.
    pub fn nearest_floor(&self, y: f32) -> usize {
        self.floor_heights
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - y).abs().total_cmp(&(*b - y).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Floor supporting a player outside the cabin, given feet height.
    pub fn support_floor(&self, x: f32, z: f32, feet_y: f32) -> usize {
        self.mezzanines
            .iter()
            .find(|m| m.footprint.contains(x, z) && feet_y > m.threshold)
            .map(|m| m.floor)
            .unwrap_or(0)
    }

    pub fn in_cabin(&self, x: f32, z: f32) -> bool {
        self.elevator.footprint.contains(x, z)
    }

    /// Whether a point on `level` is inside the hall and clear of obstacles.
    /// The cabin footprint counts as walkable on every level.
    pub fn is_walkable(&self, level: usize, x: f32, z: f32) -> bool {
        let inside_hall = self
            .boundaries
            .get(level)
            .map_or(false, |b| b.contains(x, z))
            || self.in_cabin(x, z);
        inside_hall && !self.is_blocked(level, x, z)
    }

    pub fn is_blocked(&self, level: usize, x: f32, z: f32) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.applies_to(level) && o.bounds.contains(x, z))
    }

    pub fn validate(&self) -> Result<()> {
        if self.floor_heights.is_empty() {
            return Err(ConfigError::InvalidLayout("no floors defined".into()));
        }
        if self.floor_heights.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidLayout(
                "floor heights must be strictly increasing".into(),
            ));
        }
        if self.boundaries.len() != self.floor_heights.len() {
            return Err(ConfigError::InvalidLayout(format!(
                "{} boundaries for {} floors",
                self.boundaries.len(),
                self.floor_heights.len()
            )));
        }
        if let Some(r) = self.boundaries.iter().find(|r| !r.is_well_formed()) {
            return Err(ConfigError::InvalidLayout(format!("malformed boundary {r:?}")));
        }
        for o in &self.obstacles {
            if !o.bounds.is_well_formed() {
                return Err(ConfigError::InvalidLayout(format!("malformed obstacle {o:?}")));
            }
            if o.level.is_some_and(|l| l >= self.floor_heights.len()) {
                return Err(ConfigError::InvalidLayout(format!(
                    "obstacle on missing floor {o:?}"
                )));
            }
        }
        for m in &self.mezzanines {
            if m.floor >= self.floor_heights.len() || !m.footprint.is_well_formed() {
                return Err(ConfigError::InvalidLayout(format!("bad mezzanine {m:?}")));
            }
        }
        let e = &self.elevator;
        if !e.footprint.is_well_formed() || !(0.0..=1.0).contains(&e.door_clearance) {
            return Err(ConfigError::InvalidLayout("bad elevator layout".into()));
        }
        Ok(())
    }
}

impl Default for HallLayout {
    fn default() -> Self {
        Self::expo_default()
    }
}
