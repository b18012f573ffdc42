// MODEL: Hall data and simulation state
pub mod layout;
pub mod camera;
pub mod player;
pub mod elevator;
pub mod scene;

pub use layout::{HallLayout, Obstacle, Rect};
pub use camera::Camera;
pub use player::PlayerState;
pub use elevator::{ElevatorState, ElevatorStatus};
pub use scene::{Descriptor, SceneGraph};
