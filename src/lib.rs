// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;

// MVC Architecture
pub mod model;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::ExpoConfig;
pub use controller::{FrameEvent, FrameLoopContext, InputPort, InputSnapshot, InputState, ScriptedInput};
pub use error::ConfigError;
pub use model::HallLayout;
