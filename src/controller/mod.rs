// CONTROLLER: Input, simulation and frame loop
pub mod input;
pub mod camera_controller;
pub mod movement;
pub mod elevator;
pub mod interaction;
pub mod frame_loop;

pub use input::{InputEvent, InputPort, InputSnapshot, InputState, ScriptedInput};
pub use camera_controller::CameraController;
pub use movement::MovementIntegrator;
pub use elevator::ElevatorMachine;
pub use interaction::InteractionResolver;
pub use frame_loop::{FrameEvent, FrameLoopContext};
