use glam::Vec3;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::ExpoConfig;
use crate::controller::camera_controller::CameraController;
use crate::controller::elevator::ElevatorMachine;
use crate::controller::input::{InputPort, MovementKeys};
use crate::controller::interaction::{InteractionEvent, InteractionResolver};
use crate::controller::movement::MovementIntegrator;
use crate::model::elevator::ElevatorState;
use crate::model::scene::{Descriptor, ExpoNodes, InteractAction, SceneGraph};
use crate::model::{Camera, HallLayout, PlayerState};

/// Outbound events for the UI layer, in the order they happened this frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FrameEvent {
    HoverChanged(Option<Descriptor>),
    Selected(Descriptor),
    ElevatorCalled { floor: usize, accepted: bool },
    ElevatorArrived { floor: usize },
}

/// Simulation state for one hall, advanced once per rendered frame.
///
/// Within a frame the order is fixed: input sample, look, movement,
/// elevator, scene sync, raycast. Nothing observes a half-updated frame.
pub struct FrameLoopContext {
    pub camera: Camera,
    pub player: PlayerState,
    pub layout: HallLayout,
    pub scene: SceneGraph,
    pub nodes: ExpoNodes,
    pub camera_controller: CameraController,
    pub movement: MovementIntegrator,
    pub elevator: ElevatorMachine,
    pub interaction: InteractionResolver,
    controls_enabled: bool,
    last_time: Option<f64>,
}

impl FrameLoopContext {
    /// Default expo scene built from the configured layout.
    pub fn new(config: &ExpoConfig, width: u32, height: u32) -> Self {
        let (scene, nodes) = SceneGraph::expo(&config.layout);
        Self::with_scene(config, scene, nodes, width, height)
    }

    pub fn with_scene(config: &ExpoConfig, scene: SceneGraph, nodes: ExpoNodes, width: u32, height: u32) -> Self {
        let layout = config.layout.clone();
        let player = PlayerState::new(layout.spawn, layout.spawn_yaw, config.movement.eye_height);

        let mut camera = Camera::new(width, height);
        camera.fov_y = config.camera.fov_deg.to_radians();
        let camera_controller = CameraController::new(config.camera.clone());
        camera_controller.sync_camera_from_player(&mut camera, &player);

        let elevator = ElevatorMachine::new(config.elevator.clone(), layout.floor_heights.clone());

        info!(
            spawn = ?layout.spawn,
            floors = layout.floor_heights.len(),
            nodes = scene.len(),
            "frame loop ready"
        );

        Self {
            camera,
            player,
            layout,
            scene,
            nodes,
            camera_controller,
            movement: MovementIntegrator::new(config.movement.clone()),
            elevator,
            interaction: InteractionResolver::new(config.interaction.clone()),
            controls_enabled: true,
            last_time: None,
        }
    }

    /// Advance to `now_ms` (host clock, milliseconds). The first call only
    /// starts the clock.
    pub fn update(&mut self, now_ms: f64, input: &mut impl InputPort) -> Vec<FrameEvent> {
        let max_delta = self.movement.config.max_delta as f64;
        let dt = match self.last_time.replace(now_ms) {
            Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, max_delta) as f32,
            None => 0.0,
        };
        self.step(dt, input)
    }

    /// One frame with an explicit time step.
    pub fn step(&mut self, dt: f32, input: &mut impl InputPort) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let snapshot = input.sample();

        // Look and zoom are suspended while a detail panel is open
        let keys = if self.controls_enabled {
            self.camera_controller.apply_look(&mut self.player, snapshot.look_delta);
            self.camera_controller.apply_zoom(&mut self.camera, snapshot.scroll_delta);
            snapshot.keys
        } else {
            MovementKeys::default()
        };

        let moved = self.movement.tick(&self.player, keys, dt, &self.layout, self.elevator.state());
        self.player = moved.player;
        self.elevator.set_player_inside(moved.player_inside);

        if let Some(floor) = self.elevator.tick(dt).arrived {
            events.push(FrameEvent::ElevatorArrived { floor });
        }

        let cabin = self.layout.elevator.center + Vec3::Y * self.elevator.state().y();
        self.scene.set_offset(self.nodes.cabin, cabin);

        self.camera_controller.sync_camera_from_player(&mut self.camera, &self.player);

        for event in self.interaction.update(&self.scene, &self.camera, &snapshot) {
            match event {
                InteractionEvent::HoverChanged(target) => {
                    events.push(FrameEvent::HoverChanged(target.map(|t| t.interactive.descriptor)));
                }
                InteractionEvent::Selected(_) if !self.controls_enabled => {
                    trace!("selection ignored while a panel is open");
                }
                InteractionEvent::Selected(target) => match target.interactive.action {
                    InteractAction::CallElevator(floor) => {
                        let accepted = self.elevator.call_floor(floor);
                        events.push(FrameEvent::ElevatorCalled { floor, accepted });
                    }
                    InteractAction::ShowDetails => {
                        debug!(id = target.interactive.descriptor.id, "controls suspended for detail view");
                        self.controls_enabled = false;
                        self.player.velocity = Vec3::ZERO;
                        events.push(FrameEvent::Selected(target.interactive.descriptor));
                    }
                },
            }
        }

        events
    }

    /// Close the detail view and hand movement and look back to the player.
    pub fn dismiss_selection(&mut self) {
        if !self.controls_enabled {
            debug!("controls resumed");
        }
        self.controls_enabled = true;
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn elevator_state(&self) -> &ElevatorState {
        self.elevator.state()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }
}
