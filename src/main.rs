//! Headless walkthrough of the expo hall: walk to the elevator, ride to
//! the mezzanine, look at a booth and open it. Every frame event is logged.

use std::env;
use std::f32::consts::{PI, TAU};
use std::process::ExitCode;

use glam::{Vec2, Vec3};
use tracing::{error, info, warn};

use expohall::controller::input::{ClickGesture, InputSnapshot, MovementKeys, ScriptedInput};
use expohall::model::scene::InteractAction;
use expohall::{logging, ExpoConfig, FrameEvent, FrameLoopContext};

const FRAME_MS: f64 = 1000.0 / 60.0;

struct Tour {
    ctx: FrameLoopContext,
    clock_ms: f64,
    events: usize,
}

impl Tour {
    fn new(config: &ExpoConfig) -> Self {
        let mut ctx = FrameLoopContext::new(config, 1280, 720);
        // Starts the clock
        ctx.update(0.0, &mut ScriptedInput::new());
        Self { ctx, clock_ms: 0.0, events: 0 }
    }

    fn play(&mut self, phase: &str, mut script: ScriptedInput) {
        info!(phase, frames = script.remaining(), "phase start");
        while script.remaining() > 0 {
            self.clock_ms += FRAME_MS;
            for event in self.ctx.update(self.clock_ms, &mut script) {
                self.events += 1;
                log_event(&event);
            }
        }
        let p = self.ctx.player.position;
        let e = self.ctx.elevator_state();
        info!(
            phase,
            x = p.x,
            y = p.y,
            z = p.z,
            cabin_y = e.y(),
            label = %e.display_label(self.ctx.elevator.floor_heights()),
            "phase done"
        );
    }

    fn idle(&mut self, phase: &str, frames: usize) {
        self.play(phase, ScriptedInput::new().hold(locked(), frames));
    }

    /// Pointer motion that puts the crosshair on `target`, taking the short way round.
    fn look_towards(&self, target: Vec3) -> Vec2 {
        let sens = self.ctx.camera_controller.config.look_sensitivity;
        let player = &self.ctx.player;
        let to = target - player.position;
        let yaw = to.z.atan2(to.x);
        let pitch = to.y.atan2(Vec2::new(to.x, to.z).length());
        let turn = (yaw - player.yaw + PI).rem_euclid(TAU) - PI;
        Vec2::new(turn / sens, (player.pitch - pitch) / sens)
    }

    fn turn_to(&mut self, phase: &str, target: Vec3) {
        let look = InputSnapshot { look_delta: self.look_towards(target), ..locked() };
        self.play(phase, ScriptedInput::new().then(look));
    }

    /// Quick captured click on whatever is under the crosshair.
    fn click(&mut self, phase: &str) {
        let now = self.clock_ms;
        let click = InputSnapshot {
            clicks: vec![ClickGesture {
                pressed_at_ms: now,
                released_at_ms: now + 90.0,
                travel_px: 0.0,
                on_surface: true,
                pointer_locked: true,
            }],
            ..locked()
        };
        self.play(phase, ScriptedInput::new().then(click));
    }

    fn walk(&mut self, phase: &str, frames: usize) {
        let forward = InputSnapshot { keys: MovementKeys { forward: true, ..Default::default() }, ..locked() };
        self.play(phase, ScriptedInput::new().hold(forward, frames));
    }

    fn find_target(&self, wanted: impl Fn(&InteractAction) -> bool) -> Option<Vec3> {
        let eye = self.ctx.player.position;
        self.ctx
            .scene
            .interactives()
            .filter(|(_, i)| wanted(&i.action))
            .map(|(_, i)| i.descriptor.position)
            .min_by(|a, b| a.distance(eye).total_cmp(&b.distance(eye)))
    }
}

fn locked() -> InputSnapshot {
    InputSnapshot { pointer_locked: true, ..Default::default() }
}

fn log_event(event: &FrameEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!(event = %json, "frame event"),
        Err(e) => warn!(%e, ?event, "unencodable frame event"),
    }
}

fn load_config() -> Result<ExpoConfig, expohall::ConfigError> {
    match env::args().nth(1).or_else(|| env::var("EXPOHALL_CONFIG").ok()) {
        Some(path) => ExpoConfig::from_path(path),
        None => {
            info!("no config given, using the default hall");
            Ok(ExpoConfig::default())
        }
    }
}

fn main() -> ExitCode {
    logging::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(%e, "config rejected");
            return ExitCode::FAILURE;
        }
    };

    let mut tour = Tour::new(&config);

    tour.walk("walk to the elevator", 345);
    tour.idle("come to a stop", 60);

    let upper = config.layout.floor_heights.len().saturating_sub(1);
    match tour.find_target(|a| *a == InteractAction::CallElevator(upper)) {
        Some(button) => {
            tour.turn_to("face the panel", button);
            tour.click("press the top floor button");
        }
        None => warn!(upper, "no call button for the top floor"),
    }
    tour.idle("ride", 400);

    let ahead = tour.ctx.player.position + Vec3::Z * 10.0;
    tour.turn_to("turn to the door", ahead);
    tour.walk("step out", 60);
    tour.idle("settle", 30);

    match tour.find_target(|a| *a == InteractAction::ShowDetails) {
        Some(booth) => {
            tour.turn_to("look at the nearest booth", booth + Vec3::Y * 2.5);
            tour.click("open it");
        }
        None => warn!("hall has no booths"),
    }
    tour.walk("try to walk while the panel is open", 30);
    tour.ctx.dismiss_selection();
    tour.walk("walk on", 30);

    info!(events = tour.events, seconds = tour.clock_ms / 1000.0, "tour finished");
    ExitCode::SUCCESS
}
