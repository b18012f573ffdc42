use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};

use expohall::controller::input::{ClickGesture, InputEvent, InputSnapshot, MouseButton, MovementKeys};
use expohall::model::{ElevatorStatus, PlayerState};
use expohall::{ExpoConfig, FrameEvent, FrameLoopContext, InputState, ScriptedInput};

const DT: f32 = 1.0 / 60.0;

fn hall() -> FrameLoopContext {
    FrameLoopContext::new(&ExpoConfig::default(), 800, 600)
}

fn locked() -> InputSnapshot {
    InputSnapshot { pointer_locked: true, ..Default::default() }
}

fn locked_click() -> InputSnapshot {
    InputSnapshot {
        clicks: vec![ClickGesture {
            pressed_at_ms: 0.0,
            released_at_ms: 80.0,
            travel_px: 0.0,
            on_surface: true,
            pointer_locked: true,
        }],
        ..locked()
    }
}

fn forward() -> InputSnapshot {
    InputSnapshot { keys: MovementKeys { forward: true, ..Default::default() }, ..locked() }
}

fn run(ctx: &mut FrameLoopContext, script: ScriptedInput) -> Vec<FrameEvent> {
    let mut script = script;
    let mut events = Vec::new();
    while script.remaining() > 0 {
        events.extend(ctx.step(DT, &mut script));
    }
    events
}

fn selected_names(events: &[FrameEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            FrameEvent::Selected(d) => Some(d.name.clone()),
            _ => None,
        })
        .collect()
}

/// Standing in the aisle, facing the TechCorp arch.
fn facing_techcorp(ctx: &mut FrameLoopContext) {
    ctx.player = PlayerState::new(Vec3::new(-5.0, 1.7, -5.0), PI, 1.7);
}

#[test]
fn ride_to_the_mezzanine_and_walk_out() {
    let mut ctx = hall();
    // Inside the cabin, crosshair on the floor-1 button
    ctx.player = PlayerState::new(Vec3::new(0.0, 1.7, -52.5), 0.0, 1.7);
    ctx.player.pitch = -(0.45f32).atan2(1.17);

    let events = ctx.step(DT, &mut ScriptedInput::new().then(locked_click()));
    assert!(events.contains(&FrameEvent::ElevatorCalled { floor: 1, accepted: true }), "{events:?}");
    let hovered = events.iter().find_map(|e| match e {
        FrameEvent::HoverChanged(Some(d)) => Some(d.id),
        _ => None,
    });
    assert_eq!(hovered, Some(1001));

    let mut arrivals = Vec::new();
    for _ in 0..600 {
        let before = ctx.elevator_state().status();
        for event in ctx.step(DT, &mut ScriptedInput::new().then(locked())) {
            if let FrameEvent::ElevatorArrived { floor } = event {
                arrivals.push(floor);
            }
            assert!(!matches!(event, FrameEvent::ElevatorCalled { .. }));
        }
        // Riding: the eye trails the cabin by at most one travel step
        if before == ElevatorStatus::Moving && ctx.elevator_state().status() == ElevatorStatus::Moving {
            let lag = ctx.elevator_state().y() + 1.7 - ctx.player.position.y;
            assert!((0.0..=2.5 * DT + 1e-4).contains(&lag), "lag {lag}");
            assert_eq!(ctx.player.velocity, Vec3::ZERO);
        }
        if !arrivals.is_empty() {
            break;
        }
    }
    assert_eq!(arrivals, vec![1]);
    let state = ctx.elevator_state();
    assert_eq!(state.current_floor(), 1);
    assert_eq!(state.status(), ElevatorStatus::Idle);
    assert_eq!(state.door_openness(), 1.0);
    assert!(state.player_inside());

    run(&mut ctx, ScriptedInput::new().hold(locked(), 60));
    assert!((ctx.player.position.y - 9.2).abs() < 1e-3, "eye at {}", ctx.player.position.y);

    // Turn to the door and walk onto the mezzanine until its railing stops us
    ctx.player.yaw = FRAC_PI_2;
    ctx.player.pitch = 0.0;
    run(&mut ctx, ScriptedInput::new().hold(forward(), 60));
    let p = ctx.player.position;
    assert!(p.z <= -47.0 && p.z > -48.0, "z = {}", p.z);
    assert!((p.y - 9.2).abs() < 1e-3);
    assert!(!ctx.elevator_state().player_inside());
}

#[test]
fn call_while_cabin_moves_is_reported_as_rejected() {
    let mut ctx = hall();
    ctx.player = PlayerState::new(Vec3::new(0.0, 1.7, -52.5), 0.0, 1.7);
    // Crosshair on the ground floor button
    ctx.player.pitch = -(0.3f32).atan2(1.17);
    ctx.elevator.call_floor(1);
    while ctx.elevator_state().status() != ElevatorStatus::Moving {
        ctx.step(DT, &mut ScriptedInput::new().then(locked()));
    }

    let events = ctx.step(DT, &mut ScriptedInput::new().then(locked_click()));
    assert!(events.contains(&FrameEvent::ElevatorCalled { floor: 0, accepted: false }), "{events:?}");
    assert_eq!(ctx.elevator_state().target_floor(), 1);
}

#[test]
fn selecting_a_booth_suspends_controls_until_dismissed() {
    let mut ctx = hall();
    facing_techcorp(&mut ctx);

    let events = ctx.step(DT, &mut ScriptedInput::new().then(locked_click()));
    assert_eq!(selected_names(&events), vec!["TechCorp".to_string()]);
    assert!(!ctx.controls_enabled());

    let json = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(json["type"], "selected");
    assert_eq!(json["data"]["id"], 1);

    // Keys and look are ignored while the panel is open
    let start = ctx.player;
    let pushing = InputSnapshot { look_delta: Vec2::new(300.0, 50.0), ..forward() };
    let events = run(&mut ctx, ScriptedInput::new().hold(pushing, 30).then(locked_click()));
    assert_eq!(ctx.player.position, start.position);
    assert_eq!((ctx.player.yaw, ctx.player.pitch), (start.yaw, start.pitch));
    assert!(selected_names(&events).is_empty());

    ctx.dismiss_selection();
    assert!(ctx.controls_enabled());
    run(&mut ctx, ScriptedInput::new().hold(forward(), 30));
    assert!(ctx.player.position.x < -5.5);
}

#[test]
fn hover_follows_the_crosshair() {
    let mut ctx = hall();
    facing_techcorp(&mut ctx);

    let events = run(&mut ctx, ScriptedInput::new().hold(locked(), 10));
    let hovers: Vec<_> = events.iter().filter(|e| matches!(e, FrameEvent::HoverChanged(_))).collect();
    assert_eq!(hovers.len(), 1);

    // Quarter turn to face the empty aisle towards the entrance
    let turn = InputSnapshot { look_delta: Vec2::new(-FRAC_PI_2 / 0.002, 0.0), ..locked() };
    let events = run(&mut ctx, ScriptedInput::new().then(turn).hold(locked(), 10));
    assert_eq!(events, vec![FrameEvent::HoverChanged(None)]);
}

#[test]
fn focus_loss_stops_the_player() {
    let mut ctx = hall();
    let mut input = InputState::new();
    input.process_event(&InputEvent::KeyDown("KeyW".into()));
    for _ in 0..30 {
        ctx.step(DT, &mut input);
    }
    assert!(ctx.player.horizontal_speed() > 5.0);

    input.process_event(&InputEvent::FocusLost);
    for _ in 0..60 {
        ctx.step(DT, &mut input);
    }
    assert!(ctx.player.horizontal_speed() < 0.05);
}

#[test]
fn free_cursor_drag_is_not_a_click() {
    let mut ctx = hall();
    facing_techcorp(&mut ctx);
    let mut input = InputState::new();
    input.process_event(&InputEvent::Resized { width: 800, height: 600 });

    let press = |t: f64| InputEvent::PointerDown {
        button: MouseButton::Left, x: 400.0, y: 300.0, time_ms: t, on_surface: true,
    };
    let release = |t: f64| InputEvent::PointerUp {
        button: MouseButton::Left, x: 400.0, y: 300.0, time_ms: t, on_surface: true,
    };

    // 250 ms with 12 px of travel: a drag-look
    input.process_event(&press(1000.0));
    input.process_event(&InputEvent::PointerMove { dx: 12.0, dy: 0.0, x: 412.0, y: 300.0 });
    input.process_event(&InputEvent::PointerMove { dx: -12.0, dy: 0.0, x: 400.0, y: 300.0 });
    input.process_event(&release(1250.0));
    let events = ctx.step(DT, &mut input);
    assert!(selected_names(&events).is_empty(), "{events:?}");
    assert!(ctx.controls_enabled());

    // Same spot, quick and still: a click
    input.process_event(&press(2000.0));
    input.process_event(&release(2100.0));
    let events = ctx.step(DT, &mut input);
    assert_eq!(selected_names(&events), vec!["TechCorp".to_string()]);
}

#[test]
fn press_on_an_overlay_never_reaches_the_hall() {
    let mut ctx = hall();
    facing_techcorp(&mut ctx);
    let yaw = ctx.player.yaw;
    let mut input = InputState::new();
    input.process_event(&InputEvent::Resized { width: 800, height: 600 });

    // Pressed on a panel, dragged across and released over the canvas
    input.process_event(&InputEvent::PointerDown {
        button: MouseButton::Left, x: 400.0, y: 300.0, time_ms: 1000.0, on_surface: false,
    });
    input.process_event(&InputEvent::PointerMove { dx: 200.0, dy: 0.0, x: 600.0, y: 300.0 });
    input.process_event(&InputEvent::PointerMove { dx: -200.0, dy: 0.0, x: 400.0, y: 300.0 });
    input.process_event(&InputEvent::PointerUp {
        button: MouseButton::Left, x: 400.0, y: 300.0, time_ms: 1080.0, on_surface: true,
    });
    let events = ctx.step(DT, &mut input);
    assert!(selected_names(&events).is_empty(), "{events:?}");
    assert_eq!(ctx.player.yaw, yaw);
    assert!(ctx.controls_enabled());
}
