/// Platform-agnostic input handling system
use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, DOM `KeyboardEvent.code` values
    KeyDown(String),
    KeyUp(String),

    // Pointer events, positions in viewport pixels
    PointerDown { button: MouseButton, x: f32, y: f32, time_ms: f64, on_surface: bool },
    PointerMove { dx: f32, dy: f32, x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32, time_ms: f64, on_surface: bool },
    Wheel { delta_y: f32 },

    // Window events
    Resized { width: u32, height: u32 },
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Held movement flags for one frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl MovementKeys {
    pub fn any_direction(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// (forward, strafe) axes in {-1, 0, 1}; opposing keys cancel.
    pub fn axes(&self) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| pos as i8 as f32 - neg as i8 as f32;
        (axis(self.forward, self.backward), axis(self.right, self.left))
    }
}

/// A completed press/release of the primary button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickGesture {
    pub pressed_at_ms: f64,
    pub released_at_ms: f64,
    /// Pointer travel in pixels between press and release
    pub travel_px: f32,
    /// Pressed and released on the render surface, not on UI chrome
    pub on_surface: bool,
    pub pointer_locked: bool,
}

impl ClickGesture {
    pub fn duration_ms(&self) -> f64 {
        (self.released_at_ms - self.pressed_at_ms).max(0.0)
    }
}

/// Stable per-frame view of the input, taken once at tick start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys: MovementKeys,
    /// Pixels of look motion since the previous sample
    pub look_delta: Vec2,
    pub scroll_delta: f32,
    pub pointer_locked: bool,
    pub drag_active: bool,
    /// Cursor position in normalized device coordinates, y up
    pub cursor_ndc: Vec2,
    pub clicks: Vec<ClickGesture>,
}

impl InputSnapshot {
    pub fn with_keys(keys: MovementKeys) -> Self {
        Self { keys, ..Self::default() }
    }
}

/// Source of per-frame input. The browser listeners feed `InputState`;
/// tests feed `ScriptedInput`.
pub trait InputPort {
    /// Take the current snapshot and consume accumulated deltas.
    fn sample(&mut self) -> InputSnapshot;
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub run: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let codes = |c: &[&str]| c.iter().map(|s| s.to_string()).collect();
        Self {
            forward: codes(&["KeyW", "ArrowUp"]),
            backward: codes(&["KeyS", "ArrowDown"]),
            left: codes(&["KeyA", "ArrowLeft"]),
            right: codes(&["KeyD", "ArrowRight"]),
            run: codes(&["ShiftLeft", "ShiftRight"]),
        }
    }
}

impl KeyBindings {
    pub fn movement(&self, pressed: &HashSet<String>) -> MovementKeys {
        let any = |codes: &[String]| codes.iter().any(|c| pressed.contains(c));
        MovementKeys {
            forward: any(&self.forward),
            backward: any(&self.backward),
            left: any(&self.left),
            right: any(&self.right),
            run: any(&self.run),
        }
    }

    pub fn is_bound(&self, code: &str) -> bool {
        [&self.forward, &self.backward, &self.left, &self.right, &self.run]
            .iter()
            .any(|codes| codes.iter().any(|c| c == code))
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    started_ms: f64,
    travel_px: f32,
}

/// Unified input state, written by event listeners and sampled by the frame loop
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub bindings: KeyBindings,
    pub look_delta: Vec2,
    pub scroll_delta: f32,
    pub pointer_locked: bool,
    pub mouse_pos: Vec2,
    pub viewport: (u32, u32),
    press: Option<Press>,
    clicks: Vec<ClickGesture>,
    last_release: Option<ClickGesture>,
}

impl InputState {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::default())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            pressed_keys: HashSet::new(),
            bindings,
            look_delta: Vec2::ZERO,
            scroll_delta: 0.0,
            pointer_locked: false,
            mouse_pos: Vec2::ZERO,
            viewport: (1, 1),
            press: None,
            clicks: Vec::new(),
            last_release: None,
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => {
                self.pressed_keys.insert(code.clone());
            }
            InputEvent::KeyUp(code) => {
                self.pressed_keys.remove(code.as_str());
            }
            InputEvent::PointerDown { button: MouseButton::Left, x, y, time_ms, on_surface } => {
                self.mouse_pos = Vec2::new(*x, *y);
                // Presses on overlays belong to the UI: no drag-look, no click
                self.press = on_surface.then_some(Press { started_ms: *time_ms, travel_px: 0.0 });
            }
            InputEvent::PointerMove { dx, dy, x, y } => {
                self.mouse_pos = Vec2::new(*x, *y);
                if let Some(press) = self.press.as_mut() {
                    press.travel_px += Vec2::new(*dx, *dy).length();
                }
                // Look while captured, or while dragging with the cursor free
                if self.pointer_locked || self.press.is_some() {
                    self.look_delta += Vec2::new(*dx, *dy);
                }
            }
            InputEvent::PointerUp { button: MouseButton::Left, x, y, time_ms, on_surface } => {
                self.mouse_pos = Vec2::new(*x, *y);
                if let Some(press) = self.press.take() {
                    let gesture = ClickGesture {
                        pressed_at_ms: press.started_ms,
                        released_at_ms: *time_ms,
                        travel_px: press.travel_px,
                        on_surface: *on_surface,
                        pointer_locked: self.pointer_locked,
                    };
                    trace!(?gesture, "pointer released");
                    self.last_release = Some(gesture);
                    self.clicks.push(gesture);
                }
            }
            InputEvent::PointerDown { .. } | InputEvent::PointerUp { .. } => {}
            InputEvent::Wheel { delta_y } => {
                self.scroll_delta += delta_y;
            }
            InputEvent::Resized { width, height } => {
                self.viewport = ((*width).max(1), (*height).max(1));
            }
            InputEvent::FocusLost => {
                self.reset();
            }
            InputEvent::VisibilityChanged { visible } => {
                if !visible {
                    self.reset();
                }
            }
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
                // A lock toggle mid-press is not a click
                self.press = None;
            }
        }
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    /// Drop every transient flag and delta so nothing stays held after
    /// the window loses focus.
    pub fn reset(&mut self) {
        trace!("input reset");
        self.clear_keys();
        self.look_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
        self.pointer_locked = false;
        self.press = None;
        self.clicks.clear();
        self.last_release = None;
    }

    pub fn consume_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Whether a canvas click should request pointer capture: not already
    /// captured, and the gesture that produced it was not a drag-look.
    pub fn wants_capture(&self, drag_threshold_px: f32) -> bool {
        !self.pointer_locked
            && self
                .last_release
                .map_or(true, |g| g.on_surface && g.travel_px < drag_threshold_px)
    }

    pub fn drag_active(&self) -> bool {
        !self.pointer_locked && self.press.is_some()
    }

    pub fn cursor_ndc(&self) -> Vec2 {
        let (w, h) = self.viewport;
        Vec2::new(
            self.mouse_pos.x / w as f32 * 2.0 - 1.0,
            1.0 - self.mouse_pos.y / h as f32 * 2.0,
        )
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for InputState {
    fn sample(&mut self) -> InputSnapshot {
        InputSnapshot {
            keys: self.bindings.movement(&self.pressed_keys),
            look_delta: self.consume_look(),
            scroll_delta: std::mem::take(&mut self.scroll_delta),
            pointer_locked: self.pointer_locked,
            drag_active: self.drag_active(),
            cursor_ndc: self.cursor_ndc(),
            clicks: std::mem::take(&mut self.clicks),
        }
    }
}

/// Replays prepared snapshots, one per frame; idle once exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, snapshot: InputSnapshot) -> Self {
        self.frames.push_back(snapshot);
        self
    }

    /// Repeat a snapshot for `frames` frames; clicks are only kept on the first.
    pub fn hold(mut self, snapshot: InputSnapshot, frames: usize) -> Self {
        for i in 0..frames {
            let mut frame = snapshot.clone();
            if i > 0 {
                frame.clicks.clear();
            }
            self.frames.push_back(frame);
        }
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputPort for ScriptedInput {
    fn sample(&mut self) -> InputSnapshot {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: &str) -> InputEvent {
        InputEvent::KeyDown(code.to_string())
    }

    #[test]
    fn test_bound_keys_map_to_flags() {
        let mut input = InputState::new();
        input.process_event(&key("KeyW"));
        input.process_event(&key("ShiftLeft"));
        input.process_event(&key("ArrowLeft"));
        let snap = input.sample();
        assert!(snap.keys.forward && snap.keys.run && snap.keys.left);
        assert!(!snap.keys.backward && !snap.keys.right);

        input.process_event(&InputEvent::KeyUp("KeyW".into()));
        assert!(!input.sample().keys.forward);
    }

    #[test]
    fn test_focus_loss_releases_held_keys() {
        let mut input = InputState::new();
        input.process_event(&key("KeyW"));
        assert!(input.sample().keys.forward);
        input.process_event(&InputEvent::FocusLost);
        assert!(!input.sample().keys.forward);
    }

    #[test]
    fn test_hidden_tab_resets_input() {
        let mut input = InputState::new();
        input.process_event(&key("KeyD"));
        input.process_event(&InputEvent::VisibilityChanged { visible: true });
        assert!(input.sample().keys.right);
        input.process_event(&InputEvent::VisibilityChanged { visible: false });
        assert!(!input.sample().keys.right);
    }

    #[test]
    fn test_look_accumulates_only_when_captured_or_dragging() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerMove { dx: 5.0, dy: 1.0, x: 5.0, y: 1.0 });
        assert_eq!(input.sample().look_delta, Vec2::ZERO);

        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::PointerMove { dx: 3.0, dy: 2.0, x: 0.0, y: 0.0 });
        input.process_event(&InputEvent::PointerMove { dx: 1.0, dy: -1.0, x: 0.0, y: 0.0 });
        assert_eq!(input.sample().look_delta, Vec2::new(4.0, 1.0));
        // Consumed
        assert_eq!(input.sample().look_delta, Vec2::ZERO);
    }

    #[test]
    fn test_drag_produces_gesture_with_travel() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerDown {
            button: MouseButton::Left, x: 100.0, y: 100.0, time_ms: 1000.0, on_surface: true,
        });
        assert!(input.drag_active());
        input.process_event(&InputEvent::PointerMove { dx: 6.0, dy: 8.0, x: 106.0, y: 108.0 });
        input.process_event(&InputEvent::PointerUp {
            button: MouseButton::Left, x: 106.0, y: 108.0, time_ms: 1250.0, on_surface: true,
        });
        let snap = input.sample();
        assert!(!snap.drag_active);
        assert_eq!(snap.look_delta, Vec2::new(6.0, 8.0));
        assert_eq!(snap.clicks.len(), 1);
        let click = snap.clicks[0];
        assert!((click.travel_px - 10.0).abs() < 1e-5);
        assert_eq!(click.duration_ms(), 250.0);
        assert!(input.sample().clicks.is_empty());
    }

    fn press_at(time_ms: f64, on_surface: bool) -> InputEvent {
        InputEvent::PointerDown { button: MouseButton::Left, x: 50.0, y: 50.0, time_ms, on_surface }
    }

    fn release_at(time_ms: f64, on_surface: bool) -> InputEvent {
        InputEvent::PointerUp { button: MouseButton::Left, x: 50.0, y: 50.0, time_ms, on_surface }
    }

    #[test]
    fn test_press_on_overlay_is_neither_click_nor_drag() {
        let mut input = InputState::new();
        input.process_event(&press_at(1000.0, false));
        assert!(!input.drag_active());
        input.process_event(&InputEvent::PointerMove { dx: 200.0, dy: 0.0, x: 250.0, y: 50.0 });
        input.process_event(&release_at(1080.0, true));
        let snap = input.sample();
        assert_eq!(snap.look_delta, Vec2::ZERO);
        assert!(snap.clicks.is_empty());
    }

    #[test]
    fn test_release_on_overlay_is_marked_off_surface() {
        let mut input = InputState::new();
        input.process_event(&press_at(1000.0, true));
        input.process_event(&release_at(1080.0, false));
        let clicks = input.sample().clicks;
        assert_eq!(clicks.len(), 1);
        assert!(!clicks[0].on_surface);
    }

    #[test]
    fn test_capture_skipped_after_drag_look() {
        let mut input = InputState::new();
        assert!(input.wants_capture(4.0));

        input.process_event(&press_at(1000.0, true));
        input.process_event(&InputEvent::PointerMove { dx: 30.0, dy: 0.0, x: 80.0, y: 50.0 });
        input.process_event(&release_at(1400.0, true));
        assert!(!input.wants_capture(4.0));

        input.process_event(&press_at(2000.0, true));
        input.process_event(&release_at(2090.0, true));
        assert!(input.wants_capture(4.0));

        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        assert!(!input.wants_capture(4.0));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerUp {
            button: MouseButton::Left, x: 0.0, y: 0.0, time_ms: 10.0, on_surface: true,
        });
        assert!(input.sample().clicks.is_empty());
    }

    #[test]
    fn test_cursor_ndc() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::Resized { width: 800, height: 600 });
        input.process_event(&InputEvent::PointerMove { dx: 0.0, dy: 0.0, x: 400.0, y: 300.0 });
        assert_eq!(input.cursor_ndc(), Vec2::ZERO);
        input.process_event(&InputEvent::PointerMove { dx: 0.0, dy: 0.0, x: 800.0, y: 0.0 });
        assert_eq!(input.cursor_ndc(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_wheel_accumulates_until_sampled() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::Wheel { delta_y: 100.0 });
        input.process_event(&InputEvent::Wheel { delta_y: -40.0 });
        assert_eq!(input.sample().scroll_delta, 60.0);
        assert_eq!(input.sample().scroll_delta, 0.0);
    }

    #[test]
    fn test_axes_cancel() {
        let keys = MovementKeys { forward: true, backward: true, right: true, ..Default::default() };
        assert_eq!(keys.axes(), (0.0, 1.0));
    }

    #[test]
    fn test_scripted_input_hold_keeps_clicks_once() {
        let click = ClickGesture {
            pressed_at_ms: 0.0, released_at_ms: 50.0, travel_px: 0.0, on_surface: true, pointer_locked: true,
        };
        let snap = InputSnapshot { clicks: vec![click], ..Default::default() };
        let mut script = ScriptedInput::new().hold(snap, 3);
        assert_eq!(script.sample().clicks.len(), 1);
        assert!(script.sample().clicks.is_empty());
        assert_eq!(script.remaining(), 1);
        script.sample();
        assert_eq!(script.sample(), InputSnapshot::default());
    }
}
