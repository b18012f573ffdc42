//! Browser glue: DOM listeners feed `InputState`, the host's render loop
//! drives `ExpoHall::frame`.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use crate::config::ExpoConfig;
use crate::controller::input::{InputEvent, InputState, MouseButton};
use crate::controller::{FrameEvent, FrameLoopContext};
use crate::logging;
use crate::model::elevator::{DoorPanels, ElevatorState};
use crate::model::scene::{Aabb, Descriptor, InteractAction, Interactive, NodeId};

#[derive(Serialize)]
struct CameraView {
    eye: Vec3,
    yaw: f32,
    pitch: f32,
    fov_y: f32,
    view_proj: [f32; 16],
}

#[derive(Serialize)]
struct ElevatorView<'a> {
    #[serde(flatten)]
    state: &'a ElevatorState,
    label: String,
    doors: DoorPanels,
    pending_floor: Option<usize>,
}

/// One hall bound to one canvas.
#[wasm_bindgen]
pub struct ExpoHall {
    ctx: Rc<RefCell<FrameLoopContext>>,
    input: Rc<RefCell<InputState>>,
    window: Window,
}

#[wasm_bindgen]
impl ExpoHall {
    /// Attach to `canvas`. `config_json` overrides the default hall.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: Option<String>) -> Result<ExpoHall, JsValue> {
        logging::init();

        let config = match config_json {
            Some(json) => ExpoConfig::from_json_str(&json).map_err(|e| js_error(e.to_string()))?,
            None => ExpoConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
        let document = window.document().ok_or_else(|| js_error("no document on window"))?;

        let (width, height) = (canvas.client_width().max(1) as u32, canvas.client_height().max(1) as u32);
        let ctx = Rc::new(RefCell::new(FrameLoopContext::new(&config, width, height)));
        let input = Rc::new(RefCell::new(InputState::with_bindings(config.bindings.clone())));
        input.borrow_mut().process_event(&InputEvent::Resized { width, height });

        setup_input_listeners(&document, &window, &canvas, input.clone(), ctx.clone())?;
        info!(width, height, "expo hall attached");

        Ok(ExpoHall { ctx, input, window })
    }

    /// Advance the simulation to `now_ms` and return this frame's events as JSON.
    pub fn frame(&self, now_ms: f64) -> Result<String, JsValue> {
        let events = self.ctx.borrow_mut().update(now_ms, &mut *self.input.borrow_mut());
        release_pointer_on_selection(&self.window, &events);
        serde_json::to_string(&events).map_err(|e| js_error(e.to_string()))
    }

    /// Drive `frame` from `requestAnimationFrame`, passing non-empty event
    /// batches to `on_events`.
    pub fn run(&self, on_events: js_sys::Function) {
        let ctx = self.ctx.clone();
        let input = self.input.clone();
        let window = self.window.clone();
        RcCellCallback::new(self.window.clone(), move || {
            let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
            let events = ctx.borrow_mut().update(now, &mut *input.borrow_mut());
            release_pointer_on_selection(&window, &events);
            if events.is_empty() {
                return;
            }
            match serde_json::to_string(&events) {
                Ok(json) => {
                    if let Err(e) = on_events.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        warn!(?e, "event callback threw");
                    }
                }
                Err(e) => error!(%e, "failed to encode frame events"),
            }
        })
        .start();
    }

    pub fn dismiss_selection(&self) {
        self.ctx.borrow_mut().dismiss_selection();
    }

    pub fn controls_enabled(&self) -> bool {
        self.ctx.borrow().controls_enabled()
    }

    pub fn call_floor(&self, floor: usize) -> bool {
        self.ctx.borrow_mut().elevator.call_floor(floor)
    }

    pub fn camera_json(&self) -> Result<String, JsValue> {
        let ctx = self.ctx.borrow();
        let c = &ctx.camera;
        let view = CameraView {
            eye: c.eye,
            yaw: c.yaw,
            pitch: c.pitch,
            fov_y: c.fov_y,
            view_proj: c.view_proj().to_cols_array(),
        };
        serde_json::to_string(&view).map_err(|e| js_error(e.to_string()))
    }

    pub fn elevator_json(&self) -> Result<String, JsValue> {
        let ctx = self.ctx.borrow();
        let state = ctx.elevator_state();
        let view = ElevatorView {
            state,
            label: state.display_label(ctx.elevator.floor_heights()),
            doors: DoorPanels::from_openness(state.door_openness()),
            pending_floor: state.pending_floor(),
        };
        serde_json::to_string(&view).map_err(|e| js_error(e.to_string()))
    }

    /// Node id of the cabin group; children added under it ride along.
    pub fn cabin_node(&self) -> u32 {
        self.ctx.borrow().nodes.cabin.0
    }

    pub fn add_group(&self, parent: Option<u32>, x: f32, y: f32, z: f32) -> u32 {
        self.ctx.borrow_mut().scene.add_group(parent.map(NodeId), Vec3::new(x, y, z)).0
    }

    /// Box of half extents `(hx, hy, hz)` centered on the node origin.
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(&self, parent: Option<u32>, x: f32, y: f32, z: f32, hx: f32, hy: f32, hz: f32) -> u32 {
        let bounds = Aabb::from_center(Vec3::ZERO, Vec3::new(hx, hy, hz));
        self.ctx.borrow_mut().scene.add_box(parent.map(NodeId), Vec3::new(x, y, z), bounds).0
    }

    /// Mark `node` interactive. `descriptor_json` is `{id, name, color, position}`;
    /// with `call_floor` set the node acts as an elevator button.
    pub fn tag(&self, node: u32, descriptor_json: &str, call_floor: Option<usize>) -> Result<bool, JsValue> {
        let descriptor: Descriptor = serde_json::from_str(descriptor_json).map_err(|e| js_error(e.to_string()))?;
        let action = call_floor.map_or(InteractAction::ShowDetails, InteractAction::CallElevator);
        Ok(self.ctx.borrow_mut().scene.tag(NodeId(node), Interactive { descriptor, action }))
    }
}

/// Listeners only translate DOM events into `InputEvent`s.
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    input_state: Rc<RefCell<InputState>>,
    ctx: Rc<RefCell<FrameLoopContext>>,
) -> Result<(), JsValue> {
    // Keyboard down
    {
        let input_state = input_state.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let code = e.code();
            let mut input = input_state.borrow_mut();
            // Keep bound keys (arrows included) from scrolling the page
            if input.bindings.is_bound(&code) {
                e.prevent_default();
            }
            input.process_event(&InputEvent::KeyDown(code));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let input_state = input_state.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            input_state.borrow_mut().process_event(&InputEvent::KeyUp(e.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss
    {
        let input_state = input_state.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().process_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Tab visibility
    {
        let input_state = input_state.clone();
        let doc = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let visible = !doc.hidden();
            input_state.borrow_mut().process_event(&InputEvent::VisibilityChanged { visible });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Pointer lock change
    {
        let input_state = input_state.clone();
        let doc = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc.pointer_lock_element().is_some();
            input_state.borrow_mut().process_event(&InputEvent::PointerLockChanged { locked });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click captures the pointer, unless a detail panel is open or
    // the click ended a free-cursor drag-look
    {
        let canvas_click = canvas.clone();
        let ctx = ctx.clone();
        let input_state = input_state.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            let ctx = ctx.borrow();
            let threshold = ctx.interaction.config.drag_threshold_px;
            if !ctx.controls_enabled() || !input_state.borrow().wants_capture(threshold) {
                return;
            }
            if let Ok(html_el) = canvas_click.clone().dyn_into::<HtmlElement>() {
                html_el.request_pointer_lock();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse down
    {
        let input_state = input_state.clone();
        let canvas_md = canvas.clone();
        let mousedown = Closure::wrap(Box::new(move |e: MouseEvent| {
            let (x, y) = canvas_position(&canvas_md, &e);
            input_state.borrow_mut().process_event(&InputEvent::PointerDown {
                button: MouseButton::from_web_button(e.button()),
                x,
                y,
                time_ms: e.time_stamp(),
                on_surface: targets_canvas(&canvas_md, &e),
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }

    // Mouse move
    {
        let input_state = input_state.clone();
        let canvas_mm = canvas.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            let (x, y) = canvas_position(&canvas_mm, &e);
            input_state.borrow_mut().process_event(&InputEvent::PointerMove {
                dx: e.movement_x() as f32,
                dy: e.movement_y() as f32,
                x,
                y,
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse up
    {
        let input_state = input_state.clone();
        let canvas_mu = canvas.clone();
        let mouseup = Closure::wrap(Box::new(move |e: MouseEvent| {
            let (x, y) = canvas_position(&canvas_mu, &e);
            input_state.borrow_mut().process_event(&InputEvent::PointerUp {
                button: MouseButton::from_web_button(e.button()),
                x,
                y,
                time_ms: e.time_stamp(),
                on_surface: targets_canvas(&canvas_mu, &e),
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Context menu prevention
    {
        let contextmenu = Closure::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("contextmenu", contextmenu.as_ref().unchecked_ref())?;
        contextmenu.forget();
    }

    // Mouse wheel
    {
        let input_state = input_state.clone();
        let wheel = Closure::wrap(Box::new(move |e: WheelEvent| {
            input_state.borrow_mut().process_event(&InputEvent::Wheel { delta_y: e.delta_y() as f32 });
            e.prevent_default();
        }) as Box<dyn FnMut(WheelEvent)>);
        canvas.add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    // Window resize
    {
        let input_state = input_state.clone();
        let canvas_rs = canvas.clone();
        let ctx = ctx.clone();
        let resize = Closure::wrap(Box::new(move |_e: Event| {
            let width = canvas_rs.client_width().max(1) as u32;
            let height = canvas_rs.client_height().max(1) as u32;
            input_state.borrow_mut().process_event(&InputEvent::Resized { width, height });
            ctx.borrow_mut().resize(width, height);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
        resize.forget();
    }

    Ok(())
}

/// A detail panel needs the cursor back.
fn release_pointer_on_selection(window: &Window, events: &[FrameEvent]) {
    if !events.iter().any(|e| matches!(e, FrameEvent::Selected(_))) {
        return;
    }
    if let Some(document) = window.document() {
        if document.pointer_lock_element().is_some() {
            debug!("selection made, releasing pointer lock");
            document.exit_pointer_lock();
        }
    }
}

fn canvas_position(canvas: &HtmlCanvasElement, e: &MouseEvent) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    (
        (e.client_x() as f64 - rect.left()) as f32,
        (e.client_y() as f64 - rect.top()) as f32,
    )
}

fn targets_canvas(canvas: &HtmlCanvasElement, e: &MouseEvent) -> bool {
    let canvas: &JsValue = canvas.as_ref();
    e.target().map(JsValue::from).as_ref() == Some(canvas)
}

fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// Self-rescheduling `requestAnimationFrame` loop.
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            let cb_ref = callback_clone.borrow();
            if let Some(cb) = cb_ref.as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    error!(?e, "requestAnimationFrame failed, loop stopped");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                error!(?e, "requestAnimationFrame failed to start");
            }
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
    }
}
