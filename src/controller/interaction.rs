//! Hover and selection resolution against the tagged scene graph.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::controller::input::{ClickGesture, InputSnapshot};
use crate::model::camera::Camera;
use crate::model::scene::{Interactive, NodeId, Ray, SceneGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Longest press-to-release that still counts as a click with a free cursor
    pub max_click_ms: f64,
    /// Pointer travel at or above which a press is a drag
    pub drag_threshold_px: f32,
    /// Rays ignore anything further than this
    pub max_distance: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_click_ms: 300.0,
            drag_threshold_px: 4.0,
            max_distance: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub node: NodeId,
    pub interactive: Interactive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// The object under the ray changed; `None` when nothing is hit anymore.
    HoverChanged(Option<HoverTarget>),
    Selected(HoverTarget),
}

pub struct InteractionResolver {
    pub config: InteractionConfig,
    hover: Option<HoverTarget>,
}

impl InteractionResolver {
    pub fn new(config: InteractionConfig) -> Self {
        Self { config, hover: None }
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    /// Screen center while the pointer is captured, the live cursor otherwise.
    pub fn aim_ray(&self, camera: &Camera, input: &InputSnapshot) -> Ray {
        let ndc = if input.pointer_locked { Vec2::ZERO } else { input.cursor_ndc };
        camera.ray_through(ndc)
    }

    /// Raycast for this frame, then resolve the frame's clicks against the
    /// fresh hover target.
    pub fn update(&mut self, scene: &SceneGraph, camera: &Camera, input: &InputSnapshot) -> Vec<InteractionEvent> {
        let mut events = Vec::new();

        let ray = self.aim_ray(camera, input);
        let current = scene.pick(&ray, self.config.max_distance).map(|p| HoverTarget {
            node: p.node,
            interactive: p.interactive.clone(),
        });

        let previous = self.hover.as_ref().map(|h| h.node);
        if current.as_ref().map(|h| h.node) != previous {
            trace!(from = ?previous, to = ?current.as_ref().map(|h| h.node), "hover changed");
            events.push(InteractionEvent::HoverChanged(current.clone()));
        }
        self.hover = current;

        for click in &input.clicks {
            if !self.is_selection(click) {
                trace!(?click, "click discarded");
                continue;
            }
            if let Some(target) = &self.hover {
                debug!(id = target.interactive.descriptor.id, name = %target.interactive.descriptor.name, "selected");
                events.push(InteractionEvent::Selected(target.clone()));
            }
        }

        events
    }

    /// Captured pointer: any click counts. Free cursor: short, no drag, and
    /// released on the render surface.
    pub fn is_selection(&self, click: &ClickGesture) -> bool {
        if click.pointer_locked {
            return true;
        }
        click.on_surface
            && click.duration_ms() <= self.config.max_click_ms
            && click.travel_px < self.config.drag_threshold_px
    }
}

impl Default for InteractionResolver {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scene::{Aabb, Descriptor, InteractAction};
    use glam::Vec3;

    fn tagged(scene: &mut SceneGraph, id: u32, center: Vec3) -> NodeId {
        let group = scene.add_group(None, center);
        scene.add_box(Some(group), Vec3::ZERO, Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5)));
        scene.tag(
            group,
            Interactive {
                descriptor: Descriptor {
                    id,
                    name: format!("Booth {id}"),
                    color: "#ffffff".into(),
                    position: center,
                },
                action: InteractAction::ShowDetails,
            },
        );
        group
    }

    /// Camera at (0, 1.7, 5) looking down -Z; one booth straight ahead, one off to the right.
    fn setup() -> (SceneGraph, Camera, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let ahead = tagged(&mut scene, 1, Vec3::new(0.0, 1.7, -5.0));
        let right = tagged(&mut scene, 2, Vec3::new(3.85, 1.7, -5.0));
        (scene, Camera::new(800, 600), ahead, right)
    }

    fn locked() -> InputSnapshot {
        InputSnapshot { pointer_locked: true, ..Default::default() }
    }

    fn click(duration_ms: f64, travel_px: f32, on_surface: bool, pointer_locked: bool) -> ClickGesture {
        ClickGesture {
            pressed_at_ms: 1000.0,
            released_at_ms: 1000.0 + duration_ms,
            travel_px,
            on_surface,
            pointer_locked,
        }
    }

    #[test]
    fn test_hover_emitted_once_per_transition() {
        let (scene, camera, ahead, _) = setup();
        let mut resolver = InteractionResolver::default();

        let events = resolver.update(&scene, &camera, &locked());
        assert_eq!(events.len(), 1);
        match &events[0] {
            InteractionEvent::HoverChanged(Some(t)) => assert_eq!(t.node, ahead),
            other => panic!("unexpected {other:?}"),
        }
        for _ in 0..5 {
            assert!(resolver.update(&scene, &camera, &locked()).is_empty());
        }

        let mut away = camera;
        away.yaw = std::f32::consts::FRAC_PI_2;
        let events = resolver.update(&scene, &away, &locked());
        assert_eq!(events, vec![InteractionEvent::HoverChanged(None)]);
        assert!(resolver.update(&scene, &away, &locked()).is_empty());
        assert!(resolver.hover().is_none());
    }

    #[test]
    fn test_free_cursor_aims_through_cursor() {
        let (scene, camera, ahead, right) = setup();
        let mut resolver = InteractionResolver::default();

        let free = InputSnapshot { cursor_ndc: Vec2::new(0.5, 0.0), ..Default::default() };
        resolver.update(&scene, &camera, &free);
        assert_eq!(resolver.hover().map(|h| h.node), Some(right));

        // Capture ignores the cursor and uses the crosshair
        let captured = InputSnapshot { pointer_locked: true, cursor_ndc: Vec2::new(0.5, 0.0), ..Default::default() };
        resolver.update(&scene, &camera, &captured);
        assert_eq!(resolver.hover().map(|h| h.node), Some(ahead));
    }

    #[test]
    fn test_locked_click_selects_crosshair_target() {
        let (scene, camera, ahead, _) = setup();
        let mut resolver = InteractionResolver::default();
        // Locked clicks ignore duration and travel
        let input = InputSnapshot { clicks: vec![click(2000.0, 50.0, false, true)], ..locked() };
        let events = resolver.update(&scene, &camera, &input);
        let selected: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                InteractionEvent::Selected(t) => Some(t.node),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec![ahead]);
    }

    #[test]
    fn test_locked_click_on_nothing_selects_nothing() {
        let (scene, mut camera, _, _) = setup();
        camera.yaw = std::f32::consts::FRAC_PI_2;
        let mut resolver = InteractionResolver::default();
        let input = InputSnapshot { clicks: vec![click(50.0, 0.0, true, true)], ..locked() };
        assert!(resolver.update(&scene, &camera, &input).is_empty());
    }

    #[test]
    fn test_quick_click_on_surface_selects() {
        let (scene, camera, ahead, _) = setup();
        let mut resolver = InteractionResolver::default();
        let input = InputSnapshot { clicks: vec![click(120.0, 1.0, true, false)], ..Default::default() };
        let events = resolver.update(&scene, &camera, &input);
        assert!(events.iter().any(|e| matches!(e, InteractionEvent::Selected(t) if t.node == ahead)));
    }

    #[test]
    fn test_drag_is_not_a_selection() {
        let (scene, camera, _, _) = setup();
        let mut resolver = InteractionResolver::default();
        let input = InputSnapshot { clicks: vec![click(250.0, 10.0, true, false)], ..Default::default() };
        let events = resolver.update(&scene, &camera, &input);
        assert!(!events.iter().any(|e| matches!(e, InteractionEvent::Selected(_))));
    }

    #[test]
    fn test_slow_press_is_not_a_selection() {
        let resolver = InteractionResolver::default();
        assert!(!resolver.is_selection(&click(800.0, 0.0, true, false)));
        assert!(resolver.is_selection(&click(300.0, 0.0, true, false)));
    }

    #[test]
    fn test_release_on_ui_chrome_is_not_a_selection() {
        let (scene, camera, _, _) = setup();
        let mut resolver = InteractionResolver::default();
        let input = InputSnapshot { clicks: vec![click(80.0, 0.0, false, false)], ..Default::default() };
        let events = resolver.update(&scene, &camera, &input);
        assert!(!events.iter().any(|e| matches!(e, InteractionEvent::Selected(_))));
    }

    #[test]
    fn test_out_of_range_objects_are_ignored() {
        let (scene, camera, _, _) = setup();
        let mut resolver = InteractionResolver::new(InteractionConfig { max_distance: 5.0, ..Default::default() });
        assert!(resolver.update(&scene, &camera, &locked()).is_empty());
        assert!(resolver.hover().is_none());
    }

    #[test]
    fn test_child_hit_reports_tagged_ancestor() {
        let mut scene = SceneGraph::new();
        let stand = tagged(&mut scene, 7, Vec3::new(0.0, 0.0, -5.0));
        // Sign hanging off the stand, nested two levels deep
        let mount = scene.add_group(Some(stand), Vec3::new(0.0, 1.7, 0.0));
        scene.add_box(Some(mount), Vec3::ZERO, Aabb::from_center(Vec3::ZERO, Vec3::splat(0.3)));

        let mut resolver = InteractionResolver::default();
        resolver.update(&scene, &Camera::new(800, 600), &locked());
        let hover = resolver.hover().map(|h| (h.node, h.interactive.descriptor.id));
        assert_eq!(hover, Some((stand, 7)));
    }
}
