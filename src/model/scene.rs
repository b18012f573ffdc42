//! Minimal scene graph for hit testing.
//!
//! Nodes form a parent tree with translation-only offsets and optional
//! local bounding boxes. Interactive nodes carry a descriptor the UI
//! layer understands. Geometry and materials live on the host side; this
//! only mirrors what needs to be pickable.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::model::layout::HallLayout;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized direction
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir: dir.normalize_or_zero() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self { min: self.min + offset, max: self.max + offset }
    }

    /// Slab test. Returns the distance to the entry point, or to the exit
    /// point when the ray starts inside the box.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inv = |d: f32| if d.abs() > 1e-10 { 1.0 / d } else { f32::MAX * d.signum() };
        let inv_dir = Vec3::new(inv(ray.dir.x), inv(ray.dir.y), inv(ray.dir.z));

        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;
        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max >= t_min && t_max >= 0.0 {
            Some(if t_min >= 0.0 { t_min } else { t_max })
        } else {
            None
        }
    }
}

/// Opaque payload handed to the UI layer for hover and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractAction {
    /// Open the detail panel for this object.
    ShowDetails,
    /// Elevator call button for the given floor.
    CallElevator(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interactive {
    pub descriptor: Descriptor,
    pub action: InteractAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub parent: Option<NodeId>,
    pub offset: Vec3,
    /// Bounds relative to this node's world offset
    pub bounds: Option<Aabb>,
    pub interactive: Option<Interactive>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: NodeId,
    pub distance: f32,
}

/// A picked interactive object: the tagged ancestor and the hit that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick<'a> {
    pub node: NodeId,
    pub distance: f32,
    pub interactive: &'a Interactive,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Add a node without geometry. Unknown parents are treated as root.
    pub fn add_group(&mut self, parent: Option<NodeId>, offset: Vec3) -> NodeId {
        let parent = parent.filter(|p| (p.0 as usize) < self.nodes.len());
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode { parent, offset, bounds: None, interactive: None });
        id
    }

    pub fn add_box(&mut self, parent: Option<NodeId>, offset: Vec3, bounds: Aabb) -> NodeId {
        let id = self.add_group(parent, offset);
        self.nodes[id.0 as usize].bounds = Some(bounds);
        id
    }

    /// Attach the interactive marker and descriptor to a node.
    pub fn tag(&mut self, id: NodeId, interactive: Interactive) -> bool {
        match self.nodes.get_mut(id.0 as usize) {
            Some(node) => {
                node.interactive = Some(interactive);
                true
            }
            None => false,
        }
    }

    pub fn set_offset(&mut self, id: NodeId, offset: Vec3) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.offset = offset;
        }
    }

    pub fn world_offset(&self, id: NodeId) -> Vec3 {
        self.ancestors(id)
            .filter_map(|a| self.node(a))
            .fold(Vec3::ZERO, |acc, n| acc + n.offset)
    }

    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let bounds = self.node(id)?.bounds?;
        Some(bounds.translated(self.world_offset(id)))
    }

    /// Every tagged node with its payload, in insertion order.
    pub fn interactives(&self) -> impl Iterator<Item = (NodeId, &Interactive)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| Some((NodeId(i as u32), n.interactive.as_ref()?)))
    }

    /// The node itself followed by each parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.node(id).map(|_| id);
        let mut guard = self.nodes.len();
        std::iter::from_fn(move || {
            let current = next?;
            // Guards against a malformed parent cycle
            guard = guard.checked_sub(1)?;
            next = self.node(current).and_then(|n| n.parent);
            Some(current)
        })
    }

    /// All nodes with geometry hit by the ray within `max_distance`, nearest first.
    pub fn intersect(&self, ray: &Ray, max_distance: f32) -> Vec<Hit> {
        let mut hits: Vec<Hit> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter_map(|id| {
                let distance = self.world_bounds(id)?.intersect(ray)?;
                (distance <= max_distance).then_some(Hit { node: id, distance })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest hit whose ancestor chain carries an interactive tag.
    /// Untagged geometry in front of it does not block the pick.
    pub fn pick(&self, ray: &Ray, max_distance: f32) -> Option<Pick<'_>> {
        self.intersect(ray, max_distance).into_iter().find_map(|hit| {
            self.ancestors(hit.node).find_map(|a| {
                let interactive = self.node(a)?.interactive.as_ref()?;
                Some(Pick { node: a, distance: hit.distance, interactive })
            })
        })
    }
}

/// Node handles the frame loop needs to keep in sync.
#[derive(Debug, Clone, Copy)]
pub struct ExpoNodes {
    pub cabin: NodeId,
}

const ARCH_HALF: Vec3 = Vec3::new(3.0, 2.5, 2.0);

impl SceneGraph {
    /// Pickable mirror of the default hall: booth arches with their signs,
    /// floor and mezzanine slabs, and the elevator cabin with its buttons.
    pub fn expo(layout: &HallLayout) -> (Self, ExpoNodes) {
        let mut scene = Self::new();

        let hall = scene.add_group(None, Vec3::ZERO);
        let ground = layout.boundaries.first().copied();
        if let Some(b) = ground {
            scene.add_box(
                Some(hall),
                Vec3::ZERO,
                Aabb::new(Vec3::new(b.x_min, -0.05, b.z_min), Vec3::new(b.x_max, 0.0, b.z_max)),
            );
        }
        for m in &layout.mezzanines {
            if let Some(h) = layout.floor_height(m.floor) {
                let f = m.footprint;
                scene.add_box(
                    Some(hall),
                    Vec3::ZERO,
                    Aabb::new(Vec3::new(f.x_min, h - 0.1, f.z_min), Vec3::new(f.x_max, h, f.z_max)),
                );
            }
        }

        for booth in &layout.booths {
            let (s, c) = booth.facing.sin_cos();
            let half = Vec3::new(
                c.abs() * ARCH_HALF.x + s.abs() * ARCH_HALF.z,
                ARCH_HALF.y,
                s.abs() * ARCH_HALF.x + c.abs() * ARCH_HALF.z,
            );

            let root = scene.add_group(Some(hall), booth.position);
            scene.tag(
                root,
                Interactive {
                    descriptor: Descriptor {
                        id: booth.id,
                        name: booth.name.clone(),
                        color: booth.color.clone(),
                        position: booth.position,
                    },
                    action: InteractAction::ShowDetails,
                },
            );
            // Arch
            scene.add_box(Some(root), Vec3::ZERO, Aabb::from_center(Vec3::new(0.0, half.y, 0.0), half));
            // Floating sign above the arch
            scene.add_box(
                Some(root),
                Vec3::new(0.0, 5.6, 0.0),
                Aabb::from_center(Vec3::ZERO, Vec3::new(half.x * 0.8, 0.4, half.z * 0.8)),
            );
        }

        let e = &layout.elevator;
        let cabin = scene.add_group(Some(hall), e.center);
        // Back glass, side walls, ceiling
        scene.add_box(Some(cabin), Vec3::ZERO, Aabb::new(Vec3::new(-1.25, 0.0, -1.3), Vec3::new(1.25, 2.5, -1.2)));
        scene.add_box(Some(cabin), Vec3::ZERO, Aabb::new(Vec3::new(-1.3, 0.0, -1.25), Vec3::new(-1.2, 2.5, 1.25)));
        scene.add_box(Some(cabin), Vec3::ZERO, Aabb::new(Vec3::new(1.2, 0.0, -1.25), Vec3::new(1.3, 2.5, 1.25)));
        scene.add_box(Some(cabin), Vec3::ZERO, Aabb::new(Vec3::new(-1.25, 2.5, -1.25), Vec3::new(1.25, 2.55, 1.25)));

        let panel = scene.add_group(Some(cabin), Vec3::new(1.17, 1.4, 0.5));
        for floor in 0..layout.floor_heights.len() {
            let label = if floor == 0 { "G".to_string() } else { floor.to_string() };
            let local = Vec3::new(0.0, -0.15 * floor as f32, 0.0);
            let button = scene.add_box(
                Some(panel),
                local,
                Aabb::from_center(Vec3::ZERO, Vec3::new(0.02, 0.06, 0.06)),
            );
            scene.tag(
                button,
                Interactive {
                    descriptor: Descriptor {
                        id: 1000 + floor as u32,
                        name: format!("Elevator {label}"),
                        color: "#333333".to_string(),
                        position: e.center + Vec3::new(1.17, 1.4, 0.5) + local,
                    },
                    action: InteractAction::CallElevator(floor),
                },
            );
        }

        (scene, ExpoNodes { cabin })
    }
}
