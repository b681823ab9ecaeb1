mod camera;
pub mod pick;

pub use camera::OrbitCamera;
pub use pick::{pick_nearest, PickHit, Ray, DEFAULT_FOV_Y_DEG};

use crate::scene::color::Color;
use crate::scene::node::{Aabb, Node};
use crate::scene::serialization::HelperFlags;
use crate::scene::ObjectId;
use glam::{Quat, Vec3};
use std::collections::BTreeMap;

/// Spot light parameters pushed to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    pub intensity: f32,
    /// Cone angle in degrees.
    pub angle_deg: f32,
    pub penumbra: f32,
    pub position: Vec3,
    pub target: Vec3,
}

/// Display surface the editor drives. Nodes are borrowed, never retained.
pub trait Viewport {
    fn add_node(&mut self, id: ObjectId, node: &Node);
    fn update_node(&mut self, id: ObjectId, node: &Node);
    /// Returns false when the node was not present.
    fn remove_node(&mut self, id: ObjectId) -> bool;
    fn contains(&self, id: ObjectId) -> bool;
    fn set_focus(&mut self, focus: Vec3);
    fn set_light(&mut self, light: &LightParams);
    fn set_camera(&mut self, camera: &OrbitCamera);
    fn set_environment(&mut self, wall: Color, floor: Color);
    fn set_helpers(&mut self, helpers: HelperFlags);
}

/// What a headless viewport remembers about a displayed node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSummary {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub bounds: Aabb,
    pub materials: usize,
}

impl NodeSummary {
    fn of(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            translation: node.transform.translation,
            rotation: node.transform.rotation,
            scale: node.transform.scale,
            bounds: node.bounds(),
            materials: node.materials().len(),
        }
    }
}

/// Viewport without a display. Records the latest state it was given.
#[derive(Debug, Default, Clone)]
pub struct HeadlessViewport {
    nodes: BTreeMap<ObjectId, NodeSummary>,
    focus: Option<Vec3>,
    light: Option<LightParams>,
    camera: Option<OrbitCamera>,
    environment: Option<(Color, Color)>,
    helpers: HelperFlags,
    frames: u64,
}

impl HeadlessViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: ObjectId) -> Option<&NodeSummary> {
        self.nodes.get(&id)
    }

    pub fn node_ids(&self) -> Vec<ObjectId> {
        self.nodes.keys().copied().collect()
    }

    pub fn focus(&self) -> Option<Vec3> {
        self.focus
    }

    pub fn light(&self) -> Option<&LightParams> {
        self.light.as_ref()
    }

    pub fn camera(&self) -> Option<&OrbitCamera> {
        self.camera.as_ref()
    }

    pub fn environment(&self) -> Option<(Color, Color)> {
        self.environment
    }

    pub fn helpers(&self) -> HelperFlags {
        self.helpers
    }

    /// Number of state changes received, a stand-in for redraws.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Viewport for HeadlessViewport {
    fn add_node(&mut self, id: ObjectId, node: &Node) {
        if self.nodes.insert(id, NodeSummary::of(node)).is_some() {
            log::warn!("Viewport already held object {}; replaced", id);
        }
        self.frames += 1;
    }

    fn update_node(&mut self, id: ObjectId, node: &Node) {
        match self.nodes.get_mut(&id) {
            Some(summary) => {
                *summary = NodeSummary::of(node);
                self.frames += 1;
            }
            None => log::warn!("Viewport update for unknown object {}", id),
        }
    }

    fn remove_node(&mut self, id: ObjectId) -> bool {
        let removed = self.nodes.remove(&id).is_some();
        if removed {
            self.frames += 1;
        }
        removed
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn set_focus(&mut self, focus: Vec3) {
        self.focus = Some(focus);
        self.frames += 1;
    }

    fn set_light(&mut self, light: &LightParams) {
        self.light = Some(*light);
        self.frames += 1;
    }

    fn set_camera(&mut self, camera: &OrbitCamera) {
        self.camera = Some(*camera);
        self.frames += 1;
    }

    fn set_environment(&mut self, wall: Color, floor: Color) {
        self.environment = Some((wall, floor));
        self.frames += 1;
    }

    fn set_helpers(&mut self, helpers: HelperFlags) {
        self.helpers = helpers;
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::node::{Geometry, Material};

    #[test]
    fn test_headless_viewport_tracks_node_lifecycle() {
        let mut viewport = HeadlessViewport::new();
        let node = Node::mesh(
            "cube",
            Geometry::new("cube", Aabb::from_half_extents(Vec3::ZERO, Vec3::splat(0.5))),
            Material::basic(Color::WHITE),
        );
        viewport.add_node(ObjectId(3), &node);
        assert!(viewport.contains(ObjectId(3)));
        assert_eq!(viewport.node(ObjectId(3)).unwrap().materials, 1);

        let moved = node.clone().at(Vec3::new(1.0, 0.0, 0.0));
        viewport.update_node(ObjectId(3), &moved);
        assert_eq!(
            viewport.node(ObjectId(3)).unwrap().translation,
            Vec3::new(1.0, 0.0, 0.0)
        );

        assert!(viewport.remove_node(ObjectId(3)));
        assert!(!viewport.remove_node(ObjectId(3)));
        assert!(viewport.node_ids().is_empty());
    }

    #[test]
    fn test_updates_for_unknown_nodes_are_ignored() {
        let mut viewport = HeadlessViewport::new();
        viewport.update_node(ObjectId(9), &Node::group("ghost"));
        assert!(!viewport.contains(ObjectId(9)));
        assert_eq!(viewport.frames(), 0);
    }
}
