//! Renderable scene-graph nodes.
//!
//! A `Node` tree is what the shape factory and the model loaders produce and
//! what a `SceneObjectRecord` exclusively owns. The viewport only ever sees
//! borrowed nodes; it never keeps or destroys them.

use super::color::Color;
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Layer every node is created on.
pub const DEFAULT_LAYER: u32 = 1 << 0;
/// Layer tested by click picking.
pub const INTERACTION_LAYER: u32 = 1 << 1;

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_half_extents(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut out = Self::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point3(corner);
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }

    /// Slab test. Returns the entry distance along `direction`, or `None` on a miss.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-9 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Lit PBR material: color, roughness, metalness.
    Standard,
    /// Unlit flat color.
    Basic,
    /// Debug normal shading, no color input.
    Normal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    /// Base-color texture, if any. Textured materials keep their color.
    pub map: Option<String>,
    pub wireframe: bool,
    disposed: bool,
}

impl Material {
    pub fn standard(color: Color, roughness: f32, metalness: f32) -> Self {
        Self {
            name: "standard".to_string(),
            kind: MaterialKind::Standard,
            color,
            roughness,
            metalness,
            map: None,
            wireframe: false,
            disposed: false,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self {
            name: "basic".to_string(),
            kind: MaterialKind::Basic,
            color,
            roughness: 1.0,
            metalness: 0.0,
            map: None,
            wireframe: false,
            disposed: false,
        }
    }

    pub fn normal() -> Self {
        Self {
            name: "normal".to_string(),
            kind: MaterialKind::Normal,
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            map: None,
            wireframe: false,
            disposed: false,
        }
    }

    pub fn supports_color(&self) -> bool {
        !matches!(self.kind, MaterialKind::Normal)
    }

    pub fn supports_surface_finish(&self) -> bool {
        matches!(self.kind, MaterialKind::Standard)
    }

    /// Colorable and untextured: the flat-color controls may write to it.
    pub fn accepts_flat_color(&self) -> bool {
        self.supports_color() && self.map.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub label: String,
    pub bounds: Aabb,
    disposed: bool,
}

impl Geometry {
    pub fn new(label: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            label: label.into(),
            bounds,
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Skinning binding: joint names in bind order and their current world matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    pub joints: Vec<String>,
    pub joint_matrices: Vec<Mat4>,
    revision: u64,
}

impl Skin {
    pub fn new(joints: Vec<String>) -> Self {
        let joint_matrices = vec![Mat4::IDENTITY; joints.len()];
        Self {
            joints,
            joint_matrices,
            revision: 0,
        }
    }

    /// Number of times the binding has been refreshed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn refresh(&mut self, bone_worlds: &HashMap<String, Mat4>) {
        for (joint, matrix) in self.joints.iter().zip(self.joint_matrices.iter_mut()) {
            if let Some(world) = bone_worlds.get(joint) {
                *matrix = *world;
            }
        }
        self.revision += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub materials: Vec<Material>,
    pub skin: Option<Skin>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    Bone,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisposeStats {
    pub geometries: usize,
    pub materials: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub layers: u32,
    pub children: Vec<Node>,
    world_matrix: Mat4,
}

impl Node {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            layers: DEFAULT_LAYER,
            children: Vec::new(),
            world_matrix: Mat4::IDENTITY,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::with_kind(
            name,
            NodeKind::Mesh(Mesh {
                geometry,
                materials: vec![material],
                skin: None,
            }),
        )
    }

    pub fn bone(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Bone)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn at(self, translation: Vec3) -> Self {
        self.with_transform(Transform::from_translation(translation))
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn is_bone(&self) -> bool {
        matches!(self.kind, NodeKind::Bone)
    }

    pub fn visit(&self, f: &mut dyn FnMut(&Node)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    /// Pre-order mutable traversal. `f` returns before the node's children are visited.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn materials(&self) -> Vec<&Material> {
        let mut out = Vec::new();
        collect_materials(self, &mut out);
        out
    }

    /// Every material in the subtree, collected before any is mutated.
    pub fn materials_mut(&mut self) -> Vec<&mut Material> {
        let mut out = Vec::new();
        collect_materials_mut(self, &mut out);
        out
    }

    pub fn bone_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit(&mut |node| {
            if node.is_bone() {
                names.push(node.name.clone());
            }
        });
        names
    }

    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn enable_layer(&mut self, mask: u32) {
        self.visit_mut(&mut |node| node.layers |= mask);
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// Recompute cached world matrices for this subtree.
    pub fn update_world_matrix(&mut self, parent: Mat4) {
        self.world_matrix = parent * self.transform.matrix();
        let world = self.world_matrix;
        for child in &mut self.children {
            child.update_world_matrix(world);
        }
    }

    /// World-space bounds of the subtree with this node at the scene root.
    pub fn bounds(&self) -> Aabb {
        self.bounds_with_root(&self.transform)
    }

    /// Bounds computed as if this node carried `root` instead of its own transform.
    pub fn bounds_with_root(&self, root: &Transform) -> Aabb {
        let mut out = Aabb::EMPTY;
        accumulate_bounds(self, root.matrix(), &mut out);
        out
    }

    /// Nearest hit of the ray against meshes on `mask`, in world units.
    pub fn ray_distance(&self, origin: Vec3, direction: Vec3, mask: u32) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        ray_walk(
            self,
            self.transform.matrix(),
            origin,
            direction,
            mask,
            &mut nearest,
        );
        nearest
    }

    /// Rebind every skinned mesh to the current bone world matrices.
    /// Returns the number of skins refreshed.
    pub fn refresh_skins(&mut self) -> usize {
        let mut bone_worlds = HashMap::new();
        self.visit(&mut |node| {
            if node.is_bone() {
                bone_worlds.insert(node.name.clone(), node.world_matrix);
            }
        });
        let mut refreshed = 0;
        self.visit_mut(&mut |node| {
            if let NodeKind::Mesh(Mesh {
                skin: Some(skin), ..
            }) = &mut node.kind
            {
                skin.refresh(&bone_worlds);
                refreshed += 1;
            }
        });
        refreshed
    }

    pub fn has_skin(&self) -> bool {
        let mut found = false;
        self.visit(&mut |node| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                found |= mesh.skin.is_some();
            }
        });
        found
    }

    /// Release geometry and material resources of every mesh in the subtree.
    pub fn dispose(&mut self) -> DisposeStats {
        let mut stats = DisposeStats::default();
        self.visit_mut(&mut |node| {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                if !mesh.geometry.is_disposed() {
                    mesh.geometry.dispose();
                    stats.geometries += 1;
                }
                for material in &mut mesh.materials {
                    if !material.is_disposed() {
                        material.dispose();
                        stats.materials += 1;
                    }
                }
            }
        });
        stats
    }
}

fn collect_materials<'a>(node: &'a Node, out: &mut Vec<&'a Material>) {
    if let NodeKind::Mesh(mesh) = &node.kind {
        out.extend(mesh.materials.iter());
    }
    for child in &node.children {
        collect_materials(child, out);
    }
}

fn collect_materials_mut<'a>(node: &'a mut Node, out: &mut Vec<&'a mut Material>) {
    let Node { kind, children, .. } = node;
    if let NodeKind::Mesh(mesh) = kind {
        out.extend(mesh.materials.iter_mut());
    }
    for child in children.iter_mut() {
        collect_materials_mut(child, out);
    }
}

fn accumulate_bounds(node: &Node, world: Mat4, out: &mut Aabb) {
    if let NodeKind::Mesh(mesh) = &node.kind {
        *out = out.union(&mesh.geometry.bounds.transformed(&world));
    }
    for child in &node.children {
        accumulate_bounds(child, world * child.transform.matrix(), out);
    }
}

fn ray_walk(
    node: &Node,
    world: Mat4,
    origin: Vec3,
    direction: Vec3,
    mask: u32,
    nearest: &mut Option<f32>,
) {
    if let NodeKind::Mesh(mesh) = &node.kind {
        if node.layers & mask != 0 {
            let bounds = mesh.geometry.bounds.transformed(&world);
            if let Some(t) = bounds.intersect_ray(origin, direction) {
                if nearest.map_or(true, |best| t < best) {
                    *nearest = Some(t);
                }
            }
        }
    }
    for child in &node.children {
        ray_walk(
            child,
            world * child.transform.matrix(),
            origin,
            direction,
            mask,
            nearest,
        );
    }
}
