//! Procedural shape catalog.
//!
//! Every catalog key resolves once to a `ShapeKind`; unknown keys resolve to
//! `ShapeKind::Fallback`, which builds a sphere. Builders never share geometry
//! or material state: each mesh asks the material closure for a fresh clone.

use crate::scene::node::{Aabb, Geometry, Material, Node, Transform};
use glam::{Quat, Vec3};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Cube,
    Cylinder,
    Torus,
    Cone,
    Pyramid,
    Capsule,
    Dodecahedron,
    Icosahedron,
    Octahedron,
    Tetrahedron,
    TallBox,
    FlatBox,
    SquashedSphere,
    HalfSphere,
    StackedCubes,
    Snowman,
    SphereOnCube,
    ThreeSpheresLine,
    SimplePerson,
    BasicRobot,
    TableChair,
    Dumbbell,
    SimpleTree,
    Mushroom,
    SaturnLike,
    Fallback,
}

impl ShapeKind {
    pub const CATALOG: &'static [ShapeKind] = &[
        ShapeKind::Sphere,
        ShapeKind::Cube,
        ShapeKind::Cylinder,
        ShapeKind::Torus,
        ShapeKind::Cone,
        ShapeKind::Pyramid,
        ShapeKind::Capsule,
        ShapeKind::Dodecahedron,
        ShapeKind::Icosahedron,
        ShapeKind::Octahedron,
        ShapeKind::Tetrahedron,
        ShapeKind::TallBox,
        ShapeKind::FlatBox,
        ShapeKind::SquashedSphere,
        ShapeKind::HalfSphere,
        ShapeKind::StackedCubes,
        ShapeKind::Snowman,
        ShapeKind::SphereOnCube,
        ShapeKind::ThreeSpheresLine,
        ShapeKind::SimplePerson,
        ShapeKind::BasicRobot,
        ShapeKind::TableChair,
        ShapeKind::Dumbbell,
        ShapeKind::SimpleTree,
        ShapeKind::Mushroom,
        ShapeKind::SaturnLike,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cube => "cube",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Torus => "torus",
            ShapeKind::Cone => "cone",
            ShapeKind::Pyramid => "pyramid",
            ShapeKind::Capsule => "capsule",
            ShapeKind::Dodecahedron => "dodecahedron",
            ShapeKind::Icosahedron => "icosahedron",
            ShapeKind::Octahedron => "octahedron",
            ShapeKind::Tetrahedron => "tetrahedron",
            ShapeKind::TallBox => "tall_box",
            ShapeKind::FlatBox => "flat_box",
            ShapeKind::SquashedSphere => "squashed_sphere",
            ShapeKind::HalfSphere => "half_sphere",
            ShapeKind::StackedCubes => "stacked_cubes",
            ShapeKind::Snowman => "snowman",
            ShapeKind::SphereOnCube => "sphere_on_cube",
            ShapeKind::ThreeSpheresLine => "three_spheres_line",
            ShapeKind::SimplePerson => "simple_person",
            ShapeKind::BasicRobot => "basic_robot",
            ShapeKind::TableChair => "table_chair",
            ShapeKind::Dumbbell => "dumbbell",
            ShapeKind::SimpleTree => "simple_tree",
            ShapeKind::Mushroom => "mushroom",
            ShapeKind::SaturnLike => "saturn_like",
            ShapeKind::Fallback => "fallback",
        }
    }

    /// Single primitives: catalog keys without an underscore.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, ShapeKind::Fallback) && !self.key().contains('_')
    }

    pub fn build(&self, s: f32, material: &mut dyn FnMut() -> Material) -> Node {
        let name = self.key();
        match self {
            ShapeKind::Sphere | ShapeKind::Fallback => sphere(name, s * 0.5, material()),
            ShapeKind::Cube => cuboid(name, Vec3::splat(s), material()),
            ShapeKind::Cylinder => upright(name, s * 0.4, s, material()),
            ShapeKind::Torus => solid(
                name,
                Vec3::new(s * 0.65, s * 0.65, s * 0.15),
                material(),
            ),
            ShapeKind::Cone | ShapeKind::Pyramid => upright(name, s * 0.5, s, material()),
            ShapeKind::Capsule => upright(name, s * 0.3, s * 1.2, material()),
            ShapeKind::Dodecahedron
            | ShapeKind::Icosahedron
            | ShapeKind::Octahedron
            | ShapeKind::Tetrahedron => sphere(name, s * 0.5, material()),
            ShapeKind::TallBox => cuboid(name, Vec3::new(s * 0.5, s * 2.0, s * 0.5), material()),
            ShapeKind::FlatBox => cuboid(name, Vec3::new(s * 1.5, s * 0.25, s * 1.5), material()),
            ShapeKind::SquashedSphere => Node::group(name).with_child(
                sphere("body", s * 0.5, material()).with_transform(Transform {
                    scale: Vec3::new(1.0, 0.5, 1.0),
                    ..Transform::default()
                }),
            ),
            ShapeKind::HalfSphere => dome(name, s * 0.5, material()),
            ShapeKind::StackedCubes => Node::group(name)
                .with_child(cuboid("base", Vec3::splat(s), material()).at(Vec3::ZERO))
                .with_child(
                    cuboid("middle", Vec3::splat(s * 0.75), material())
                        .at(Vec3::new(0.0, s * 0.875, 0.0)),
                )
                .with_child(
                    cuboid("top", Vec3::splat(s * 0.5), material())
                        .at(Vec3::new(0.0, s * 1.5, 0.0)),
                ),
            ShapeKind::Snowman => Node::group(name)
                .with_child(sphere("base", s * 0.5, material()))
                .with_child(sphere("body", s * 0.35, material()).at(Vec3::new(0.0, s * 0.75, 0.0)))
                .with_child(sphere("head", s * 0.25, material()).at(Vec3::new(0.0, s * 1.3, 0.0))),
            ShapeKind::SphereOnCube => Node::group(name)
                .with_child(cuboid("cube", Vec3::splat(s), material()))
                .with_child(sphere("sphere", s * 0.4, material()).at(Vec3::new(0.0, s * 0.9, 0.0))),
            ShapeKind::ThreeSpheresLine => {
                let mut group = Node::group(name);
                for (index, x) in [-1.0_f32, 0.0, 1.0].iter().enumerate() {
                    group.add_child(
                        sphere(format!("sphere_{index}"), s * 0.3, material())
                            .at(Vec3::new(x * s * 0.7, 0.0, 0.0)),
                    );
                }
                group
            }
            ShapeKind::SimplePerson => person(name, s, material),
            ShapeKind::BasicRobot => Node::group(name)
                .with_child(cuboid("torso", Vec3::new(s * 0.8, s, s * 0.5), material()))
                .with_child(
                    cuboid("head", Vec3::splat(s * 0.45), material())
                        .at(Vec3::new(0.0, s * 0.75, 0.0)),
                )
                .with_child(
                    cuboid("leg_left", Vec3::new(s * 0.25, s * 0.7, s * 0.25), material())
                        .at(Vec3::new(-s * 0.2, -s * 0.85, 0.0)),
                )
                .with_child(
                    cuboid("leg_right", Vec3::new(s * 0.25, s * 0.7, s * 0.25), material())
                        .at(Vec3::new(s * 0.2, -s * 0.85, 0.0)),
                ),
            ShapeKind::TableChair => Node::group(name)
                .with_child(
                    cuboid("table_top", Vec3::new(s * 1.2, s * 0.08, s * 0.8), material())
                        .at(Vec3::new(0.0, s * 0.7, 0.0)),
                )
                .with_child(
                    cuboid("table_leg", Vec3::new(s * 0.1, s * 0.7, s * 0.1), material())
                        .at(Vec3::new(0.0, s * 0.35, 0.0)),
                )
                .with_child(
                    cuboid("chair_seat", Vec3::new(s * 0.45, s * 0.06, s * 0.45), material())
                        .at(Vec3::new(s * 0.9, s * 0.4, 0.0)),
                )
                .with_child(
                    cuboid("chair_back", Vec3::new(s * 0.06, s * 0.5, s * 0.45), material())
                        .at(Vec3::new(s * 1.1, s * 0.65, 0.0)),
                ),
            ShapeKind::Dumbbell => Node::group(name)
                .with_child(
                    upright("bar", s * 0.06, s * 1.2, material()).with_transform(Transform {
                        rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                        ..Transform::default()
                    }),
                )
                .with_child(sphere("weight_left", s * 0.25, material()).at(Vec3::new(-s * 0.6, 0.0, 0.0)))
                .with_child(sphere("weight_right", s * 0.25, material()).at(Vec3::new(s * 0.6, 0.0, 0.0))),
            ShapeKind::SimpleTree => Node::group(name)
                .with_child(upright("trunk", s * 0.12, s * 0.8, material()))
                .with_child(upright("crown", s * 0.5, s * 1.2, material()).at(Vec3::new(0.0, s, 0.0))),
            ShapeKind::Mushroom => Node::group(name)
                .with_child(upright("stem", s * 0.15, s * 0.6, material()))
                .with_child(dome("cap", s * 0.45, material()).at(Vec3::new(0.0, s * 0.3, 0.0))),
            ShapeKind::SaturnLike => Node::group(name)
                .with_child(sphere("planet", s * 0.5, material()))
                .with_child(
                    solid("ring", Vec3::new(s * 0.9, s * 0.9, s * 0.05), material()).with_transform(
                        Transform {
                            rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2 + 0.3),
                            ..Transform::default()
                        },
                    ),
                ),
        }
    }
}

/// Catalog key lookup, built once.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    by_key: HashMap<&'static str, ShapeKind>,
}

/// A catalog request: the resolved kind plus the `wireframe_` prefix flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeRequest {
    pub kind: ShapeKind,
    pub wireframe: bool,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    pub fn new() -> Self {
        let by_key = ShapeKind::CATALOG
            .iter()
            .map(|kind| (kind.key(), *kind))
            .collect();
        Self { by_key }
    }

    pub fn resolve(&self, key: &str) -> ShapeRequest {
        let (base, wireframe) = match key.strip_prefix("wireframe_") {
            Some(base) => (base, true),
            None => (key, false),
        };
        let kind = self
            .by_key
            .get(base)
            .copied()
            .unwrap_or(ShapeKind::Fallback);
        ShapeRequest { kind, wireframe }
    }

    pub fn keys(&self) -> Vec<&'static str> {
        ShapeKind::CATALOG.iter().map(|kind| kind.key()).collect()
    }

    pub fn primitive_keys(&self) -> Vec<&'static str> {
        ShapeKind::CATALOG
            .iter()
            .filter(|kind| kind.is_primitive())
            .map(|kind| kind.key())
            .collect()
    }

    /// Build the node for a request. Fresh geometry per call, one material clone per mesh.
    pub fn build(
        &self,
        request: ShapeRequest,
        size: f32,
        material: &mut dyn FnMut() -> Material,
    ) -> Node {
        let mut node = request.kind.build(size, material);
        if request.wireframe {
            for material in node.materials_mut() {
                material.wireframe = true;
            }
        }
        node
    }
}

fn solid(name: impl Into<String>, size: Vec3, material: Material) -> Node {
    let name = name.into();
    Node::mesh(
        name.clone(),
        Geometry::new(name, Aabb::from_half_extents(Vec3::ZERO, size * 0.5)),
        material,
    )
}

fn cuboid(name: impl Into<String>, size: Vec3, material: Material) -> Node {
    solid(name, size, material)
}

fn sphere(name: impl Into<String>, radius: f32, material: Material) -> Node {
    solid(name, Vec3::splat(radius * 2.0), material)
}

fn upright(name: impl Into<String>, radius: f32, height: f32, material: Material) -> Node {
    solid(name, Vec3::new(radius * 2.0, height, radius * 2.0), material)
}

fn dome(name: impl Into<String>, radius: f32, material: Material) -> Node {
    let name = name.into();
    Node::mesh(
        name.clone(),
        Geometry::new(
            name,
            Aabb::new(Vec3::new(-radius, 0.0, -radius), Vec3::new(radius, radius, radius)),
        ),
        material,
    )
}

fn person(name: &str, s: f32, material: &mut dyn FnMut() -> Material) -> Node {
    let limb = Vec3::new(s * 0.15, s * 0.6, s * 0.15);
    Node::group(name)
        .with_child(cuboid("torso", Vec3::new(s * 0.5, s * 0.7, s * 0.25), material()).at(Vec3::new(0.0, s * 0.95, 0.0)))
        .with_child(sphere("head", s * 0.18, material()).at(Vec3::new(0.0, s * 1.5, 0.0)))
        .with_child(cuboid("arm_left", limb, material()).at(Vec3::new(-s * 0.35, s * 0.95, 0.0)))
        .with_child(cuboid("arm_right", limb, material()).at(Vec3::new(s * 0.35, s * 0.95, 0.0)))
        .with_child(cuboid("leg_left", limb, material()).at(Vec3::new(-s * 0.12, s * 0.3, 0.0)))
        .with_child(cuboid("leg_right", limb, material()).at(Vec3::new(s * 0.12, s * 0.3, 0.0)))
}
