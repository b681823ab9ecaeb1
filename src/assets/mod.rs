pub mod gltf_loader;
pub mod shapes;

pub use gltf_loader::GltfModelLoader;
pub use shapes::{ShapeKind, ShapeRegistry, ShapeRequest};

use crate::scene::color::Color;
use crate::scene::node::{Aabb, Geometry, Material, Node, Transform};
use futures::future::LocalBoxFuture;
use glam::Vec3;

/// Height below which a model is treated as flat and left unscaled.
const MIN_NORMALIZE_HEIGHT: f32 = 0.001;

/// Where a model comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Path(String),
    Bytes { label: String, data: Vec<u8> },
}

impl ModelSource {
    pub fn label(&self) -> &str {
        match self {
            ModelSource::Path(path) => path,
            ModelSource::Bytes { label, .. } => label,
        }
    }
}

/// A model node with its normalization scale already written to the root transform.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub node: Node,
    pub base_scale: f32,
    /// Bone names in traversal order.
    pub bones: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    ParseGltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF {path} has no scene")]
    EmptyScene { path: String },
    #[error("model {path} unavailable: {reason}")]
    Unavailable { path: String, reason: String },
}

/// Asynchronous model loading. One suspension point per load; no retries.
pub trait ModelLoader {
    fn load<'a>(
        &'a self,
        source: &'a ModelSource,
        target_height: f32,
    ) -> LocalBoxFuture<'a, Result<LoadedModel, AssetError>>;
}

/// Uniform scale that brings the node's height to `target_height`.
pub fn normalized_scale(node: &Node, target_height: f32) -> f32 {
    let height = node.bounds_with_root(&Transform::default()).size().y;
    if height > MIN_NORMALIZE_HEIGHT {
        target_height / height
    } else {
        1.0
    }
}

/// Unit cube wrapped in a group, used when a model cannot be loaded.
pub fn fallback_model(material: Material) -> Node {
    Node::group("fallback").with_child(Node::mesh(
        "fallback_cube",
        Geometry::new(
            "fallback_cube",
            Aabb::from_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        ),
        material,
    ))
}

/// Baseline material for procedural shapes. Consumers only ever get clones.
#[derive(Debug, Clone)]
pub struct MaterialTemplate {
    base: Material,
}

impl Default for MaterialTemplate {
    fn default() -> Self {
        Self::new(Material::standard(Color::new(0.6, 0.6, 0.6), 0.5, 0.1))
    }
}

impl MaterialTemplate {
    pub fn new(base: Material) -> Self {
        Self { base }
    }

    pub fn instance(&self) -> Material {
        self.base.clone()
    }

    /// Clone with an HSL color applied.
    pub fn tinted(&self, hue: f32, saturation: f32, lightness: f32) -> Material {
        let mut material = self.instance();
        material.color = Color::from_hsl(hue, saturation, lightness);
        material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_scale_targets_height() {
        let node = Node::mesh(
            "tall",
            Geometry::new("tall", Aabb::new(Vec3::ZERO, Vec3::new(1.0, 6.0, 1.0))),
            Material::basic(Color::WHITE),
        );
        assert!((normalized_scale(&node, 3.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_flat_or_empty_models_keep_unit_scale() {
        let flat = Node::mesh(
            "flat",
            Geometry::new("flat", Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0))),
            Material::basic(Color::WHITE),
        );
        assert_eq!(normalized_scale(&flat, 3.0), 1.0);
        assert_eq!(normalized_scale(&Node::group("empty"), 3.0), 1.0);
    }

    #[test]
    fn test_template_is_never_aliased() {
        let template = MaterialTemplate::default();
        let mut a = template.tinted(0.1, 0.8, 0.5);
        let b = template.tinted(0.6, 0.8, 0.5);
        a.roughness = 0.9;
        assert_ne!(a.color, b.color);
        assert_eq!(template.instance().roughness, 0.5);
        assert_eq!(b.roughness, 0.5);
    }
}
