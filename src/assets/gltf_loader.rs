use super::{normalized_scale, AssetError, LoadedModel, ModelLoader, ModelSource};
use crate::scene::color::Color;
use crate::scene::node::{Aabb, Geometry, Material, Mesh, Node, NodeKind, Skin, Transform};
use futures::future::{FutureExt, LocalBoxFuture};
use glam::{Mat4, Quat, Vec3};
use std::collections::HashSet;
use std::path::PathBuf;

/// Loads `.glb`/`.gltf` documents with the `gltf` crate.
///
/// Only the document JSON is used: mesh bounds come from accessor min/max,
/// so buffers are never decoded.
#[derive(Debug, Clone)]
pub struct GltfModelLoader {
    asset_root: PathBuf,
}

impl GltfModelLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full_path = self.asset_root.join(path);
        std::fs::read(&full_path).map_err(|source| AssetError::Read {
            path: full_path.display().to_string(),
            source,
        })
    }

    pub fn parse(label: &str, bytes: &[u8], target_height: f32) -> Result<LoadedModel, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::ParseGltf {
            path: label.to_string(),
            source,
        })?;
        let document = &gltf.document;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| AssetError::EmptyScene {
                path: label.to_string(),
            })?;

        let joints: HashSet<usize> = document
            .skins()
            .flat_map(|skin| skin.joints().map(|joint| joint.index()).collect::<Vec<_>>())
            .collect();

        let mut root = Node::group(label);
        for node in scene.nodes() {
            root.add_child(convert_node(&node, &joints));
        }

        let base_scale = normalized_scale(&root, target_height);
        root.transform.scale = Vec3::splat(base_scale);
        root.update_world_matrix(Mat4::IDENTITY);
        if root.has_skin() {
            root.refresh_skins();
        }
        let bones = root.bone_names();

        log::info!(
            "Loaded model {} (scale {:.3}, {} bones, {} materials)",
            label,
            base_scale,
            bones.len(),
            root.materials().len()
        );
        Ok(LoadedModel {
            node: root,
            base_scale,
            bones,
        })
    }
}

impl ModelLoader for GltfModelLoader {
    fn load<'a>(
        &'a self,
        source: &'a ModelSource,
        target_height: f32,
    ) -> LocalBoxFuture<'a, Result<LoadedModel, AssetError>> {
        async move {
            match source {
                ModelSource::Path(path) => {
                    let bytes = self.read(path)?;
                    Self::parse(path, &bytes, target_height)
                }
                ModelSource::Bytes { label, data } => Self::parse(label, data, target_height),
            }
        }
        .boxed_local()
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn convert_node(node: &gltf::Node<'_>, joints: &HashSet<usize>) -> Node {
    let name = node_name(node);
    let mut out = if joints.contains(&node.index()) {
        Node::bone(name)
    } else if let Some(mesh) = node.mesh() {
        let mut bounds = Aabb::EMPTY;
        let mut materials = Vec::new();
        for primitive in mesh.primitives() {
            let bbox = primitive.bounding_box();
            bounds = bounds.union(&Aabb::new(
                Vec3::from_array(bbox.min),
                Vec3::from_array(bbox.max),
            ));
            materials.push(convert_material(&primitive.material()));
        }
        let skin = node
            .skin()
            .map(|skin| Skin::new(skin.joints().map(|joint| node_name(&joint)).collect()));
        let mut mesh_node = Node::group(name.clone());
        mesh_node.kind = NodeKind::Mesh(Mesh {
            geometry: Geometry::new(mesh.name().unwrap_or(&name), bounds),
            materials,
            skin,
        });
        mesh_node
    } else {
        Node::group(name)
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    out.transform = Transform {
        translation: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
    };
    for child in node.children() {
        out.add_child(convert_node(&child, joints));
    }
    out
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let mut out = Material::standard(
        Color::new(r, g, b),
        pbr.roughness_factor(),
        pbr.metallic_factor(),
    );
    out.name = material.name().unwrap_or("default").to_string();
    out.map = pbr
        .base_color_texture()
        .map(|info| format!("texture_{}", info.texture().index()));
    out
}
