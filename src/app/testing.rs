//! Test doubles for editor tests.

use super::SceneEditor;
use crate::assets::{normalized_scale, AssetError, LoadedModel, ModelLoader, ModelSource};
use crate::config::EditorConfig;
use crate::render::HeadlessViewport;
use crate::scene::color::Color;
use crate::scene::node::{Aabb, Geometry, Material, Mesh, Node, NodeKind, Skin};
use crate::scene::pose::{BoneTransform, PoseLibrary};
use crate::store::MemoryStore;
use futures::future::{FutureExt, LocalBoxFuture};
use glam::{Mat4, Vec3};

/// On the poseable allow-list.
pub const RIG_PATH: &str = "models/male_base0.glb";

pub type TestEditor = SceneEditor<HeadlessViewport, MemoryStore>;

/// Serves canned models by path:
/// `models/broken.glb` fails, `models/empty.glb` has no meshes,
/// any other path is a three-bone rig (`hip`, `spine`, `head`) with a skinned body.
pub struct ScriptedLoader;

impl ModelLoader for ScriptedLoader {
    fn load<'a>(
        &'a self,
        source: &'a ModelSource,
        target_height: f32,
    ) -> LocalBoxFuture<'a, Result<LoadedModel, AssetError>> {
        async move {
            let ModelSource::Path(path) = source else {
                return Err(AssetError::Unavailable {
                    path: source.label().to_string(),
                    reason: "scripted loader only serves paths".to_string(),
                });
            };
            match path.as_str() {
                "models/broken.glb" => Err(AssetError::Unavailable {
                    path: path.clone(),
                    reason: "connection reset".to_string(),
                }),
                "models/empty.glb" => Ok(loaded(Node::group("empty"), target_height)),
                _ => Ok(loaded(rig(), target_height)),
            }
        }
        .boxed_local()
    }
}

pub fn rig() -> Node {
    let mut body = Node::group("body");
    body.kind = NodeKind::Mesh(Mesh {
        geometry: Geometry::new(
            "body",
            Aabb::new(Vec3::new(-0.5, 0.0, -0.25), Vec3::new(0.5, 2.0, 0.25)),
        ),
        materials: vec![Material::standard(Color::new(0.8, 0.6, 0.5), 0.7, 0.0)],
        skin: Some(Skin::new(vec![
            "hip".to_string(),
            "spine".to_string(),
            "head".to_string(),
        ])),
    });
    Node::group("rig")
        .with_child(
            Node::bone("hip").at(Vec3::new(0.0, 1.0, 0.0)).with_child(
                Node::bone("spine")
                    .at(Vec3::new(0.0, 0.5, 0.0))
                    .with_child(Node::bone("head").at(Vec3::new(0.0, 0.5, 0.0))),
            ),
        )
        .with_child(body)
}

fn loaded(mut node: Node, target_height: f32) -> LoadedModel {
    let base_scale = normalized_scale(&node, target_height);
    node.transform.scale = Vec3::splat(base_scale);
    node.update_world_matrix(Mat4::IDENTITY);
    let bones = node.bone_names();
    LoadedModel {
        node,
        base_scale,
        bones,
    }
}

pub fn editor() -> TestEditor {
    SceneEditor::new(
        EditorConfig::default(),
        HeadlessViewport::new(),
        MemoryStore::new(),
        Box::new(ScriptedLoader),
    )
}

pub fn store_pose(store: &mut MemoryStore, model: &str, name: &str, bones: &[BoneTransform]) {
    let mut library = PoseLibrary::load(&*store, "poses:", model).unwrap();
    library.insert(name, bones).unwrap();
    library.save(store, "poses:").unwrap();
}
