//! Skeletal pose snapshots and the per-model pose library.

use super::node::Node;
use crate::store::{KeyValueStore, StoreError};
use glam::{Mat4, Quat, Vec3};
use std::collections::BTreeMap;

/// Local transform of one named bone.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoneTransform {
    pub name: String,
    pub position: [f32; 3],
    pub quaternion: [f32; 4],
    pub scale: [f32; 3],
}

/// Which pose a poseable record currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseState {
    Default,
    Named(String),
}

impl PoseState {
    pub fn from_applied_name(name: &str) -> Self {
        if name.is_empty() {
            Self::Default
        } else {
            Self::Named(name.to_string())
        }
    }
}

/// Outcome of applying a list of bone transforms to a node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoseReport {
    pub applied: usize,
    pub not_found: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("pose '{name}' not found for {model}")]
    NotFound { model: String, name: String },
    #[error("pose '{name}' for {model} is malformed: {source}")]
    Malformed {
        model: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("pose library for {model} is unreadable: {source}")]
    Library {
        model: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("pose name must not be empty")]
    EmptyName,
    #[error("selected object is not poseable")]
    NotPoseable,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Snapshot the local transform of every bone, in traversal order.
pub fn capture_bone_state(node: &Node) -> Vec<BoneTransform> {
    let mut bones = Vec::new();
    node.visit(&mut |child| {
        if child.is_bone() {
            bones.push(BoneTransform {
                name: child.name.clone(),
                position: child.transform.translation.to_array(),
                quaternion: child.transform.rotation.to_array(),
                scale: child.transform.scale.to_array(),
            });
        }
    });
    bones
}

/// Apply transforms to bones by exact name, one entry at a time. Each entry
/// goes to the first bone of that name; later duplicates win. Unmatched
/// entries are counted, never fatal. World matrices and skin bindings are
/// refreshed afterwards.
pub fn apply_bone_transforms(node: &mut Node, bones: &[BoneTransform]) -> PoseReport {
    let mut report = PoseReport::default();
    for bone in bones {
        let mut found = false;
        node.visit_mut(&mut |child| {
            if found || !child.is_bone() || child.name != bone.name {
                return;
            }
            child.transform.translation = Vec3::from_array(bone.position);
            child.transform.rotation = Quat::from_array(bone.quaternion);
            child.transform.scale = Vec3::from_array(bone.scale);
            found = true;
        });
        if found {
            report.applied += 1;
        } else {
            report.not_found += 1;
        }
    }

    node.update_world_matrix(Mat4::IDENTITY);
    if node.has_skin() {
        node.refresh_skins();
    }
    report
}

/// Named poses stored for one model path.
///
/// Entries stay as raw JSON until looked up so that one malformed pose
/// does not hide the others.
#[derive(Debug, Default, Clone)]
pub struct PoseLibrary {
    model: String,
    poses: BTreeMap<String, serde_json::Value>,
}

impl PoseLibrary {
    pub fn storage_key(prefix: &str, model: &str) -> String {
        format!("{prefix}{model}")
    }

    pub fn load(store: &dyn KeyValueStore, prefix: &str, model: &str) -> Result<Self, PoseError> {
        let key = Self::storage_key(prefix, model);
        let Some(json) = store.get(&key)? else {
            return Ok(Self {
                model: model.to_string(),
                poses: BTreeMap::new(),
            });
        };
        let poses = serde_json::from_str(&json).map_err(|source| PoseError::Library {
            model: model.to_string(),
            source,
        })?;
        Ok(Self {
            model: model.to_string(),
            poses,
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.poses.keys().cloned().collect()
    }

    pub fn lookup(&self, name: &str) -> Result<Vec<BoneTransform>, PoseError> {
        let value = self.poses.get(name).ok_or_else(|| PoseError::NotFound {
            model: self.model.clone(),
            name: name.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|source| PoseError::Malformed {
            model: self.model.clone(),
            name: name.to_string(),
            source,
        })
    }

    pub fn insert(&mut self, name: &str, bones: &[BoneTransform]) -> Result<(), PoseError> {
        if name.trim().is_empty() {
            return Err(PoseError::EmptyName);
        }
        let value = serde_json::to_value(bones).map_err(|source| PoseError::Malformed {
            model: self.model.clone(),
            name: name.to_string(),
            source,
        })?;
        self.poses.insert(name.to_string(), value);
        Ok(())
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, prefix: &str) -> Result<(), PoseError> {
        let json = serde_json::to_string(&self.poses).map_err(|source| PoseError::Library {
            model: self.model.clone(),
            source,
        })?;
        store.set(&Self::storage_key(prefix, &self.model), &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn rig() -> Node {
        Node::group("rig").with_child(
            Node::bone("hip").with_child(Node::bone("spine").with_child(Node::bone("head"))),
        )
    }

    fn bone(name: &str, y: f32) -> BoneTransform {
        BoneTransform {
            name: name.to_string(),
            position: [0.0, y, 0.0],
            quaternion: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn test_capture_lists_bones_in_traversal_order() {
        let names: Vec<String> = capture_bone_state(&rig())
            .into_iter()
            .map(|bone| bone.name)
            .collect();
        assert_eq!(names, vec!["hip", "spine", "head"]);
    }

    #[test]
    fn test_partial_pose_leaves_other_bones_untouched() {
        let mut node = rig();
        let report = apply_bone_transforms(&mut node, &[bone("hip", 1.0), bone("spine", 0.5)]);
        assert_eq!(report, PoseReport { applied: 2, not_found: 0 });
        assert_eq!(node.find("hip").unwrap().transform.translation.y, 1.0);
        assert_eq!(node.find("head").unwrap().transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_unknown_bones_are_counted() {
        let mut node = rig();
        let report = apply_bone_transforms(&mut node, &[bone("hip", 1.0), bone("tail", 2.0)]);
        assert_eq!(report, PoseReport { applied: 1, not_found: 1 });
    }

    #[test]
    fn test_duplicate_entries_are_counted_individually() {
        let mut node = rig();
        let report = apply_bone_transforms(
            &mut node,
            &[bone("hip", 0.4), bone("hip", 0.6), bone("tail", 1.0), bone("tail", 2.0)],
        );
        assert_eq!(report, PoseReport { applied: 2, not_found: 2 });
        assert_eq!(node.find("hip").unwrap().transform.translation.y, 0.6);
    }

    #[test]
    fn test_library_reports_missing_and_malformed_poses() {
        let mut store = MemoryStore::new();
        store
            .set(
                "poses:models/a.glb",
                r#"{"wave":[{"name":"hip","position":[0,1,0],"quaternion":[0,0,0,1],"scale":[1,1,1]}],"broken":{"hip":1}}"#,
            )
            .unwrap();
        let library = PoseLibrary::load(&store, "poses:", "models/a.glb").unwrap();
        assert_eq!(library.names(), vec!["broken", "wave"]);
        assert_eq!(library.lookup("wave").unwrap().len(), 1);
        assert!(matches!(library.lookup("broken"), Err(PoseError::Malformed { .. })));
        assert!(matches!(library.lookup("sit"), Err(PoseError::NotFound { .. })));
    }

    #[test]
    fn test_library_insert_rejects_empty_names_and_persists() {
        let mut store = MemoryStore::new();
        let mut library = PoseLibrary::load(&store, "poses:", "models/a.glb").unwrap();
        assert!(matches!(library.insert("  ", &[]), Err(PoseError::EmptyName)));

        library.insert("stand", &[bone("hip", 0.0)]).unwrap();
        library.save(&mut store, "poses:").unwrap();
        let reloaded = PoseLibrary::load(&store, "poses:", "models/a.glb").unwrap();
        assert_eq!(reloaded.lookup("stand").unwrap(), vec![bone("hip", 0.0)]);
    }
}
