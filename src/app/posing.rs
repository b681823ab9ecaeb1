use super::SceneEditor;
use crate::render::Viewport;
use crate::scene::pose::{apply_bone_transforms, capture_bone_state, PoseError, PoseLibrary, PoseReport};
use crate::store::KeyValueStore;
use crate::ui::PoseUi;

impl<V: Viewport, S: KeyValueStore> SceneEditor<V, S> {
    /// Pose names stored for the selected model.
    pub fn pose_names(&self) -> Vec<String> {
        self.ui.pose.options.clone()
    }

    /// Apply a stored pose to the selected object; an empty name restores the default pose.
    /// A missing or malformed pose falls back to the default pose.
    pub fn apply_pose(&mut self, name: &str) -> Option<PoseReport> {
        let Some(index) = self.selected_index() else {
            log::warn!("Cannot apply pose '{}': no object selected", name);
            return None;
        };
        let report = self.apply_pose_at(index, name)?;
        self.ui.pose.selected = self.objects[index].applied_pose_name.clone();
        self.retarget();
        Some(report)
    }

    /// Store the selected object's current bone transforms under `name`.
    pub fn capture_pose(&mut self, name: &str) -> Result<(), PoseError> {
        let result = self.store_current_pose(name.trim());
        match &result {
            Ok(()) => log::info!("Captured pose '{}'", name.trim()),
            Err(err) => log::error!("Failed to capture pose '{}': {}", name, err),
        }
        result
    }

    fn store_current_pose(&mut self, name: &str) -> Result<(), PoseError> {
        let index = self.selected_index().ok_or(PoseError::NotPoseable)?;
        let record = &self.objects[index];
        if !record.can_pose() {
            return Err(PoseError::NotPoseable);
        }
        let bones = capture_bone_state(&record.node);
        let prefix = self.config.pose_key_prefix.clone();
        let mut library = PoseLibrary::load(&self.store, &prefix, &record.source_type)?;
        library.insert(name, &bones)?;
        library.save(&mut self.store, &prefix)?;

        self.objects[index].applied_pose_name = name.to_string();
        self.refresh_pose_ui();
        Ok(())
    }

    /// Pose state machine for one record. Returns `None` when the record cannot be posed.
    pub(super) fn apply_pose_at(&mut self, index: usize, name: &str) -> Option<PoseReport> {
        let record = &self.objects[index];
        if !record.can_pose() {
            log::warn!("Object {} is not poseable", record.id);
            return None;
        }

        let stored = if name.is_empty() {
            None
        } else {
            let lookup = PoseLibrary::load(&self.store, &self.config.pose_key_prefix, &record.source_type)
                .and_then(|library| library.lookup(name));
            match lookup {
                Ok(bones) => Some(bones),
                Err(err) => {
                    log::warn!("{}; reverting {} to the default pose", err, record.id);
                    None
                }
            }
        };

        let record = &mut self.objects[index];
        let (bones, applied_name) = match stored {
            Some(bones) => (bones, name.to_string()),
            None => (
                record.initial_bone_state.clone().unwrap_or_default(),
                String::new(),
            ),
        };
        let report = apply_bone_transforms(&mut record.node, &bones);
        if report.not_found > 0 {
            log::warn!(
                "Pose '{}' on {}: {} bones applied, {} not found",
                applied_name,
                record.id,
                report.applied,
                report.not_found
            );
        } else {
            log::info!(
                "Pose '{}' on {}: {} bones applied",
                applied_name,
                record.id,
                report.applied
            );
        }
        record.applied_pose_name = applied_name;
        self.viewport.update_node(record.id, &record.node);
        Some(report)
    }

    /// Rebuild the pose selector for the current selection.
    pub(super) fn refresh_pose_ui(&mut self) {
        let Some(record) = self.selected().filter(|record| record.can_pose()) else {
            self.ui.pose = PoseUi::disabled();
            return;
        };
        let names = match PoseLibrary::load(
            &self.store,
            &self.config.pose_key_prefix,
            &record.source_type,
        ) {
            Ok(library) => library.names(),
            Err(err) => {
                log::warn!("Failed to read poses for {}: {}", record.source_type, err);
                Vec::new()
            }
        };
        let applied = record.applied_pose_name.clone();
        self.ui.pose.populate(names, &applied);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{editor, store_pose, RIG_PATH};
    use crate::scene::pose::{BoneTransform, PoseError, PoseReport, PoseState};
    use crate::store::KeyValueStore;
    use glam::Vec3;

    fn bone(name: &str, y: f32) -> BoneTransform {
        BoneTransform {
            name: name.to_string(),
            position: [0.0, y, 0.0],
            quaternion: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn test_partial_pose_touches_only_named_bones() {
        let mut editor = editor();
        store_pose(
            editor.store_mut(),
            RIG_PATH,
            "crouch",
            &[bone("hip", 0.4), bone("spine", 0.2)],
        );
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        let head_before = editor.object(id).unwrap().node.find("head").unwrap().transform;

        let report = editor.apply_pose("crouch").unwrap();
        assert_eq!(report, PoseReport { applied: 2, not_found: 0 });

        let record = editor.object(id).unwrap();
        assert_eq!(record.pose_state(), PoseState::Named("crouch".to_string()));
        assert_eq!(record.node.find("head").unwrap().transform, head_before);
        assert_eq!(
            record.node.find("hip").unwrap().transform.translation,
            Vec3::new(0.0, 0.4, 0.0)
        );
        assert_eq!(editor.ui().pose.selected, "crouch");
    }

    #[test]
    fn test_missing_pose_falls_back_to_default() {
        let mut editor = editor();
        store_pose(editor.store_mut(), RIG_PATH, "crouch", &[bone("hip", 0.4)]);
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        editor.apply_pose("crouch");
        editor.apply_pose("jump");

        let record = editor.object(id).unwrap();
        assert_eq!(record.pose_state(), PoseState::Default);
        assert_eq!(editor.ui().pose.selected, "");
        let initial = record.initial_bone_state.as_ref().unwrap();
        let hip = record.node.find("hip").unwrap().transform.translation;
        assert_eq!(hip.to_array(), initial[0].position);
    }

    #[test]
    fn test_malformed_pose_falls_back_to_default() {
        let mut editor = editor();
        editor
            .store_mut()
            .set(
                &format!("poses:{RIG_PATH}"),
                r#"{"broken":[{"name":"hip","position":"up"}]}"#,
            )
            .unwrap();
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        assert_eq!(editor.ui().pose.options, vec!["broken"]);
        let report = editor.apply_pose("broken").unwrap();
        assert_eq!(report.applied, 3);
        assert_eq!(editor.object(id).unwrap().applied_pose_name, "");
    }

    #[test]
    fn test_default_pose_is_idempotent() {
        let mut editor = editor();
        store_pose(editor.store_mut(), RIG_PATH, "wave", &[bone("spine", 0.9)]);
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        editor.apply_pose("wave");

        editor.apply_pose("");
        let first = crate::scene::pose::capture_bone_state(&editor.object(id).unwrap().node);
        editor.apply_pose("");
        let second = crate::scene::pose::capture_bone_state(&editor.object(id).unwrap().node);
        assert_eq!(first, second);
        assert_eq!(&first, editor.object(id).unwrap().initial_bone_state.as_ref().unwrap());
    }

    #[test]
    fn test_capture_stores_and_lists_the_pose() {
        let mut editor = editor();
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        assert!(matches!(editor.capture_pose("  "), Err(PoseError::EmptyName)));

        editor.capture_pose("rest").unwrap();
        assert_eq!(editor.pose_names(), vec!["rest"]);
        assert_eq!(editor.object(id).unwrap().applied_pose_name, "rest");
        assert!(editor.store().get(&format!("poses:{RIG_PATH}")).unwrap().is_some());
    }

    #[test]
    fn test_shapes_cannot_be_posed() {
        let mut editor = editor();
        editor.create_shape("cube");
        assert!(editor.apply_pose("wave").is_none());
        assert!(matches!(editor.capture_pose("wave"), Err(PoseError::NotPoseable)));
        assert!(!editor.ui().pose.enabled);
    }

    #[test]
    fn test_skins_are_refreshed_after_posing() {
        let mut editor = editor();
        store_pose(editor.store_mut(), RIG_PATH, "wave", &[bone("hip", 2.0)]);
        let id = futures::executor::block_on(editor.create_object(RIG_PATH));
        let revision = |editor: &super::super::testing::TestEditor| {
            let body = editor.object(id).unwrap().node.find("body").unwrap();
            match &body.kind {
                crate::scene::node::NodeKind::Mesh(mesh) => mesh.skin.as_ref().unwrap().revision(),
                _ => panic!("Expected skinned mesh"),
            }
        };
        let before = revision(&editor);
        editor.apply_pose("wave");
        assert_eq!(revision(&editor), before + 1);
    }
}
