use super::mutation::{apply_flat_color, apply_surface_finish};
use super::{flat_color_of, SceneEditor};
use crate::render::{OrbitCamera, Viewport};
use crate::scene::node::Node;
use crate::scene::serialization::{
    CameraSnapshot, EnvironmentSnapshot, LightSnapshot, MaterialSnapshot, ObjectSnapshot,
    SceneSnapshot, SerializationError, TransformSnapshot,
};
use crate::scene::ObjectId;
use crate::store::{KeyValueStore, StoreError};
use crate::ui::{
    EnvironmentSliders, LightSliders, BRIGHTNESS_RANGE, HUE_RANGE, METALNESS_RANGE,
    ROUGHNESS_RANGE, SCALE_RANGE, VERTICAL_OFFSET_RANGE,
};
use glam::{Mat4, Quat, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("failed to encode scene: {0}")]
    Encode(#[from] SerializationError),
    #[error("failed to write scene: {0}")]
    Store(#[from] StoreError),
}

/// What `load_scene` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored { objects: usize },
    NoSavedState,
    /// The saved entry was rejected and the scene was reset to defaults.
    Reset { reason: String },
}

/// Material sliders as read from the node, `None` when nothing is adjustable.
fn material_snapshot(node: &Node) -> Option<MaterialSnapshot> {
    let flat = flat_color_of(node);
    let finish = node
        .materials()
        .into_iter()
        .find(|material| material.supports_surface_finish())
        .map(|material| (material.roughness, material.metalness));
    if flat.is_none() && finish.is_none() {
        return None;
    }
    let (roughness, metalness) = finish.unwrap_or((ROUGHNESS_RANGE.default, METALNESS_RANGE.default));
    Some(MaterialSnapshot {
        hue: flat.map_or(HUE_RANGE.default, |hsl| hsl.hue),
        brightness: flat.map_or(BRIGHTNESS_RANGE.default, |hsl| hsl.lightness),
        roughness,
        metalness,
    })
}

impl<V: Viewport, S: KeyValueStore> SceneEditor<V, S> {
    pub fn snapshot(&self) -> SceneSnapshot {
        let objects = self
            .objects
            .iter()
            .map(|record| ObjectSnapshot {
                id: record.id,
                source_type: record.source_type.clone(),
                transform: TransformSnapshot {
                    position: record.node.transform.translation.to_array(),
                    orientation: record.node.transform.rotation.to_array(),
                    relative_scale: record.relative_scale,
                    vertical_offset: record.vertical_offset,
                },
                material: material_snapshot(&record.node),
                applied_pose_name: record.applied_pose_name.clone(),
            })
            .collect();

        let light = self.ui.light;
        SceneSnapshot {
            version: self.config.snapshot_version,
            camera: CameraSnapshot {
                position: self.camera.position.to_array(),
                target: self.camera.target.to_array(),
                orientation: self.camera.orientation().to_array(),
            },
            light: LightSnapshot {
                intensity: light.intensity,
                angle: light.angle_deg,
                penumbra: light.penumbra,
                position: light.position,
            },
            environment: EnvironmentSnapshot {
                wall: self.ui.environment.wall,
                floor: self.ui.environment.floor,
            },
            objects,
            selected_id: self.selected,
            helpers: self.ui.helpers,
            ui: self.ui.flags,
        }
    }

    /// Write the snapshot to the scene storage key.
    pub fn save_scene(&mut self) -> Result<(), SaveError> {
        let result = self.write_snapshot();
        match &result {
            Ok(()) => log::info!(
                "Saved scene with {} objects to '{}'",
                self.objects.len(),
                self.config.scene_storage_key
            ),
            Err(err) => log::error!("Failed to save scene: {}", err),
        }
        result
    }

    fn write_snapshot(&mut self) -> Result<(), SaveError> {
        let json = self.snapshot().to_json()?;
        self.store.set(&self.config.scene_storage_key, &json)?;
        Ok(())
    }

    /// Replace the scene with the saved one. A rejected entry is removed and the
    /// scene is reset to defaults; the scene is never left half restored.
    pub async fn load_scene(&mut self) -> LoadOutcome {
        let key = self.config.scene_storage_key.clone();
        let json = match self.store.get(&key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No saved scene under '{}'", key);
                return LoadOutcome::NoSavedState;
            }
            Err(err) => {
                log::error!("Failed to read saved scene: {}", err);
                return self.reset_after_rejected_load(err.to_string());
            }
        };

        let snapshot = match SceneSnapshot::parse(&json, self.config.snapshot_version) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::error!("Rejecting saved scene: {}", err);
                if let Err(err) = self.store.remove(&key) {
                    log::warn!("Failed to remove rejected scene entry: {}", err);
                }
                return self.reset_after_rejected_load(err.to_string());
            }
        };

        let count = snapshot.objects.len();
        self.restore(snapshot).await;
        log::info!("Restored scene with {} objects", count);
        LoadOutcome::Restored { objects: count }
    }

    fn reset_after_rejected_load(&mut self, reason: String) -> LoadOutcome {
        self.reset_to_defaults();
        LoadOutcome::Reset { reason }
    }

    async fn restore(&mut self, snapshot: SceneSnapshot) {
        self.clear_scene();

        self.ui.environment = EnvironmentSliders {
            wall: EnvironmentSliders::clamped(snapshot.environment.wall),
            floor: EnvironmentSliders::clamped(snapshot.environment.floor),
        };
        self.ui.light = LightSliders {
            intensity: snapshot.light.intensity,
            angle_deg: snapshot.light.angle,
            penumbra: snapshot.light.penumbra,
            position: snapshot.light.position,
        }
        .clamped();
        self.ui.helpers = snapshot.helpers;
        self.ui.flags = snapshot.ui;
        self.camera = OrbitCamera::new(
            Vec3::from_array(snapshot.camera.position),
            Vec3::from_array(snapshot.camera.target),
        );
        self.push_scene_state();

        for entry in &snapshot.objects {
            self.restore_object(entry).await;
        }

        let selected = snapshot
            .selected_id
            .filter(|id| self.index_of(*id).is_some());
        self.apply_selection(selected);
    }

    async fn restore_object(&mut self, entry: &ObjectSnapshot) {
        self.next_id = self.next_id.max(entry.id.0.saturating_add(1));
        let record = if self.config.is_model_path(&entry.source_type) {
            self.build_model_record(
                entry.id,
                &entry.source_type,
                crate::assets::ModelSource::Path(entry.source_type.clone()),
            )
            .await
        } else {
            self.build_shape_record(entry.id, &entry.source_type)
        };
        let id: ObjectId = self.place(record);
        let Some(index) = self.index_of(id) else {
            return;
        };

        let record = &mut self.objects[index];
        let transform = &entry.transform;
        record.node.transform.translation.x = transform.position[0];
        record.node.transform.translation.z = transform.position[2];
        record.node.transform.rotation = Quat::from_array(transform.orientation).normalize();
        record.vertical_offset = VERTICAL_OFFSET_RANGE.clamp(transform.vertical_offset);
        record.set_relative_scale(SCALE_RANGE.clamp(transform.relative_scale));
        if let Some(material) = &entry.material {
            apply_flat_color(&mut record.node, material.hue, material.brightness);
            apply_surface_finish(&mut record.node, material.roughness, material.metalness);
        }
        record.node.update_world_matrix(Mat4::IDENTITY);

        if !entry.applied_pose_name.is_empty() {
            self.apply_pose_at(index, &entry.applied_pose_name);
        }
        let record = &self.objects[index];
        self.viewport.update_node(record.id, &record.node);
    }
}
