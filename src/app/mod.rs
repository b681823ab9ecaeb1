//! The scene object manager.
//!
//! `SceneEditor` owns the object list, the selection and the control-panel
//! state, and is the only thing that adds or removes viewport nodes. Handlers
//! are split by concern: `mutation` (sliders and toggles), `posing` (pose
//! library) and `persistence` (save/load).

mod mutation;
mod persistence;
mod posing;
#[cfg(test)]
mod testing;

pub use persistence::{LoadOutcome, SaveError};

use crate::assets::{
    fallback_model, LoadedModel, MaterialTemplate, ModelLoader, ModelSource, ShapeKind,
    ShapeRegistry,
};
use crate::config::EditorConfig;
use crate::render::{pick_nearest, LightParams, OrbitCamera, PickHit, Ray, Viewport, DEFAULT_FOV_Y_DEG};
use crate::scene::color::Hsl;
use crate::scene::node::{Node, INTERACTION_LAYER};
use crate::scene::pose::capture_bone_state;
use crate::scene::{degrees_from_orientation, ObjectId, SceneObjectRecord};
use crate::store::KeyValueStore;
use crate::ui::{ObjectSliders, PoseUi, UiState, BRIGHTNESS_RANGE, OBJECT_SATURATION};
use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

pub struct SceneEditor<V: Viewport, S: KeyValueStore> {
    config: EditorConfig,
    viewport: V,
    store: S,
    loader: Box<dyn ModelLoader>,
    shapes: ShapeRegistry,
    material_template: MaterialTemplate,
    objects: Vec<SceneObjectRecord>,
    selected: Option<ObjectId>,
    next_id: u64,
    camera: OrbitCamera,
    ui: UiState,
}

impl<V: Viewport, S: KeyValueStore> SceneEditor<V, S> {
    pub fn new(config: EditorConfig, viewport: V, store: S, loader: Box<dyn ModelLoader>) -> Self {
        let camera = OrbitCamera::new(
            Vec3::from_array(config.default_camera_position),
            Vec3::from_array(config.default_camera_target),
        );
        let mut editor = Self {
            config,
            viewport,
            store,
            loader,
            shapes: ShapeRegistry::new(),
            material_template: MaterialTemplate::default(),
            objects: Vec::new(),
            selected: None,
            next_id: 1,
            camera,
            ui: UiState::new(),
        };
        editor.push_scene_state();
        editor
    }

    /// Restore the saved scene, or build the default scene when nothing was restored.
    pub async fn initialize(&mut self) -> LoadOutcome {
        let outcome = self.load_scene().await;
        if outcome == LoadOutcome::NoSavedState {
            self.reset_to_defaults();
        }
        outcome
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn objects(&self) -> &[SceneObjectRecord] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObjectRecord> {
        self.objects.iter().find(|record| record.id == id)
    }

    pub fn selected_id(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&SceneObjectRecord> {
        self.selected.and_then(|id| self.object(id))
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn shape_keys(&self) -> Vec<&'static str> {
        self.shapes.keys()
    }

    /// Create an object from a catalog key or a model path and select it.
    /// Load failures degrade to a fallback node; creation itself never fails.
    pub async fn create_object(&mut self, source_type: &str) -> ObjectId {
        if !self.config.is_model_path(source_type) {
            return self.create_shape(source_type);
        }
        let id = self.allocate_id();
        let record = self
            .build_model_record(id, source_type, ModelSource::Path(source_type.to_string()))
            .await;
        self.install(record)
    }

    /// Create a model object from an in-memory blob. `label` becomes the source type.
    pub async fn create_object_from_bytes(&mut self, label: &str, data: Vec<u8>) -> ObjectId {
        let id = self.allocate_id();
        let source = ModelSource::Bytes {
            label: label.to_string(),
            data,
        };
        let record = self.build_model_record(id, label, source).await;
        self.install(record)
    }

    /// Create a procedural shape and select it. Unknown keys build the fallback sphere.
    pub fn create_shape(&mut self, key: &str) -> ObjectId {
        let id = self.allocate_id();
        let record = self.build_shape_record(id, key);
        self.install(record)
    }

    pub fn select_object(&mut self, id: Option<ObjectId>) {
        let target = id.filter(|id| self.index_of(*id).is_some());
        if target == self.selected {
            return;
        }
        if id.is_some() && target.is_none() {
            log::warn!("Cannot select unknown object {:?}; clearing selection", id);
        }
        self.apply_selection(target);
    }

    pub fn delete_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.index_of(id) else {
            log::warn!("Cannot delete unknown object {}", id);
            return false;
        };
        if self.viewport.contains(id) {
            self.viewport.remove_node(id);
        }
        let mut record = self.objects.remove(index);
        let stats = record.node.dispose();
        log::info!(
            "Deleted object {} ({}); released {} geometries, {} materials",
            id,
            record.source_type,
            stats.geometries,
            stats.materials
        );
        if self.selected == Some(id) {
            self.apply_selection(None);
        }
        true
    }

    /// Delete every object, newest first.
    pub fn clear_scene(&mut self) {
        let ids: Vec<ObjectId> = self.objects.iter().rev().map(|record| record.id).collect();
        for id in ids {
            self.delete_object(id);
        }
    }

    /// Clear the scene, restore slider defaults, randomize the surfaces,
    /// rehome the camera and create one random primitive.
    pub fn reset_to_defaults(&mut self) -> ObjectId {
        self.clear_scene();
        self.ui.reset_sliders();
        self.ui.helpers = Default::default();
        self.ui.flags = Default::default();

        let mut rng = rand::rng();
        self.ui.environment.wall.hue = rng.random_range(0.0..1.0);
        self.ui.environment.floor.hue = rng.random_range(0.0..1.0);

        self.camera.rehome(
            Vec3::from_array(self.config.default_camera_position),
            Vec3::from_array(self.config.default_camera_target),
        );
        self.push_scene_state();

        let pool = self.shapes.primitive_keys();
        let key = if pool.is_empty() {
            ShapeKind::Sphere.key()
        } else {
            pool[rng.random_range(0..pool.len())]
        };
        log::info!("Scene reset to defaults with a {}", key);
        self.create_shape(key)
    }

    /// Nearest object under the ray, on the interaction layer.
    pub fn pick(&self, ray: &Ray) -> Option<PickHit> {
        pick_nearest(&self.objects, ray)
    }

    /// Select whatever is under the ray, or clear the selection on a miss.
    pub fn select_at(&mut self, ray: &Ray) -> Option<ObjectId> {
        let hit = self.pick(ray).map(|hit| hit.id);
        self.select_object(hit);
        hit
    }

    /// Ray through a point of the view, in normalized device coordinates.
    pub fn click_ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        Ray::from_camera(&self.camera, ndc, DEFAULT_FOV_Y_DEG, aspect)
    }

    /// Next id from the counter. Once the counter is exhausted, the lowest
    /// id not in use.
    fn allocate_id(&mut self) -> ObjectId {
        if let Some(next) = self.next_id.checked_add(1) {
            let id = ObjectId(self.next_id);
            self.next_id = next;
            return id;
        }
        log::warn!("Object id counter exhausted; reusing the lowest free id");
        (1..u64::MAX)
            .map(ObjectId)
            .find(|id| self.index_of(*id).is_none())
            .unwrap_or(ObjectId(u64::MAX))
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|record| record.id == id)
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.index_of(id))
    }

    fn build_shape_record(&self, id: ObjectId, key: &str) -> SceneObjectRecord {
        let request = self.shapes.resolve(key);
        if request.kind == ShapeKind::Fallback {
            log::warn!("Unknown shape '{}'; using fallback sphere", key);
        }
        let hue: f32 = rand::random();
        let template = &self.material_template;
        let node = self.shapes.build(request, self.config.shape_size, &mut || {
            template.tinted(hue, OBJECT_SATURATION, BRIGHTNESS_RANGE.default)
        });
        SceneObjectRecord::new(id, key, node, 1.0)
    }

    async fn build_model_record(
        &self,
        id: ObjectId,
        source_type: &str,
        source: ModelSource,
    ) -> SceneObjectRecord {
        log::info!("Loading model {}", source_type);
        match self
            .loader
            .load(&source, self.config.model_target_height)
            .await
        {
            Ok(LoadedModel {
                node,
                base_scale,
                bones,
            }) => {
                let mut record = SceneObjectRecord::new(id, source_type, node, base_scale);
                record.is_poseable = !bones.is_empty() && self.config.is_poseable_model(source_type);
                if record.is_poseable {
                    record.initial_bone_state = Some(capture_bone_state(&record.node));
                }
                record
            }
            Err(err) => {
                log::warn!("Failed to load model {}: {}; using fallback cube", source_type, err);
                SceneObjectRecord::new(
                    id,
                    source_type,
                    fallback_model(self.material_template.instance()),
                    1.0,
                )
            }
        }
    }

    /// Ground the record, add it to the viewport and the list, then select it.
    fn install(&mut self, record: SceneObjectRecord) -> ObjectId {
        let id = self.place(record);
        self.select_object(Some(id));
        id
    }

    /// Like `install` without touching the selection.
    fn place(&mut self, mut record: SceneObjectRecord) -> ObjectId {
        let id = record.id;
        record.node.enable_layer(INTERACTION_LAYER);
        let relative_scale = record.relative_scale;
        record.set_relative_scale(relative_scale);
        record.node.update_world_matrix(Mat4::IDENTITY);
        self.viewport.add_node(id, &record.node);
        log::info!(
            "Created object {} from {} (base scale {:.3}, poseable {})",
            id,
            record.source_type,
            record.base_scale,
            record.is_poseable
        );
        self.objects.push(record);
        id
    }

    fn apply_selection(&mut self, target: Option<ObjectId>) {
        self.selected = target;
        match target {
            Some(id) => {
                log::debug!("Selected object {}", id);
                self.sync_sliders_from_selected();
                self.refresh_pose_ui();
            }
            None => {
                self.ui.object = ObjectSliders::default();
                self.ui.pose = PoseUi::disabled();
            }
        }
        self.retarget();
    }

    /// World-space point the light and camera aim at.
    fn focus_point(&self) -> Vec3 {
        let default_focus = Vec3::new(0.0, self.config.default_focus_height, 0.0);
        let Some(record) = self.selected() else {
            return default_focus;
        };
        let bounds = record.node.bounds();
        if !bounds.is_empty() && bounds.center().is_finite() {
            return bounds.center();
        }
        let transform = &record.node.transform;
        transform.translation + Vec3::Y * self.config.fallback_focus_offset * transform.scale.y
    }

    fn retarget(&mut self) {
        let focus = self.focus_point();
        self.camera.retarget(focus);
        self.viewport.set_focus(focus);
        self.viewport.set_camera(&self.camera);
        self.push_light();
    }

    fn push_light(&mut self) {
        let light = self.ui.light;
        self.viewport.set_light(&LightParams {
            intensity: light.intensity,
            angle_deg: light.angle_deg,
            penumbra: light.penumbra,
            position: Vec3::from_array(light.position),
            target: self.camera.target,
        });
    }

    fn push_scene_state(&mut self) {
        let environment = self.ui.environment;
        self.viewport
            .set_environment(environment.wall.to_color(), environment.floor.to_color());
        self.viewport.set_helpers(self.ui.helpers);
        self.camera.locked = self.ui.flags.camera_locked;
        self.retarget();
    }

    /// Read the selected node back into the object sliders.
    fn sync_sliders_from_selected(&mut self) {
        let Some(record) = self.selected() else {
            return;
        };
        let mut sliders = ObjectSliders::default();
        let transform = &record.node.transform;
        sliders.position_x = transform.translation.x;
        sliders.position_z = transform.translation.z;
        sliders.vertical_offset = record.derived_vertical_offset();
        sliders.rotation_deg = degrees_from_orientation(transform.rotation);
        sliders.relative_scale = if record.base_scale > 0.0 {
            transform.scale.x / record.base_scale
        } else {
            record.relative_scale
        };
        if let Some(hsl) = flat_color_of(&record.node) {
            sliders.hue = hsl.hue;
            sliders.brightness = hsl.lightness;
        }
        if let Some(material) = record
            .node
            .materials()
            .into_iter()
            .find(|material| material.supports_surface_finish())
        {
            sliders.roughness = material.roughness;
            sliders.metalness = material.metalness;
        }
        self.ui.object = sliders;
    }
}

/// HSL of the first material the flat-color controls may write to.
fn flat_color_of(node: &Node) -> Option<Hsl> {
    node.materials()
        .into_iter()
        .find(|material| material.accepts_flat_color())
        .map(|material| material.color.to_hsl())
}
