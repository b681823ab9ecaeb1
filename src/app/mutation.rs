//! Slider and toggle handlers.
//!
//! Object handlers act on the selected record only and warn when nothing is
//! selected. Every object change refreshes the viewport node and re-aims the
//! light and camera at the object.

use super::SceneEditor;
use crate::render::Viewport;
use crate::scene::color::{Color, SurfaceColor};
use crate::scene::node::Node;
use crate::scene::{orientation_from_degrees, SceneObjectRecord};
use crate::store::KeyValueStore;
use crate::ui::{
    EnvironmentSliders, LightSliders, ObjectSliders, BRIGHTNESS_RANGE, HUE_RANGE,
    METALNESS_RANGE, OBJECT_SATURATION, POSITION_RANGE, ROTATION_RANGE, ROUGHNESS_RANGE,
    SCALE_RANGE, VERTICAL_OFFSET_RANGE,
};
use glam::Mat4;

/// Write an HSL color to every colorable, untextured material.
pub(super) fn apply_flat_color(node: &mut Node, hue: f32, brightness: f32) -> usize {
    let color = Color::from_hsl(hue, OBJECT_SATURATION, brightness);
    let mut targets: Vec<_> = node
        .materials_mut()
        .into_iter()
        .filter(|material| material.accepts_flat_color())
        .collect();
    for material in targets.iter_mut() {
        material.color = color;
    }
    targets.len()
}

pub(super) fn apply_surface_finish(node: &mut Node, roughness: f32, metalness: f32) -> usize {
    let mut targets: Vec<_> = node
        .materials_mut()
        .into_iter()
        .filter(|material| material.supports_surface_finish())
        .collect();
    for material in targets.iter_mut() {
        material.roughness = roughness;
        material.metalness = metalness;
    }
    targets.len()
}

/// Write every object slider to the record: position, rotation, scale, color and finish.
pub(super) fn apply_object_sliders(record: &mut SceneObjectRecord, sliders: &ObjectSliders) {
    let transform = &mut record.node.transform;
    transform.translation.x = sliders.position_x;
    transform.translation.z = sliders.position_z;
    transform.rotation = orientation_from_degrees(sliders.rotation_deg);
    record.vertical_offset = sliders.vertical_offset;
    record.set_relative_scale(sliders.relative_scale);
    apply_flat_color(&mut record.node, sliders.hue, sliders.brightness);
    apply_surface_finish(&mut record.node, sliders.roughness, sliders.metalness);
}

impl<V: Viewport, S: KeyValueStore> SceneEditor<V, S> {
    /// Run `change` on the selected record, then refresh the viewport and focus.
    fn mutate_selected(
        &mut self,
        action: &str,
        change: impl FnOnce(&mut SceneObjectRecord),
    ) -> bool {
        let Some(index) = self.selected_index() else {
            log::warn!("Cannot {}: no object selected", action);
            return false;
        };
        let record = &mut self.objects[index];
        change(record);
        record.node.update_world_matrix(Mat4::IDENTITY);
        self.viewport.update_node(record.id, &record.node);
        self.retarget();
        true
    }

    pub fn set_position_x(&mut self, x: f32) -> bool {
        let x = POSITION_RANGE.clamp(x);
        self.ui.object.position_x = x;
        self.mutate_selected("move object", |record| {
            record.node.transform.translation.x = x;
        })
    }

    pub fn set_position_z(&mut self, z: f32) -> bool {
        let z = POSITION_RANGE.clamp(z);
        self.ui.object.position_z = z;
        self.mutate_selected("move object", |record| {
            record.node.transform.translation.z = z;
        })
    }

    pub fn set_vertical_offset(&mut self, offset: f32) -> bool {
        let offset = VERTICAL_OFFSET_RANGE.clamp(offset);
        self.ui.object.vertical_offset = offset;
        self.mutate_selected("offset object", |record| record.set_vertical_offset(offset))
    }

    /// Slider angles in degrees around X, Y, Z, composed yaw then pitch then roll.
    pub fn set_rotation(&mut self, degrees: [f32; 3]) -> bool {
        let degrees = degrees.map(|angle| ROTATION_RANGE.clamp(angle));
        self.ui.object.rotation_deg = degrees;
        self.mutate_selected("rotate object", |record| {
            record.node.transform.rotation = orientation_from_degrees(degrees);
            record.reground();
        })
    }

    pub fn set_relative_scale(&mut self, relative_scale: f32) -> bool {
        let relative_scale = SCALE_RANGE.clamp(relative_scale);
        self.ui.object.relative_scale = relative_scale;
        self.mutate_selected("scale object", |record| {
            record.set_relative_scale(relative_scale)
        })
    }

    /// Hue and lightness at fixed saturation. Textured materials keep their color.
    pub fn set_color(&mut self, hue: f32, brightness: f32) -> bool {
        let hue = HUE_RANGE.clamp(hue);
        let brightness = BRIGHTNESS_RANGE.clamp(brightness);
        self.ui.object.hue = hue;
        self.ui.object.brightness = brightness;
        self.mutate_selected("color object", |record| {
            let updated = apply_flat_color(&mut record.node, hue, brightness);
            log::debug!("Recolored {} materials on {}", updated, record.id);
        })
    }

    pub fn set_surface_finish(&mut self, roughness: f32, metalness: f32) -> bool {
        let roughness = ROUGHNESS_RANGE.clamp(roughness);
        let metalness = METALNESS_RANGE.clamp(metalness);
        self.ui.object.roughness = roughness;
        self.ui.object.metalness = metalness;
        self.mutate_selected("change material", |record| {
            apply_surface_finish(&mut record.node, roughness, metalness);
        })
    }

    /// Put the selected object's sliders back to their defaults and apply them.
    pub fn reset_object_state(&mut self) -> bool {
        let defaults = ObjectSliders::default();
        let changed = self.mutate_selected("reset object", |record| {
            apply_object_sliders(record, &defaults);
        });
        if changed {
            self.ui.object = defaults;
        }
        changed
    }

    pub fn set_wall_color(&mut self, surface: SurfaceColor) {
        self.ui.environment.wall = EnvironmentSliders::clamped(surface);
        self.push_environment();
    }

    pub fn set_floor_color(&mut self, surface: SurfaceColor) {
        self.ui.environment.floor = EnvironmentSliders::clamped(surface);
        self.push_environment();
    }

    pub fn set_light(&mut self, light: LightSliders) {
        self.ui.light = light.clamped();
        self.push_light();
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        self.ui.helpers.grid_visible = visible;
        self.viewport.set_helpers(self.ui.helpers);
    }

    pub fn set_axes_visible(&mut self, visible: bool) {
        self.ui.helpers.axes_visible = visible;
        self.viewport.set_helpers(self.ui.helpers);
    }

    pub fn set_controls_collapsed(&mut self, collapsed: bool) {
        self.ui.flags.controls_collapsed = collapsed;
    }

    pub fn set_camera_locked(&mut self, locked: bool) {
        self.ui.flags.camera_locked = locked;
        self.camera.locked = locked;
        self.viewport.set_camera(&self.camera);
    }

    /// User orbit input. Ignored while the camera is locked.
    pub fn orbit_camera(&mut self, yaw_delta: f32, pitch_delta: f32) -> bool {
        let moved = self.camera.orbit(yaw_delta, pitch_delta);
        if moved {
            self.viewport.set_camera(&self.camera);
        }
        moved
    }

    pub fn zoom_camera(&mut self, factor: f32) -> bool {
        let moved = self.camera.zoom(factor);
        if moved {
            self.viewport.set_camera(&self.camera);
        }
        moved
    }

    fn push_environment(&mut self) {
        let environment = self.ui.environment;
        self.viewport
            .set_environment(environment.wall.to_color(), environment.floor.to_color());
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{editor, RIG_PATH};
    use super::*;
    use crate::scene::node::{Aabb, Geometry, Material};
    use glam::Vec3;

    #[test]
    fn test_relative_scale_multiplies_base_scale() {
        let mut editor = editor();
        let id = editor.create_shape("cube");
        assert!(editor.set_relative_scale(2.0));
        let record = editor.object(id).unwrap();
        assert!((record.actual_scale() - 2.0).abs() < 1e-6);
        assert!((record.node.transform.scale.x - 2.0).abs() < 1e-6);
        assert!(record.node.bounds().min.y.abs() < 1e-5);
    }

    #[test]
    fn test_scale_invariant_holds_for_normalized_models() {
        let mut editor = editor();
        futures::executor::block_on(editor.create_object(RIG_PATH));
        editor.set_relative_scale(1.7);
        editor.set_rotation([10.0, 45.0, 0.0]);
        for record in editor.objects() {
            let actual = record.node.transform.scale.x;
            assert!((actual - record.base_scale * record.relative_scale).abs() < 1e-6);
        }
        assert!((editor.ui().object.relative_scale - 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_offset_lifts_above_ground() {
        let mut editor = editor();
        let id = editor.create_shape("cube");
        editor.set_vertical_offset(1.25);
        editor.set_relative_scale(0.5);
        let bounds = editor.object(id).unwrap().node.bounds();
        assert!((bounds.min.y - 1.25).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_keeps_object_grounded_and_syncs_back() {
        let mut editor = editor();
        let id = editor.create_shape("cube");
        editor.set_rotation([30.0, 20.0, 45.0]);
        assert!(editor.object(id).unwrap().node.bounds().min.y.abs() < 1e-5);

        editor.select_object(None);
        editor.select_object(Some(id));
        let synced = editor.ui().object.rotation_deg;
        for (axis, expected) in [30.0_f32, 20.0, 45.0].iter().enumerate() {
            assert!((synced[axis] - expected).abs() < 1e-2);
        }
    }

    #[test]
    fn test_handlers_without_selection_are_noops() {
        let mut editor = editor();
        assert!(!editor.set_relative_scale(2.0));
        assert!(!editor.set_color(0.2, 0.4));
        assert!(!editor.reset_object_state());
        assert!(editor.objects().is_empty());
    }

    #[test]
    fn test_flat_color_skips_textured_materials() {
        let mut textured = Material::standard(Color::new(0.1, 0.2, 0.3), 0.5, 0.0);
        textured.map = Some("texture_0".to_string());
        let mut node = Node::group("model")
            .with_child(Node::mesh(
                "plain",
                Geometry::new("plain", Aabb::from_half_extents(Vec3::ZERO, Vec3::ONE)),
                Material::standard(Color::WHITE, 0.5, 0.0),
            ))
            .with_child(Node::mesh(
                "textured",
                Geometry::new("textured", Aabb::from_half_extents(Vec3::ZERO, Vec3::ONE)),
                textured,
            ))
            .with_child(Node::mesh(
                "debug",
                Geometry::new("debug", Aabb::from_half_extents(Vec3::ZERO, Vec3::ONE)),
                Material::normal(),
            ));

        assert_eq!(apply_flat_color(&mut node, 0.3, 0.4), 1);
        let materials = node.materials();
        assert_ne!(materials[0].color, Color::WHITE);
        assert_eq!(materials[1].color, Color::new(0.1, 0.2, 0.3));

        assert_eq!(apply_surface_finish(&mut node, 0.9, 0.7), 2);
        assert_eq!(node.materials()[1].roughness, 0.9);
    }

    #[test]
    fn test_color_change_is_read_back_on_selection() {
        let mut editor = editor();
        let id = editor.create_shape("sphere");
        editor.set_color(0.25, 0.35);
        editor.set_surface_finish(0.8, 0.6);
        editor.select_object(None);
        editor.select_object(Some(id));
        let sliders = editor.ui().object;
        assert!((sliders.hue - 0.25).abs() < 1e-4);
        assert!((sliders.brightness - 0.35).abs() < 1e-4);
        assert!((sliders.roughness - 0.8).abs() < 1e-6);
        assert!((sliders.metalness - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_reset_object_state_restores_defaults() {
        let mut editor = editor();
        let id = editor.create_shape("cube");
        editor.set_relative_scale(2.5);
        editor.set_position_x(3.0);
        editor.set_rotation([0.0, 90.0, 0.0]);
        assert!(editor.reset_object_state());

        let record = editor.object(id).unwrap();
        assert_eq!(record.relative_scale, 1.0);
        assert_eq!(record.node.transform.translation.x, 0.0);
        assert!(record.node.transform.rotation.angle_between(glam::Quat::IDENTITY) < 1e-5);
        assert_eq!(editor.ui().object, ObjectSliders::default());
    }

    #[test]
    fn test_sliders_are_clamped() {
        let mut editor = editor();
        let id = editor.create_shape("cube");
        editor.set_relative_scale(50.0);
        assert_eq!(editor.object(id).unwrap().relative_scale, 3.0);
        editor.set_position_x(f32::NAN);
        assert_eq!(editor.object(id).unwrap().node.transform.translation.x, 0.0);
    }

    #[test]
    fn test_environment_light_and_toggles_reach_the_viewport() {
        let mut editor = editor();
        editor.set_wall_color(SurfaceColor::new(0.0, 1.0, 0.5));
        let (wall, _) = editor.viewport().environment().unwrap();
        assert!((wall.r - 1.0).abs() < 1e-5);

        editor.set_light(LightSliders {
            intensity: 9.0,
            angle_deg: 45.0,
            penumbra: 0.5,
            position: [1.0, 2.0, 3.0],
        });
        let light = editor.viewport().light().unwrap();
        assert_eq!(light.intensity, 5.0);
        assert_eq!(light.angle_deg, 45.0);

        editor.set_grid_visible(true);
        assert!(editor.viewport().helpers().grid_visible);
        assert!(!editor.viewport().helpers().axes_visible);
        editor.set_axes_visible(true);
        assert!(editor.viewport().helpers().axes_visible);
        assert!(editor.ui().helpers.axes_visible);
        editor.set_axes_visible(false);
        assert!(!editor.viewport().helpers().axes_visible);
        assert!(editor.viewport().helpers().grid_visible);

        editor.set_camera_locked(true);
        assert!(!editor.orbit_camera(0.5, 0.0));
        editor.set_camera_locked(false);
        assert!(editor.orbit_camera(0.5, 0.0));
    }
}
