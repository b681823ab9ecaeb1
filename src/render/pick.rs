//! CPU click picking.
//!
//! A click becomes a world-space ray from the orbit camera; each record's
//! meshes on the interaction layer are tested with a slab test against their
//! world-space bounds and the nearest hit wins.

use super::camera::OrbitCamera;
use crate::scene::node::INTERACTION_LAYER;
use crate::scene::{ObjectId, SceneObjectRecord};
use glam::{Vec2, Vec3};

/// Vertical field of view of the editor camera, in degrees.
pub const DEFAULT_FOV_Y_DEG: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray through normalized device coordinates (`-1..1`, +Y up).
    pub fn from_camera(camera: &OrbitCamera, ndc: Vec2, fov_y_deg: f32, aspect: f32) -> Self {
        let half_height = (fov_y_deg.to_radians() * 0.5).tan();
        let half_width = half_height * aspect;
        let local = Vec3::new(ndc.x * half_width, ndc.y * half_height, -1.0);
        Self::new(camera.position, camera.orientation() * local)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub id: ObjectId,
    pub distance: f32,
}

/// Nearest record hit by `ray`, if any.
pub fn pick_nearest(records: &[SceneObjectRecord], ray: &Ray) -> Option<PickHit> {
    records
        .iter()
        .filter_map(|record| {
            record
                .node
                .ray_distance(ray.origin, ray.direction, INTERACTION_LAYER)
                .map(|distance| PickHit {
                    id: record.id,
                    distance,
                })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
