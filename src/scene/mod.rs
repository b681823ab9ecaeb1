pub mod color;
pub mod node;
pub mod pose;
pub mod serialization;

use glam::{EulerRot, Quat, Vec3};
use node::{Node, Transform};
use pose::{BoneTransform, PoseState};

/// Stable identity of a placed object. Never reused within an editor session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One placed object and the node it exclusively owns.
#[derive(Debug, Clone)]
pub struct SceneObjectRecord {
    pub id: ObjectId,
    /// Shape catalog key or model path. Fixed at creation.
    pub source_type: String,
    pub node: Node,
    /// Normalization scale applied by the factory or loader.
    pub base_scale: f32,
    /// User-facing scale factor; the authoritative value.
    pub relative_scale: f32,
    /// Height above the ground-touching position.
    pub vertical_offset: f32,
    pub is_poseable: bool,
    /// Bone transforms captured at load time. Never mutated afterwards.
    pub initial_bone_state: Option<Vec<BoneTransform>>,
    /// Empty means the default pose.
    pub applied_pose_name: String,
}

impl SceneObjectRecord {
    pub fn new(id: ObjectId, source_type: impl Into<String>, node: Node, base_scale: f32) -> Self {
        Self {
            id,
            source_type: source_type.into(),
            node,
            base_scale,
            relative_scale: 1.0,
            vertical_offset: 0.0,
            is_poseable: false,
            initial_bone_state: None,
            applied_pose_name: String::new(),
        }
    }

    pub fn actual_scale(&self) -> f32 {
        self.base_scale * self.relative_scale
    }

    pub fn pose_state(&self) -> PoseState {
        PoseState::from_applied_name(&self.applied_pose_name)
    }

    /// Poseable with a captured default pose to fall back to.
    pub fn can_pose(&self) -> bool {
        self.is_poseable && self.initial_bone_state.is_some()
    }

    /// Set relative scale, write `base * relative` to the node and re-ground it.
    pub fn set_relative_scale(&mut self, relative_scale: f32) {
        self.relative_scale = relative_scale;
        self.node.transform.scale = Vec3::splat(self.actual_scale());
        self.reground();
    }

    pub fn set_vertical_offset(&mut self, vertical_offset: f32) {
        self.vertical_offset = vertical_offset;
        self.reground();
    }

    /// Recompute Y from the current ground offset and the vertical offset.
    pub fn reground(&mut self) {
        self.node.transform.translation.y = ground_offset(&self.node) + self.vertical_offset;
    }

    /// Vertical offset implied by the node's current Y.
    pub fn derived_vertical_offset(&self) -> f32 {
        self.node.transform.translation.y - ground_offset(&self.node)
    }
}

/// Lift that puts the node's lowest point on y = 0, for its current rotation and scale.
pub fn ground_offset(node: &Node) -> f32 {
    let placed = Transform {
        translation: Vec3::ZERO,
        ..node.transform
    };
    let bounds = node.bounds_with_root(&placed);
    if bounds.is_empty() {
        0.0
    } else {
        -bounds.min.y
    }
}

/// Compose slider angles (degrees, X/Y/Z) in intrinsic yaw, pitch, roll order.
pub fn orientation_from_degrees(degrees: [f32; 3]) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees[1].to_radians(),
        degrees[0].to_radians(),
        degrees[2].to_radians(),
    )
}

/// Inverse of [`orientation_from_degrees`].
pub fn degrees_from_orientation(orientation: Quat) -> [f32; 3] {
    let (yaw, pitch, roll) = orientation.to_euler(EulerRot::YXZ);
    [pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees()]
}
