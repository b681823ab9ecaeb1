use glam::{Mat4, Quat, Vec3};

/// Closest the camera may get to its target.
const MIN_DISTANCE: f32 = 0.05;
/// Pitch limit, just short of straight up or down.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit-style camera: a position looking at a focal target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// When set, user orbit and zoom input is ignored. Programmatic retargets still apply.
    pub locked: bool,
}

impl OrbitCamera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            locked: false,
        }
    }

    /// World orientation of the camera, looking down its local -Z.
    pub fn orientation(&self) -> Quat {
        let forward = self.target - self.position;
        if forward.length_squared() < 1e-12 {
            return Quat::IDENTITY;
        }
        // Straight up or down, Y cannot be the up vector.
        let up = if forward.normalize().y.abs() > 0.999 {
            Vec3::Z * forward.y.signum()
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        rotation.normalize()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Point the camera at a new focus without moving it.
    pub fn retarget(&mut self, focus: Vec3) {
        self.target = focus;
    }

    pub fn rehome(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    /// Rotate the position around the target. Returns false when locked.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) -> bool {
        if self.locked {
            return false;
        }
        let offset = self.position - self.target;
        let distance = offset.length().max(MIN_DISTANCE);
        let (yaw, pitch) = offset_to_yaw_pitch(offset);
        let yaw = yaw + yaw_delta;
        let pitch = (pitch + pitch_delta).clamp(-MAX_PITCH, MAX_PITCH);
        self.position = self.target + yaw_pitch_to_offset(yaw, pitch) * distance;
        true
    }

    /// Scale the distance to the target. Returns false when locked.
    pub fn zoom(&mut self, factor: f32) -> bool {
        if self.locked || !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let offset = self.position - self.target;
        let distance = (offset.length() * factor).max(MIN_DISTANCE);
        self.position = self.target + offset.normalize_or_zero() * distance;
        true
    }
}

fn offset_to_yaw_pitch(offset: Vec3) -> (f32, f32) {
    let dir = offset.normalize_or_zero();
    let yaw = dir.x.atan2(dir.z);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

fn yaw_pitch_to_offset(yaw: f32, pitch: f32) -> Vec3 {
    let cos_pitch = pitch.cos();
    Vec3::new(yaw.sin() * cos_pitch, pitch.sin(), yaw.cos() * cos_pitch)
}
