use crate::scene::color::SurfaceColor;
use crate::scene::ObjectId;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found:?} does not match expected {expected}")]
    VersionMismatch { expected: u32, found: Option<u64> },
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraSnapshot {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub orientation: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightSnapshot {
    pub intensity: f32,
    /// Cone angle in degrees.
    pub angle: f32,
    pub penumbra: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentSnapshot {
    pub wall: SurfaceColor,
    pub floor: SurfaceColor,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformSnapshot {
    pub position: [f32; 3],
    pub orientation: [f32; 4],
    pub relative_scale: f32,
    #[serde(default)]
    pub vertical_offset: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialSnapshot {
    pub hue: f32,
    pub brightness: f32,
    pub roughness: f32,
    pub metalness: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub source_type: String,
    pub transform: TransformSnapshot,
    /// `None` when the object has no adjustable material.
    pub material: Option<MaterialSnapshot>,
    #[serde(default)]
    pub applied_pose_name: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HelperFlags {
    pub grid_visible: bool,
    pub axes_visible: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UiFlags {
    pub controls_collapsed: bool,
    pub camera_locked: bool,
}

/// Everything written to the scene storage slot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneSnapshot {
    pub version: u32,
    pub camera: CameraSnapshot,
    pub light: LightSnapshot,
    pub environment: EnvironmentSnapshot,
    pub objects: Vec<ObjectSnapshot>,
    pub selected_id: Option<ObjectId>,
    #[serde(default)]
    pub helpers: HelperFlags,
    #[serde(default)]
    pub ui: UiFlags,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored snapshot. The version is checked before the rest of the
    /// document is decoded, so entries from other formats are rejected cleanly.
    pub fn parse(json: &str, expected_version: u32) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let found = value.get("version").and_then(serde_json::Value::as_u64);
        if found != Some(u64::from(expected_version)) {
            return Err(SerializationError::VersionMismatch {
                expected: expected_version,
                found,
            });
        }
        let snapshot: SceneSnapshot = serde_json::from_value(value)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<()> {
        let mut numbers: Vec<f32> = Vec::new();
        numbers.extend(self.camera.position);
        numbers.extend(self.camera.target);
        numbers.extend(self.camera.orientation);
        numbers.extend([self.light.intensity, self.light.angle, self.light.penumbra]);
        numbers.extend(self.light.position);
        for surface in [&self.environment.wall, &self.environment.floor] {
            numbers.extend([surface.hue, surface.saturation, surface.brightness]);
        }
        if numbers.iter().any(|value| !value.is_finite()) {
            return Err(SerializationError::Invalid(
                "non-finite camera, light or environment value".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for object in &self.objects {
            if object.id == ObjectId(u64::MAX) {
                return Err(SerializationError::Invalid(format!(
                    "object id {} is out of range",
                    object.id
                )));
            }
            if !seen.insert(object.id) {
                return Err(SerializationError::Invalid(format!(
                    "duplicate object id {}",
                    object.id
                )));
            }
            validate_object(object)?;
        }
        Ok(())
    }
}

fn validate_object(object: &ObjectSnapshot) -> Result<()> {
    let transform = &object.transform;
    let mut numbers: Vec<f32> = Vec::new();
    numbers.extend(transform.position);
    numbers.extend(transform.orientation);
    numbers.extend([transform.relative_scale, transform.vertical_offset]);
    if let Some(material) = &object.material {
        numbers.extend([
            material.hue,
            material.brightness,
            material.roughness,
            material.metalness,
        ]);
    }
    if numbers.iter().any(|value| !value.is_finite()) {
        return Err(SerializationError::Invalid(format!(
            "object {} has a non-finite value",
            object.id
        )));
    }
    if transform.relative_scale <= 0.0 {
        return Err(SerializationError::Invalid(format!(
            "object {} has non-positive scale {}",
            object.id, transform.relative_scale
        )));
    }
    let length_squared: f32 = transform.orientation.iter().map(|c| c * c).sum();
    if length_squared < 1e-12 {
        return Err(SerializationError::Invalid(format!(
            "object {} has a zero-length orientation",
            object.id
        )));
    }
    if object.source_type.is_empty() {
        return Err(SerializationError::Invalid(format!(
            "object {} has no source type",
            object.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SceneSnapshot {
        SceneSnapshot {
            version: 2,
            camera: CameraSnapshot {
                position: [0.0, 6.0, 14.0],
                target: [0.0, 1.0, 0.0],
                orientation: [0.0, 0.0, 0.0, 1.0],
            },
            light: LightSnapshot {
                intensity: 1.0,
                angle: 30.0,
                penumbra: 0.2,
                position: [5.0, 10.0, 5.0],
            },
            environment: EnvironmentSnapshot {
                wall: SurfaceColor::new(0.6, 0.2, 0.15),
                floor: SurfaceColor::new(0.0, 0.0, 0.5),
            },
            objects: vec![
                ObjectSnapshot {
                    id: ObjectId(1),
                    source_type: "cube".to_string(),
                    transform: TransformSnapshot {
                        position: [1.0, 0.75, -2.0],
                        orientation: [0.0, 0.0, 0.0, 1.0],
                        relative_scale: 2.0,
                        vertical_offset: 0.0,
                    },
                    material: Some(MaterialSnapshot {
                        hue: 0.3,
                        brightness: 0.5,
                        roughness: 0.4,
                        metalness: 0.2,
                    }),
                    applied_pose_name: String::new(),
                },
                ObjectSnapshot {
                    id: ObjectId(2),
                    source_type: "models/male_base0.glb".to_string(),
                    transform: TransformSnapshot {
                        position: [0.0, 0.0, 0.0],
                        orientation: [0.0, 0.0, 0.0, 1.0],
                        relative_scale: 1.0,
                        vertical_offset: 0.0,
                    },
                    material: None,
                    applied_pose_name: "wave".to_string(),
                },
            ],
            selected_id: Some(ObjectId(2)),
            helpers: HelperFlags {
                grid_visible: true,
                axes_visible: false,
            },
            ui: UiFlags::default(),
        }
    }

    #[test]
    fn test_snapshot_survives_storage_format() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        let loaded = SceneSnapshot::parse(&json, 2).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_other_versions_are_rejected_before_decoding() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["version"] = serde_json::json!(1);
        value["objects"] = serde_json::json!("legacy single object");
        let err = SceneSnapshot::parse(&value.to_string(), 2).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::VersionMismatch { expected: 2, found: Some(1) }
        ));

        let err = SceneSnapshot::parse(r#"{"objects":[]}"#, 2).unwrap_err();
        assert!(matches!(err, SerializationError::VersionMismatch { found: None, .. }));
    }

    #[test]
    fn test_garbage_is_a_json_error() {
        assert!(matches!(
            SceneSnapshot::parse("not json", 2),
            Err(SerializationError::Json(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_fail_validation() {
        let mut snapshot = sample();
        snapshot.objects[1].id = ObjectId(1);
        assert!(matches!(
            snapshot.validate(),
            Err(SerializationError::Invalid(_))
        ));
    }

    #[test]
    fn test_max_id_fails_validation() {
        let mut snapshot = sample();
        snapshot.objects[0].id = ObjectId(u64::MAX);
        snapshot.selected_id = Some(ObjectId(u64::MAX));
        assert!(matches!(
            snapshot.validate(),
            Err(SerializationError::Invalid(_))
        ));
    }

    #[test]
    fn test_degenerate_transforms_fail_validation() {
        let mut snapshot = sample();
        snapshot.objects[0].transform.relative_scale = 0.0;
        assert!(snapshot.validate().is_err());

        let mut snapshot = sample();
        snapshot.objects[0].transform.orientation = [0.0; 4];
        assert!(snapshot.validate().is_err());

        let mut snapshot = sample();
        snapshot.light.intensity = f32::NAN;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_missing_flag_sections_default_to_off() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("helpers");
        object.remove("ui");
        let loaded = SceneSnapshot::parse(&value.to_string(), 2).unwrap();
        assert_eq!(loaded.helpers, HelperFlags::default());
        assert_eq!(loaded.ui, UiFlags::default());
    }
}
