use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Editor settings. Every field has a default, so a partial JSON file is valid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Store key holding the scene snapshot.
    pub scene_storage_key: String,
    /// Prefix of the per-model pose library keys.
    pub pose_key_prefix: String,
    /// Snapshots with any other version are rejected on load.
    pub snapshot_version: u32,
    pub model_extension: String,
    pub poseable_models: Vec<String>,
    /// Loaded models are normalized to this height.
    pub model_target_height: f32,
    /// Sizing parameter passed to the shape factory.
    pub shape_size: f32,
    pub default_camera_position: [f32; 3],
    pub default_camera_target: [f32; 3],
    /// Focus height used when nothing is selected.
    pub default_focus_height: f32,
    /// Upward offset used when a selected node has no bounds.
    pub fallback_focus_offset: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            scene_storage_key: "dynamicPoseExplorerState_v1".to_string(),
            pose_key_prefix: "poses:".to_string(),
            snapshot_version: 2,
            model_extension: ".glb".to_string(),
            poseable_models: vec![
                "models/game_character_base.glb".to_string(),
                "models/jumping_man.glb".to_string(),
                "models/male_base0.glb".to_string(),
                "models/male_base1.glb".to_string(),
                "models/male_base2.glb".to_string(),
            ],
            model_target_height: 3.0,
            shape_size: 1.5,
            default_camera_position: [0.0, 6.0, 14.0],
            default_camera_target: [0.0, 1.0, 0.0],
            default_focus_height: 1.0,
            fallback_focus_offset: 1.0,
        }
    }
}

impl EditorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn is_model_path(&self, source_type: &str) -> bool {
        source_type.ends_with(&self.model_extension)
    }

    /// Exact allow-list match plus the model extension check.
    pub fn is_poseable_model(&self, source_type: &str) -> bool {
        self.is_model_path(source_type)
            && self
                .poseable_models
                .iter()
                .any(|model| model == source_type)
    }
}
