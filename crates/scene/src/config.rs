use questwalk_anim::AnimationConfig;
use questwalk_camera::CameraConfig;
use questwalk_motion::MotionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::throttle::ThrottleConfig;

/// Errors from loading scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Everything tunable about a scene. Missing keys take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Avatar model to load. `None` uses the placeholder avatar.
    pub avatar_url: Option<String>,
    pub motion: MotionConfig,
    pub animation: AnimationConfig,
    pub camera: CameraConfig,
    pub throttle: ThrottleConfig,
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&data)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}
