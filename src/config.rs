//! Engine configuration
//!
//! Read from a JSON file. Every section and field has a default, so a
//! partial file (or `{}`) is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::ConversionOptions;
use crate::error::{Result, SpriteError};
use crate::file::LoadFlags;
use crate::history::{UndoHistory, DEFAULT_MAX_UNDO_LEVELS};

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo levels to keep.
    pub max_undo_levels: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,

    /// Quantization settings used when a dropped document has to change
    /// pixel format.
    pub conversion: ConversionOptions,

    /// Flags forwarded to the document loader.
    pub load: LoadFlags,
}

impl EngineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SpriteError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| SpriteError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| SpriteError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.history.max_undo_levels == 0 {
            return Err(SpriteError::InvalidConfig {
                reason: "history.max_undo_levels must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Empty history sized by this configuration
    pub fn new_history(&self) -> UndoHistory {
        UndoHistory::new(self.history.max_undo_levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{DitheringAlgorithm, FitCriteria};
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"conversion": {"dithering": "ordered"}}"#).unwrap();
        assert_eq!(config.conversion.dithering, DitheringAlgorithm::Ordered);
        assert_eq!(config.conversion.fit_criteria, FitCriteria::Default);
        assert_eq!(config.history.max_undo_levels, DEFAULT_MAX_UNDO_LEVELS);
        assert!(config.load.embedded_palette);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.history.max_undo_levels = 7;
        config.load.detect_sequence = false;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.new_history().max_undo_levels(), 7);
    }

    #[test]
    fn test_zero_undo_levels_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.json");
        fs::write(&path, r#"{"history": {"max_undo_levels": 0}}"#).unwrap();

        let err = EngineConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, SpriteError::FileNotFound { .. }));
    }
}
