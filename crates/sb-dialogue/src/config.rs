use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DialogueError, DialogueResult};

/// Inclusive bounds applied to reputation scores after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationBounds {
    /// Lowest allowed score.
    pub min: i64,
    /// Highest allowed score.
    pub max: i64,
}

impl ReputationBounds {
    /// Clamp a score into the bounds. Inverted bounds resolve to `max`.
    pub fn clamp(&self, value: i64) -> i64 {
        value.max(self.min).min(self.max)
    }
}

/// Engine behavior that varies between games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Gold never drops below this through `take_gold`.
    pub gold_floor: i64,
    /// Clamp reputation into these bounds. Unbounded when `None`.
    pub reputation_bounds: Option<ReputationBounds>,
    /// Reject trees with unrecognized conditions or effects at registration.
    pub strict_content: bool,
    /// Stage given to quests started without an explicit stage.
    pub default_quest_stage: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gold_floor: 0,
            reputation_bounds: None,
            strict_content: false,
            default_quest_stage: "started".to_string(),
        }
    }
}

impl EngineConfig {
    /// Set the gold floor.
    pub fn with_gold_floor(mut self, floor: i64) -> Self {
        self.gold_floor = floor;
        self
    }

    /// Clamp reputation into `min..=max`.
    pub fn with_reputation_bounds(mut self, min: i64, max: i64) -> Self {
        self.reputation_bounds = Some(ReputationBounds { min, max });
        self
    }

    /// Reject trees with unrecognized content at registration.
    pub fn with_strict_content(mut self, strict: bool) -> Self {
        self.strict_content = strict;
        self
    }

    /// Set the stage name used by `start_quest` when content gives none.
    pub fn with_default_quest_stage(mut self, stage: impl Into<String>) -> Self {
        self.default_quest_stage = stage.into();
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> DialogueResult<()> {
        if let Some(bounds) = &self.reputation_bounds
            && bounds.min > bounds.max
        {
            return Err(DialogueError::Config(format!(
                "reputation bounds are inverted: min {} > max {}",
                bounds.min, bounds.max
            )));
        }
        if self.default_quest_stage.trim().is_empty() {
            return Err(DialogueError::Config(
                "default quest stage must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> DialogueResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| DialogueError::Json {
            origin: "engine config".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DialogueResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DialogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| DialogueError::Json {
            origin: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.gold_floor, 0);
        assert_eq!(config.reputation_bounds, None);
        assert!(!config.strict_content);
        assert_eq!(config.default_quest_stage, "started");
    }

    #[test]
    fn config_builder_chain() {
        let config = EngineConfig::default()
            .with_gold_floor(-50)
            .with_reputation_bounds(-100, 100)
            .with_strict_content(true)
            .with_default_quest_stage("rumored");
        assert_eq!(config.gold_floor, -50);
        assert_eq!(config.reputation_bounds.map(|b| b.clamp(250)), Some(100));
        assert!(config.strict_content);
        assert_eq!(config.default_quest_stage, "rumored");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "goldFloor": 10 }"#).unwrap();
        assert_eq!(config.gold_floor, 10);
        assert_eq!(config.default_quest_stage, "started");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "reputationBounds": { "min": 5, "max": -5 } }"#)
            .unwrap_err();
        assert!(matches!(err, DialogueError::Config(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = EngineConfig::from_json_str("{ goldFloor: }").unwrap_err();
        assert!(err.to_string().contains("engine config"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "strictContent": true }"#).unwrap();
        let config = EngineConfig::from_json_file(&path).unwrap();
        assert!(config.strict_content);

        let missing = EngineConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, DialogueError::Io { .. }));
    }
}
