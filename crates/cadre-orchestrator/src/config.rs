//! TOML configuration file support for the orchestration engine.

use crate::analysis::Complexity;
use crate::evaluation::{DEFAULT_CORRECTION_THRESHOLD, DEFAULT_MAX_ITERATIONS};
use crate::registry::{CapabilityProfile, CapabilityRegistry, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::routing::{DEFAULT_FALLBACK_AGENT, MatchStrategy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Engine-wide settings from the `[engine]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Matching strategy: "lexical" or "semantic".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Agent routed to when nothing matches.
    #[serde(default = "default_fallback_agent")]
    pub fallback_agent: String,

    /// Overall evaluation score required to stop correcting (0 to 10).
    #[serde(default = "default_correction_threshold")]
    pub correction_threshold: f64,

    /// Cap on correction iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Timeout in milliseconds for each external call (optional).
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,

    /// Whether execution continues past an optional step's failure.
    #[serde(default = "default_continue_on_failure")]
    pub continue_on_failure: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            fallback_agent: default_fallback_agent(),
            correction_threshold: default_correction_threshold(),
            max_iterations: default_max_iterations(),
            call_timeout_ms: None,
            continue_on_failure: default_continue_on_failure(),
        }
    }
}

fn default_strategy() -> String {
    "lexical".to_string()
}

fn default_fallback_agent() -> String {
    DEFAULT_FALLBACK_AGENT.to_string()
}

fn default_correction_threshold() -> f64 {
    DEFAULT_CORRECTION_THRESHOLD
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_continue_on_failure() -> bool {
    true
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

/// One `[[profiles]]` entry. Order in the file is registry order.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    /// Agent identifier.
    pub id: String,

    /// Free-text capability description.
    #[serde(default)]
    pub description: String,

    /// Keywords for lexical matching.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Precomputed profile embedding (optional).
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    /// Routing confidence this profile expects before standing alone.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Supported complexity levels; empty means unrestricted.
    #[serde(default)]
    pub complexity_levels: Vec<String>,
}

/// Engine configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Engine-wide settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Capability profiles, in declaration order.
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

impl EngineConfig {
    /// Parsed matching strategy. Meaningful after validation; an unknown
    /// string falls back to lexical.
    #[must_use]
    pub fn strategy(&self) -> MatchStrategy {
        MatchStrategy::from_str(&self.engine.strategy).unwrap_or(MatchStrategy::Lexical)
    }

    /// The configured external-call timeout, if any.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.engine.call_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration loader for engine settings and capability profiles.
pub struct EngineConfigLoader;

impl EngineConfigLoader {
    /// Loads engine configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<EngineConfig> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validates engine configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` describing the first problem found.
    pub fn validate(config: &EngineConfig) -> Result<()> {
        if MatchStrategy::from_str(&config.engine.strategy).is_none() {
            return Err(ConfigError::Validation(format!(
                "Invalid strategy: {}. Valid options: lexical, semantic",
                config.engine.strategy
            )));
        }

        if config.engine.fallback_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Fallback agent id must not be empty".to_string(),
            ));
        }

        let threshold = config.engine.correction_threshold;
        if !(0.0..=10.0).contains(&threshold) {
            return Err(ConfigError::Validation(format!(
                "Invalid correction threshold: {threshold}. Must be between 0.0 and 10.0"
            )));
        }

        for (idx, profile) in config.profiles.iter().enumerate() {
            if profile.id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Profile {idx}: id must not be empty"
                )));
            }

            if config.profiles[..idx].iter().any(|other| other.id == profile.id) {
                return Err(ConfigError::Validation(format!(
                    "Profile {idx}: duplicate id '{}'",
                    profile.id
                )));
            }

            if !(0.0..=1.0).contains(&profile.confidence_threshold) {
                return Err(ConfigError::Validation(format!(
                    "Profile '{}': confidence threshold {} must be between 0.0 and 1.0",
                    profile.id, profile.confidence_threshold
                )));
            }

            for level in &profile.complexity_levels {
                if Complexity::from_str(level).is_none() {
                    return Err(ConfigError::Validation(format!(
                        "Profile '{}': invalid complexity level '{level}'. Valid options: low, medium, high",
                        profile.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Builds a capability registry from the `[[profiles]]` entries,
    /// preserving declaration order.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` for entries the registry rejects.
    pub fn build_registry(config: &EngineConfig) -> Result<CapabilityRegistry> {
        let mut profiles = Vec::with_capacity(config.profiles.len());
        for entry in &config.profiles {
            let levels = entry
                .complexity_levels
                .iter()
                .map(|level| {
                    Complexity::from_str(level).ok_or_else(|| {
                        ConfigError::Validation(format!(
                            "Profile '{}': invalid complexity level '{level}'",
                            entry.id
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut profile = CapabilityProfile::new(&entry.id, &entry.description)
                .with_keywords(entry.keywords.clone())
                .with_confidence_threshold(entry.confidence_threshold)
                .with_complexity_levels(levels);
            if let Some(embedding) = &entry.embedding {
                profile = profile.with_embedding(embedding.clone());
            }
            profiles.push(profile);
        }

        CapabilityRegistry::from_profiles(profiles)
            .map_err(|error| ConfigError::Validation(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[engine]
strategy = "semantic"
fallback_agent = "catch_all"
correction_threshold = 6.5
max_iterations = 2
call_timeout_ms = 5000
continue_on_failure = false

[[profiles]]
id = "project_manager"
description = "Plans and manages projects"
keywords = ["project", "timeline", "budget"]
confidence_threshold = 0.6
complexity_levels = ["medium", "high"]

[[profiles]]
id = "evaluator"
description = "Scores artifacts"
keywords = ["evaluate", "review"]
"#
        )
        .unwrap();

        let config = EngineConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.strategy(), MatchStrategy::Semantic);
        assert_eq!(config.engine.fallback_agent, "catch_all");
        assert!((config.engine.correction_threshold - 6.5).abs() < f64::EPSILON);
        assert_eq!(config.engine.max_iterations, 2);
        assert_eq!(config.call_timeout(), Some(Duration::from_millis(5000)));
        assert!(!config.engine.continue_on_failure);
        assert_eq!(config.profiles.len(), 2);

        let registry = EngineConfigLoader::build_registry(&config).unwrap();
        assert_eq!(registry.ids(), ["project_manager", "evaluator"]);
        let profile = registry.get("project_manager").unwrap();
        assert_eq!(profile.keywords, ["project", "timeline", "budget"]);
        assert!((profile.confidence_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(profile.complexity_levels, [Complexity::Medium, Complexity::High]);
    }

    #[test]
    fn test_defaults_applied_without_engine_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[profiles]]
id = "general"
description = "Handles anything"
"#
        )
        .unwrap();

        let config = EngineConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.strategy(), MatchStrategy::Lexical);
        assert_eq!(config.engine.fallback_agent, DEFAULT_FALLBACK_AGENT);
        assert!(
            (config.engine.correction_threshold - DEFAULT_CORRECTION_THRESHOLD).abs()
                < f64::EPSILON
        );
        assert_eq!(config.engine.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(config.call_timeout().is_none());
        assert!(config.engine.continue_on_failure);

        let registry = EngineConfigLoader::build_registry(&config).unwrap();
        let profile = registry.get("general").unwrap();
        assert!((profile.confidence_threshold - DEFAULT_CONFIDENCE_THRESHOLD).abs()
            < f64::EPSILON);
        assert!(profile.complexity_levels.is_empty());
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let config = EngineConfig {
            engine: EngineSettings { strategy: "fuzzy".to_string(), ..EngineSettings::default() },
            profiles: Vec::new(),
        };
        assert!(matches!(
            EngineConfigLoader::validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_profile_ids_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[profiles]]
id = "twin"

[[profiles]]
id = "twin"
"#
        )
        .unwrap();

        assert!(matches!(
            EngineConfigLoader::load(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_complexity_level_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[profiles]]
id = "picky"
complexity_levels = ["extreme"]
"#
        )
        .unwrap();

        assert!(matches!(
            EngineConfigLoader::load(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_out_of_range_thresholds_rejected() {
        let config = EngineConfig {
            engine: EngineSettings {
                correction_threshold: 15.0,
                ..EngineSettings::default()
            },
            profiles: Vec::new(),
        };
        assert!(EngineConfigLoader::validate(&config).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[profiles]]
id = "overconfident"
confidence_threshold = 1.5
"#
        )
        .unwrap();
        assert!(EngineConfigLoader::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfigLoader::load(Path::new("/nonexistent/cadre.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
