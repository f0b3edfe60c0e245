//! Rule file parsing from YAML/JSON.

use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::schema::validate_rules_schema;
use crate::evaluator::DEFAULT_TIMEZONE;
use crate::policy::PolicyDefinition;
use crate::schedule::ScheduleDefinition;

/// Errors that can occur when loading a rule file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read rule file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rule file does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Unsupported rule file format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

/// Timezone, policy and schedule for a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionConfig {
    /// Zone the evaluated date and time belong to
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    /// Restricted last digits per weekday
    pub policy: PolicyDefinition,

    /// Restricted time windows
    pub schedule: ScheduleDefinition,
}

fn default_timezone() -> Tz {
    DEFAULT_TIMEZONE
}

impl Default for RestrictionConfig {
    /// The Quito rules: two rush-hour windows, two digits per weekday.
    fn default() -> Self {
        let policy: Vec<Vec<i64>> = vec![
            vec![],
            vec![1, 2],
            vec![3, 4],
            vec![5, 6],
            vec![7, 8],
            vec![9, 0],
            vec![],
        ];
        Self {
            timezone: DEFAULT_TIMEZONE,
            policy: policy.into(),
            schedule: vec![["07:00", "09:30"], ["16:00", "19:30"]].into(),
        }
    }
}

impl RestrictionConfig {
    /// Parse rules from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse rules from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse rules from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse rules from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse rules from a file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        debug!(path = %path.display(), "loading rule file");

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Check the document against the schema, then deserialize it.
    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_rules_schema(&value).map_err(ConfigError::SchemaError)?;
        let config: RestrictionConfig = serde_json::from_value(value)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PredictionError, RestrictionEvaluator};

    const QUITO_YAML: &str = include_str!("../../../../rules/quito.yaml");

    #[test]
    fn test_bundled_rules_match_default() {
        let config = RestrictionConfig::from_yaml(QUITO_YAML).unwrap();
        assert_eq!(config, RestrictionConfig::default());
    }

    #[test]
    fn test_parse_json_rules() {
        let json = r#"{
            "timezone": "America/Bogota",
            "policy": { "1": [0, 1], "2": [2, 3] },
            "schedule": [["06:00", "21:00"]]
        }"#;

        let config = RestrictionConfig::from_json(json).unwrap();
        assert_eq!(config.timezone, Tz::America__Bogota);

        let mut evaluator = RestrictionEvaluator::from_config(&config);
        evaluator.set_param("DATE", "2020/09/07");
        evaluator.set_param("TIME", "20:00");
        evaluator.set_param("PLATE", "ABC1231");
        assert!(evaluator.predict().unwrap().restricted);
    }

    #[test]
    fn test_timezone_defaults_when_absent() {
        let yaml = r#"
policy: [[], [1, 2]]
schedule: [["07:00", "09:30"]]
"#;
        let config = RestrictionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_missing_schedule_fails_schema() {
        let result = RestrictionConfig::from_yaml("policy: [[1]]\n");
        assert!(matches!(result, Err(ConfigError::SchemaError(_))));
    }

    #[test]
    fn test_unknown_field_fails_schema() {
        let yaml = r#"
policy: []
schedule: []
holidays: ["2020/12/25"]
"#;
        let result = RestrictionConfig::from_yaml(yaml);
        assert!(matches!(result, Err(ConfigError::SchemaError(_))));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let json = r#"{ "timezone": "Mars/Olympus_Mons", "policy": [], "schedule": [] }"#;
        let result = RestrictionConfig::from_json(json);
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_malformed_policy_loads_but_fails_prediction() {
        let yaml = r#"
policy: [[], ["one", "two"]]
schedule: [["07:00", "09:30"]]
"#;
        let config = RestrictionConfig::from_yaml(yaml).unwrap();

        let mut evaluator = RestrictionEvaluator::from_config(&config);
        evaluator.set_param("DATE", "2020/09/07");
        evaluator.set_param("TIME", "08:00");
        evaluator.set_param("PLATE", "ABC1231");
        assert!(matches!(
            evaluator.predict(),
            Err(PredictionError::InvalidPolicyDefinition { .. })
        ));
    }

    #[test]
    fn test_from_file_reads_bundled_rules() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../rules/quito.yaml");
        let config = RestrictionConfig::from_file(path).unwrap();
        assert_eq!(config.schedule, RestrictionConfig::default().schedule);
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let result = RestrictionConfig::from_file("rules.toml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = RestrictionConfig::from_file("does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
