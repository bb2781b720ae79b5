//! Configuration schema types for `buildline.toml`
//!
//! Defines the structure and validation rules for buildline project
//! configuration. Most build behavior is expressed as option tokens, so the
//! config file mainly pins down the project identity, a target, and the
//! token lists applied before anything given on the command line.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::settings::BuildTarget;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Build output directory
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Engine settings file backed up and restored around a build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<PathBuf>,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("builds")
}

/// Build section: target and baseline option tokens
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildConfig {
    /// Target platform for the player build
    #[serde(default)]
    pub target: BuildTarget,
    /// Option tokens applied before any command-line tokens, in the
    /// `-name=value` form the option registry consumes
    #[serde(default)]
    pub options: Vec<String>,
}

/// Step selection section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StepsConfig {
    /// Space-separated step names to run exclusively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Space-separated step names to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

/// Complete buildline.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildlineConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
    /// Step selection
    #[serde(default)]
    pub steps: StepsConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "build.options")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buildline.toml: '{}' {}", self.field, self.message)
    }
}

impl BuildlineConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        for token in &self.build.options {
            if !token.starts_with('-') || !token.contains('=') {
                errors.push(ConfigValidationError {
                    field: "build.options".to_string(),
                    message: format!("'{}' is not of the form -name=value", token),
                });
            }
        }

        if self.steps.include.is_some() && self.steps.exclude.is_some() {
            errors.push(ConfigValidationError {
                field: "steps".to_string(),
                message: "include and exclude cannot both be set".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Expand the configuration into the option tokens it stands for.
    ///
    /// The registry applies every matching token in sequence and the last
    /// write wins, so callers append command-line tokens AFTER these and the
    /// file acts as a set of defaults. Within the file the free-form
    /// `build.options` entries come after the structured fields for the same
    /// reason.
    pub fn baseline_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        if let Some(ref include) = self.steps.include {
            tokens.push(format!("-include_steps={}", include));
        }
        if let Some(ref exclude) = self.steps.exclude {
            tokens.push(format!("-exclude_steps={}", exclude));
        }

        tokens.push(format!("-switchBuildTarget={}", self.build.target));
        tokens.push(format!("-buildDir={}", self.project.build_dir.display()));
        tokens.extend(self.build.options.iter().cloned());

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let toml = r#"
[project]
name = "my-game"
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "my-game");
        assert_eq!(config.project.build_dir, PathBuf::from("builds"));
        assert_eq!(config.build.target, BuildTarget::Standalone);
        assert!(config.build.options.is_empty());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[project]
name = "my-game"
build_dir = "out"
settings_file = "project_settings.json"

[build]
target = "android"
options = ["-productName=My Game", "-developmentBuild=true"]

[steps]
exclude = "SigningOptionsStep"
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.build_dir, PathBuf::from("out"));
        assert_eq!(
            config.project.settings_file,
            Some(PathBuf::from("project_settings.json"))
        );
        assert_eq!(config.build.target, BuildTarget::Android);
        assert_eq!(config.build.options.len(), 2);
        assert_eq!(config.steps.exclude.as_deref(), Some("SigningOptionsStep"));
    }

    #[test]
    fn test_validation_empty_name() {
        let toml = r#"
[project]
name = ""
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "project.name"));
    }

    #[test]
    fn test_validation_malformed_option_token() {
        let toml = r#"
[project]
name = "g"

[build]
options = ["productName=Missing Dash", "-ok=yes"]
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "build.options"));
    }

    #[test]
    fn test_validation_include_and_exclude_conflict() {
        let toml = r#"
[project]
name = "g"

[steps]
include = "PipelineStep"
exclude = "DefinesStep"
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "steps"));
    }

    #[test]
    fn test_baseline_tokens_order() {
        let toml = r#"
[project]
name = "g"
build_dir = "dist"

[build]
target = "webgl"
options = ["-productName=G"]

[steps]
include = "PipelineStep GeneralOptionsStep"
"#;
        let config: BuildlineConfig = toml::from_str(toml).unwrap();
        let tokens = config.baseline_tokens();
        assert_eq!(
            tokens,
            vec![
                "-include_steps=PipelineStep GeneralOptionsStep",
                "-switchBuildTarget=webgl",
                "-buildDir=dist",
                "-productName=G",
            ]
        );
    }
}
