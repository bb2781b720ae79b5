//! In-memory player settings and the build info record.
//!
//! `PlayerSettings` is the engine-neutral settings surface the option steps
//! write into during the pre-build phase. The orchestrator owns one instance
//! per run; the engine collaborator receives a snapshot with the build
//! request.

use std::env;

use serde::{Deserialize, Serialize};

/// Target platform for the player build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    #[default]
    Standalone,
    Ios,
    Android,
    Webgl,
}

impl BuildTarget {
    /// Parse a target symbol as used by the `switchBuildTarget` option.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_lowercase().as_str() {
            "standalone" => Some(Self::Standalone),
            "ios" => Some(Self::Ios),
            "android" => Some(Self::Android),
            "webgl" => Some(Self::Webgl),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildTarget::Standalone => write!(f, "standalone"),
            BuildTarget::Ios => write!(f, "ios"),
            BuildTarget::Android => write!(f, "android"),
            BuildTarget::Webgl => write!(f, "webgl"),
        }
    }
}

/// Keystore configuration for signed builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSettings {
    pub keystore: String,
    pub keystore_password: String,
    pub keyalias: String,
    pub keyalias_password: String,
}

/// Engine-neutral player settings mutated by option steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub product_name: String,
    pub bundle_identifier: String,
    pub bundle_version: String,
    pub show_splash_screen: bool,
    pub show_engine_logo: bool,
    /// Active compiler defines, upper-cased
    pub defines: Vec<String>,
    pub signing: SigningSettings,
    /// Multithreaded rendering on mobile targets
    pub multithreaded_rendering: bool,
    /// Color space symbol, e.g. `gamma` or `linear`
    pub color_space: String,
}

/// Snapshot of build metadata written into the project before the player
/// build and removed afterwards, so the running game can report what it was
/// built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub build_timestamp: u64,
    pub bundle_identifier: String,
    pub bundle_version: String,
    pub build_defines: Vec<String>,
    pub project_name: String,
    pub build_job: String,
    pub source_code_version: String,
    pub build_number: i64,
}

impl BuildInfo {
    /// Assemble build info from the resolved settings plus CI metadata from
    /// the environment. Outside CI the CI fields read `N/A`.
    pub fn assemble(settings: &PlayerSettings) -> Self {
        let ci = env::var("CI").is_ok();
        let ci_var = |name: &str| {
            if ci {
                env::var(name).unwrap_or_else(|_| "CI N/A".to_string())
            } else {
                "N/A".to_string()
            }
        };

        Self {
            build_timestamp: now_epoch_secs(),
            bundle_identifier: settings.bundle_identifier.clone(),
            bundle_version: if settings.bundle_version.is_empty() {
                "N/A".to_string()
            } else {
                settings.bundle_version.clone()
            },
            build_defines: settings.defines.clone(),
            project_name: ci_var("CI_PROJECT_NAME"),
            build_job: ci_var("CI_JOB_NAME"),
            source_code_version: ci_var("CI_COMMIT_SHA"),
            build_number: env::var("BUILD_NUMBER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(-1),
        }
    }
}

fn now_epoch_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_build_target_parse_round_trip() {
        for target in [
            BuildTarget::Standalone,
            BuildTarget::Ios,
            BuildTarget::Android,
            BuildTarget::Webgl,
        ] {
            assert_eq!(BuildTarget::parse(&target.to_string()), Some(target));
        }
        assert_eq!(BuildTarget::parse("amiga"), None);
    }

    #[test]
    #[serial]
    fn test_build_info_defaults_outside_ci() {
        env::remove_var("CI");
        env::remove_var("BUILD_NUMBER");
        let settings = PlayerSettings::default();
        let info = BuildInfo::assemble(&settings);
        assert_eq!(info.project_name, "N/A");
        assert_eq!(info.bundle_version, "N/A");
        assert_eq!(info.build_number, -1);
    }

    #[test]
    #[serial]
    fn test_build_info_reads_ci_environment() {
        env::set_var("CI", "true");
        env::set_var("CI_PROJECT_NAME", "space-game");
        env::set_var("BUILD_NUMBER", "42");
        let mut settings = PlayerSettings::default();
        settings.bundle_version = "1.2.3".to_string();
        let info = BuildInfo::assemble(&settings);
        assert_eq!(info.project_name, "space-game");
        assert_eq!(info.bundle_version, "1.2.3");
        assert_eq!(info.build_number, 42);
        env::remove_var("CI");
        env::remove_var("CI_PROJECT_NAME");
        env::remove_var("BUILD_NUMBER");
    }
}
