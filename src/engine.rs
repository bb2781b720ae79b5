//! Engine collaborator interface.
//!
//! The core never talks to a real engine directly. The orchestrator drives
//! this trait: settings backup before the phases, the player build call from
//! the pipeline step, and settings restore on the way out regardless of
//! outcome.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::{BuildTarget, PlayerSettings};

/// Everything the engine needs to produce a player binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub target: BuildTarget,
    /// Scene paths in build order
    pub scenes: Vec<String>,
    /// Player output path
    pub output: PathBuf,
    pub development: bool,
    pub allow_debugging: bool,
    pub server_build: bool,
    /// Resolved settings snapshot at build time
    pub settings: PlayerSettings,
}

/// Summary returned by a completed player build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub output: PathBuf,
    pub warnings: u32,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("player build failed with {errors} errors and {warnings} warnings")]
    BuildFailed { errors: u32, warnings: u32 },

    #[error("engine settings file not found: {0}")]
    SettingsMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize build manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Boundary to the engine hosting the build.
pub trait Engine {
    /// Back up mutable engine settings before the run starts.
    fn backup_settings(&mut self) -> Result<(), EngineError>;

    /// Restore the backed-up settings. Called even when the run failed.
    fn restore_settings(&mut self) -> Result<(), EngineError>;

    /// Produce the player binary.
    fn build_player(&mut self, request: &BuildRequest) -> Result<BuildReport, EngineError>;
}

/// Engine that materializes the build request as a JSON manifest next to the
/// player output path. Stands in for an engine-native build call in local
/// runs and tests; backup/restore manage a copy of the project settings file
/// when one is configured.
pub struct ManifestEngine {
    /// Project settings file to back up around the run, if any
    settings_path: Option<PathBuf>,
}

impl ManifestEngine {
    pub fn new() -> Self {
        Self { settings_path: None }
    }

    /// Guard the given settings file with a `.bak` copy around the run.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    fn backup_path(&self) -> Option<PathBuf> {
        self.settings_path.as_ref().map(|p| {
            let mut bak = p.clone().into_os_string();
            bak.push(".bak");
            PathBuf::from(bak)
        })
    }
}

impl Default for ManifestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ManifestEngine {
    fn backup_settings(&mut self) -> Result<(), EngineError> {
        let (Some(path), Some(bak)) = (self.settings_path.as_ref(), self.backup_path()) else {
            return Ok(());
        };
        if !path.exists() {
            return Err(EngineError::SettingsMissing(path.clone()));
        }
        if bak.exists() {
            fs::remove_file(&bak)?;
        }
        fs::copy(path, &bak)?;
        Ok(())
    }

    fn restore_settings(&mut self) -> Result<(), EngineError> {
        let (Some(path), Some(bak)) = (self.settings_path.as_ref(), self.backup_path()) else {
            return Ok(());
        };
        if bak.exists() {
            if path.exists() {
                fs::remove_file(path)?;
            }
            fs::rename(&bak, path)?;
        }
        Ok(())
    }

    fn build_player(&mut self, request: &BuildRequest) -> Result<BuildReport, EngineError> {
        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent)?;
        }
        let manifest = request.output.with_extension("manifest.json");
        fs::write(&manifest, serde_json::to_vec_pretty(request)?)?;
        Ok(BuildReport { output: request.output.clone(), warnings: 0 })
    }
}
