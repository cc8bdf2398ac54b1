use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_KERNEL_ENTRY_POINT;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse pass settings RON: {0}")]
    Parse(String),
    #[error("Failed to read pass settings {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Point in the host frame where the SDF pass runs. Ordered by frame position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PassEvent {
    BeforeRenderingOpaques,
    #[default]
    AfterRenderingOpaques,
    BeforeRenderingTransparents,
    AfterRenderingTransparents,
    BeforeRenderingPostProcessing,
    AfterRendering,
}

impl PassEvent {
    /// Every event in frame order.
    pub const ALL: [PassEvent; 6] = [
        PassEvent::BeforeRenderingOpaques,
        PassEvent::AfterRenderingOpaques,
        PassEvent::BeforeRenderingTransparents,
        PassEvent::AfterRenderingTransparents,
        PassEvent::BeforeRenderingPostProcessing,
        PassEvent::AfterRendering,
    ];
}

/// Host-side knobs for the SDF pass. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSettings {
    pub label: String,
    pub pass_event: PassEvent,
    /// WGSL kernel source. `None` leaves the pass idle.
    pub kernel_path: Option<PathBuf>,
    pub kernel_entry_point: String,
    /// Composite through the additive accumulation material.
    pub accumulate: bool,
    /// Colour the frame target is cleared to before the pass runs.
    pub clear_color: [f32; 4],
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            label: "sdf-compute".into(),
            pass_event: PassEvent::default(),
            kernel_path: None,
            kernel_entry_point: DEFAULT_KERNEL_ENTRY_POINT.into(),
            accumulate: false,
            clear_color: [0.05, 0.05, 0.08, 1.0],
        }
    }
}

impl PassSettings {
    pub fn runs_at(&self, event: PassEvent) -> bool {
        self.pass_event == event
    }
}

/// Parse pass settings from a RON string.
pub fn load_settings_from_str(ron_str: &str) -> Result<PassSettings, SettingsError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| SettingsError::Parse(e.to_string()))
}

/// Read and parse a RON settings file.
pub fn load_settings_from_path(path: &Path) -> Result<PassSettings, SettingsError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = load_settings_from_str(&contents)?;
    log::info!("Loaded pass settings from {}", path.display());
    Ok(settings)
}
