use std::path::PathBuf;

use penumbra_core::settings::SettingsError;
use penumbra_render::PassError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("unknown scene '{0}'")]
    UnknownScene(String),

    #[error("failed to read kernel {path}: {source}")]
    KernelIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Pass(#[from] PassError),
}
