use std::process::ExitStatus;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalError {
    /* mapped errors */
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /* port-open errors */
    #[error("Cannot open framebuffer {0}: {1}")]
    FramebufferOpen(Utf8PathBuf, std::io::Error),

    #[error("Cannot determine framebuffer geometry: {0}")]
    Geometry(String),

    #[error("Unsupported framebuffer pixel format: {0} bits per pixel")]
    UnsupportedPixelFormat(u32),

    #[error("Cannot start meter command {0:?}: {1}")]
    Spawn(String, std::io::Error),

    /* transfer errors */
    #[error("Short write to meter: sent {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /* protocol errors */
    #[error("Meter output ended without a measurement")]
    UnexpectedEof,

    #[error("Meter response is missing field {0}: {1:?}")]
    MissingField(usize, String),

    #[error("Invalid chromaticity ({0}, {1})")]
    InvalidChromaticity(f64, f64),

    /* collaborator exit errors */
    #[error("Meter exited with {0}")]
    MeterExit(ExitStatus),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type CalResult<T> = Result<T, CalError>;
