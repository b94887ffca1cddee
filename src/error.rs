//! Top-level error for the console wiring and the command line.

use crate::clients::TransportError;
use crate::config::ConfigError;
use crate::framework::FrameworkError;
use crate::geometry::GeometryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Framework(#[from] FrameworkError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Usage(String),
}
