use crate::runtime::config::ArgError;
use probe_core::{ConfigError, StatsError};
use probe_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    #[error(transparent)]
    Args(#[from] ArgError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("acquisition stopped: {0}")]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("acquisition thread panicked")]
    LoopPanicked,
}
