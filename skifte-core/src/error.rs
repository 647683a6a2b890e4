use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Topology rejected: {0}")]
    Topology(String),

    #[error("Unknown host id: {0}")]
    UnknownHost(usize),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
