use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Agent not found: {0}")]
    AgentNotFound(crate::core::types::AgentId),

    #[error("Invalid world dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Tile out of bounds: ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
