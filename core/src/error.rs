/// Error types for the routing fabric
use crate::fabric::{EndpointId, RouterId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FabricError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown endpoint handle: {0}")]
    UnknownEndpoint(EndpointId),

    #[error("Unknown router handle: {0}")]
    UnknownRouter(RouterId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, FabricError>;
