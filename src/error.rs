//! Error taxonomy for fabric construction and search.

use thiserror::Error;

use crate::topology::Orientation;

pub type Result<T> = std::result::Result<T, FabricError>;

#[derive(Error, Debug)]
pub enum FabricError {
    /// A connection names a node that was never registered.
    #[error("unknown node '{node}'")]
    UnknownNode { node: String },

    /// A connection names a port the node does not declare.
    #[error("node '{node}' has no port '{port}'")]
    UnknownPort { node: String, port: String },

    /// A port appears in more than one connection, or is connected to itself.
    #[error("port {port} is already connected")]
    PortAlreadyConnected { port: String },

    /// The run would exceed the configured switch-count ceiling.
    #[error("{count} switches exceed the configured limit of {limit} (2^{count} trials)")]
    TooManySwitches { count: usize, limit: usize },

    /// Internal invariant violation: a port slot was written twice.
    #[error("port {port} already has an {orientation} link")]
    DuplicateSlot { port: String, orientation: Orientation },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FabricError {
    /// True for errors caused by user-supplied topology or settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FabricError::UnknownNode { .. }
                | FabricError::UnknownPort { .. }
                | FabricError::PortAlreadyConnected { .. }
                | FabricError::TooManySwitches { .. }
        )
    }
}
