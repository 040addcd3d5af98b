//! Error types for the provision crate

use std::io;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while resolving, reconciling, or destroying instances
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed provider reference - unrecoverable, nothing was mutated
    #[error("invalid provider reference `{reference}`: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Address absent from the state store where presence was required
    #[error("no instance recorded for address `{0}`")]
    NotFound(String),

    /// The plugin subprocess itself could not be completed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Transport ran but the plugin's operation failed; the store is
    /// untouched and still reflects the last completed state
    #[error("plugin operation `{operation}` failed for `{address}`")]
    PluginExecution {
        address: String,
        operation: String,
        #[source]
        source: TransportError,
    },

    /// IO error from the state store
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// State document could not be encoded or decoded
    #[error("state encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for provision operations
pub type Result<T> = std::result::Result<T, Error>;
