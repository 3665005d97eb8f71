//! Scene error types

use std::path::PathBuf;

use thiserror::Error;

use super::entity::{EntityHandle, EntityType};
use crate::serialization::ParseError;

/// Failures of scene and entity loading, saving and duplication
#[derive(Debug, Error)]
pub enum SceneError {
    /// Filesystem failure outside the parser
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Object-text syntax or read failure
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// File parsed but produced no usable records
    #[error("nothing loaded from {0}")]
    NothingLoaded(String),

    /// Handle does not refer to a live entity
    #[error("invalid entity {0:?}")]
    InvalidEntity(EntityHandle),

    /// Arena for the kind has no free slot
    #[error("no free slot for {0} entities")]
    CapacityExhausted(EntityType),

    /// Record type the caller cannot handle
    #[error("unexpected {0} object")]
    UnknownObject(String),
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
