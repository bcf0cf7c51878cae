//! Error types for world edits and serialization.

use crate::id::ObjectId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("object not found: {0}")]
    UnknownObject(ObjectId),

    #[error("composite not found: composite_{0}")]
    UnknownComposite(u32),

    #[error("{object} is not owned by composite_{expected}")]
    NotOwned { object: ObjectId, expected: u32 },

    #[error("cannot move {0} into itself or one of its descendants")]
    Cycle(ObjectId),

    #[error("id already live: {0}")]
    IdCollision(ObjectId),

    #[error("serialization error: {0}")]
    Serialize(String),
}
