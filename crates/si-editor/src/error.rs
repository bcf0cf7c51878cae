//! Error types for inspector actions.
//!
//! None of these are fatal: the action dispatcher reports them through the
//! notifier and the tick loop carries on.

use si_core::SceneError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("No serializer.")]
    NoSerializer,

    #[error(
        "No objects were selected, so export could not be created. Can only export objects that are in the World composite."
    )]
    EmptySelection,

    #[error("File not supported, .json or .txt JSON files only")]
    UnsupportedFile(String),

    #[error("Could not import {0}: the file does not contain a composite")]
    ParseFailed(String),

    #[error("{0}")]
    InvalidMove(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

impl InspectorError {
    /// Whether the user should be told about this error, as opposed to it
    /// only being logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, InspectorError::Scene(SceneError::UnknownObject(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use si_core::ObjectId;

    #[test]
    fn messages_match_user_text() {
        assert_eq!(InspectorError::NoSerializer.to_string(), "No serializer.");
        assert_eq!(
            InspectorError::UnsupportedFile("data.csv".into()).to_string(),
            "File not supported, .json or .txt JSON files only"
        );
        assert!(
            InspectorError::EmptySelection
                .to_string()
                .starts_with("No objects were selected")
        );
    }

    #[test]
    fn scene_errors_convert() {
        let err: InspectorError = SceneError::Cycle(ObjectId::composite(3)).into();
        assert!(matches!(err, InspectorError::Scene(SceneError::Cycle(_))));
        assert!(err.is_user_facing());
        let stale: InspectorError = SceneError::UnknownObject(ObjectId::body(1)).into();
        assert!(!stale.is_user_facing());
    }
}
