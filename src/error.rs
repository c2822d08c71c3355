//! Error types for every boundary of the engine.
//!
//! Data-integrity problems inside a data load (dangling relation endpoints)
//! are recovered locally and never show up here.

use thiserror::Error;

/// Rejected identity-model mutation. The model is unchanged when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("unknown circle: {0}")]
    UnknownCircle(String),
    #[error("circle {circle} cannot be placed under {parent}: it would become its own ancestor")]
    CircleCycle { circle: String, parent: String },
    #[error("name must not be empty")]
    EmptyName,
}

/// Failure reported by a render surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("render surface is not ready")]
    NotReady,
    #[error("render surface call `{method}` failed: {message}")]
    Js { method: &'static str, message: String },
}

/// Failure of a render/sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Failure to read an identity document.
///
/// Only unparsable text is an error; a parsed document of the wrong shape
/// normalizes to an empty model instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("identity document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_both_circles() {
        let err = ModelError::CircleCycle {
            circle: "c-1".into(),
            parent: "c-2".into(),
        };
        let text = err.to_string();
        assert!(text.contains("c-1"));
        assert!(text.contains("c-2"));
    }

    #[test]
    fn test_surface_error_wraps_into_sync_error() {
        let err: SyncError = SurfaceError::NotReady.into();
        assert_eq!(err, SyncError::Surface(SurfaceError::NotReady));
        assert_eq!(err.to_string(), "render surface is not ready");
    }
}
