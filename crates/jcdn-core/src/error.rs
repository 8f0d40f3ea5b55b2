//! Error types for the playground core.

use crate::kind::SourceKind;

/// Failure of the persistent key-value backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend does not exist or is disabled (e.g. storage blocked).
    #[error("persistent storage is unavailable")]
    Unavailable,
    /// The backend rejected the operation (quota exceeded, security error, ...).
    #[error("persistent storage error: {0}")]
    Backend(String),
}

/// Failure inside a code highlighter. Always recovered by the markdown
/// renderer, which falls back to plain text.
#[derive(thiserror::Error, Debug)]
#[error("highlighting `{lang}` failed: {message}")]
pub struct HighlightError {
    pub lang: String,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PlaygroundError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bootstrap ran before the embedded document existed.
    #[error("preview document is not ready")]
    SurfaceNotReady,

    /// The preview surface rejected a mutation.
    #[error("preview surface error: {0}")]
    Surface(String),

    /// A patch addressed a node that does not exist in the content mount.
    #[error("invalid patch: {0}")]
    Patch(String),

    /// The editing widget could not be created.
    #[error("editor widget error: {0}")]
    Widget(String),

    /// No host element was found for an editor kind.
    #[error("no editor host for `{0}`")]
    MissingEditorHost(SourceKind),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = PlaygroundError> = std::result::Result<T, E>;
