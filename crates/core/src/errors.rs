use thiserror::Error;

/// Failure raised by an injected collaborator (catalog, class repository,
/// rule lookup). Adapters translate their native errors into this type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("data source failure: {0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Engine-level failure. Collaborator failures pass through transparently;
/// precondition violations are hard errors reported immediately, never
/// batched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("source item identity is required")]
    MissingSourceItem,
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl EngineError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}
