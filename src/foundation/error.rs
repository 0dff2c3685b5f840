/// Convenience result type used across paperdoll.
pub type PaperdollResult<T> = Result<T, PaperdollError>;

/// Top-level error taxonomy.
///
/// Only [`PaperdollError::Config`] is meant to halt the system. The other variants are recovered
/// locally by their callers and degrade to an incomplete frame.
#[derive(thiserror::Error, Debug)]
pub enum PaperdollError {
    /// Invalid part mapping, unknown landmark index or bad overlay configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed vector source for a body part.
    #[error("decode error: {0}")]
    Decode(String),

    /// Failure reported by the pose-estimation collaborator.
    #[error("estimation error: {0}")]
    Estimation(String),

    /// Failure while rasterizing into a render surface.
    #[error("render error: {0}")]
    Render(String),

    /// Controller used in a state that does not allow the requested operation.
    #[error("session error: {0}")]
    Session(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PaperdollError {
    /// Build a [`PaperdollError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`PaperdollError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PaperdollError::Estimation`] value.
    pub fn estimation(msg: impl Into<String>) -> Self {
        Self::Estimation(msg.into())
    }

    /// Build a [`PaperdollError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PaperdollError::Session`] value.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Build a [`PaperdollError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for errors that must stop the system before any frame renders.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_json::Error> for PaperdollError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
