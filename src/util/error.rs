use thiserror::Error;

/// Result type alias using [`BngError`]
pub type Result<T> = std::result::Result<T, BngError>;

/// Error type for bngref-rs operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BngError {
    /// The WGS84 position lies outside the grid's coverage envelope.
    #[error("position ({longitude}, {latitude}) is outside British National Grid coverage")]
    OutOfBounds { longitude: f64, latitude: f64 },

    /// Coordinate projection failed (WGS84 to BNG).
    #[error("projection error: {0}")]
    Projection(String),

    /// A grid reference string could not be parsed.
    #[error("invalid grid reference: {0}")]
    InvalidReference(String),

    /// The location provider could not produce a position.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// A payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The transport refused to start a send.
    #[error("transport error: {0}")]
    Transport(String),
}
