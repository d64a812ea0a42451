use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid iteration limit: {0} (must be >= 1)")]
    InvalidIterMax(u32),

    #[error("invalid bail-out: {0} (must be positive and finite)")]
    InvalidBailOut(f64),

    #[error("invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("invalid dilation: {0} (must be non-zero and finite)")]
    InvalidDilation(f64),

    #[error("invalid turbulence: {reason}")]
    InvalidTurbulence { reason: String },

    #[error("unknown fractal id: {0:?}")]
    UnknownFractal(String),

    #[error("unknown distance function id: {0:?}")]
    UnknownDistanceFunction(String),
}
