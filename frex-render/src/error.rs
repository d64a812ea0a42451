use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("out of memory allocating a {width}×{height} image")]
    OutOfMemory { width: u32, height: u32 },

    #[error("invalid color scheme: {0}")]
    InvalidPalette(String),

    #[error("invalid quantizer: {reason}")]
    InvalidQuantizer { reason: String },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Core(#[from] frex_core::CoreError),
}
