pub mod config;
pub mod error;
pub mod generator;
pub mod image;
pub mod palette;
pub mod quantizer;
pub mod recycle;

pub use config::RenderConfig;
pub use error::RenderError;
pub use generator::{
    band_rows, CancelHandle, Generator, GeneratorState, ProgressListener, RenderPass,
};
pub use image::Image;
pub use palette::{
    builtin_scheme, builtin_schemes, ColorMapping, ColorScheme, Palette, TiePoint,
    GRADIENT_COLOR_COUNT,
};
pub use quantizer::ColorQuantizer;
pub use recycle::{recycle, Reprojection};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
