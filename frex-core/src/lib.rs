pub mod burning_ship;
pub mod distance;
pub mod error;
pub mod fractal;
pub mod mandelbrot;
pub mod nova;
pub mod odd_onion;
pub mod orbit;
pub mod point;
pub mod region;
pub mod turbulence;

// Re-export primary types for convenience.
pub use burning_ship::BurningShip;
pub use distance::DistanceFunction;
pub use error::CoreError;
pub use fractal::{Fractal, FractalKind, FractalParams, Orbit};
pub use mandelbrot::Mandelbrot;
pub use nova::Nova;
pub use odd_onion::OddOnion;
pub use orbit::OrbitFunction;
pub use point::Point;
pub use region::Region;
pub use turbulence::TurbulenceParams;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
