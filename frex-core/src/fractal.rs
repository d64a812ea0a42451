use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::point::Point;
use crate::region::Region;
use crate::{BurningShip, Mandelbrot, Nova, OddOnion};

/// Parameters controlling fractal iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Maximum number of iterations, and the orbit length needed to hold
    /// a bounded orbit.
    pub iter_max: u32,

    /// Escape threshold. Quadratic formulas compare it against `x² + y²`;
    /// Nova compares its square against the step length.
    pub bail_out: f64,
}

impl FractalParams {
    pub fn new(iter_max: u32, bail_out: f64) -> crate::Result<Self> {
        let params = Self { iter_max, bail_out };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.iter_max < 1 {
            return Err(CoreError::InvalidIterMax(self.iter_max));
        }
        if self.bail_out <= 0.0 || !self.bail_out.is_finite() {
            return Err(CoreError::InvalidBailOut(self.bail_out));
        }
        Ok(())
    }
}

/// Reusable orbit storage: the points visited before escape.
///
/// One buffer lives per worker and is reused for every pixel of its band,
/// so the hot loop never allocates.
#[derive(Debug, Clone, Default)]
pub struct Orbit {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Orbit {
    pub fn new(len: usize) -> Self {
        Self {
            x: vec![0.0; len],
            y: vec![0.0; len],
        }
    }

    /// Grow both coordinate arrays to at least `len` points.
    #[inline]
    pub fn ensure_len(&mut self, len: usize) {
        if self.x.len() < len {
            self.x.resize(len, 0.0);
            self.y.resize(len, 0.0);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// The first `n` recorded points.
    pub fn points(&self, n: usize) -> impl Iterator<Item = Point> + '_ {
        self.x[..n]
            .iter()
            .zip(&self.y[..n])
            .map(|(&x, &y)| Point::new(x, y))
    }
}

/// An escape-time formula that records its orbit.
///
/// Renderers are generic over `F: Fractal` so the inner loop is
/// monomorphized per formula; [`FractalKind`] picks the implementation at
/// runtime once per band. Implementations hold no state and are shared
/// freely across worker threads.
pub trait Fractal: Send + Sync {
    /// Iterate from `init` with parameter `constant`, writing point `i`
    /// into `orbit.x[i]`, `orbit.y[i]`.
    ///
    /// Returns the iteration at which the escape predicate first held, or
    /// `params.iter_max` if it never did. The return value is also the
    /// number of valid orbit points. The orbit is grown to `iter_max`
    /// points if it is shorter.
    fn compute_orbit(
        &self,
        init: Point,
        constant: Point,
        params: &FractalParams,
        orbit: &mut Orbit,
    ) -> u32;

    /// Region showing the whole set.
    fn default_region(&self) -> Region;

    fn default_iter_max(&self) -> u32;

    fn default_bail_out(&self) -> f64;

    /// Default iteration parameters for this formula.
    fn default_params(&self) -> FractalParams {
        FractalParams {
            iter_max: self.default_iter_max(),
            bail_out: self.default_bail_out(),
        }
    }
}

/// Runtime selector for the built-in formulas, serialized by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FractalKind {
    #[default]
    Mandelbrot,
    BurningShip,
    OddOnion,
    Nova,
}

impl FractalKind {
    pub const ALL: [FractalKind; 4] = [
        FractalKind::Mandelbrot,
        FractalKind::BurningShip,
        FractalKind::OddOnion,
        FractalKind::Nova,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Mandelbrot => "MANDELBROT",
            Self::BurningShip => "BURNING_SHIP",
            Self::OddOnion => "ODD_ONION",
            Self::Nova => "NOVA",
        }
    }

    /// The formula as a trait object, for callers outside the hot loop.
    pub fn formula(self) -> &'static dyn Fractal {
        match self {
            Self::Mandelbrot => &Mandelbrot,
            Self::BurningShip => &BurningShip,
            Self::OddOnion => &OddOnion,
            Self::Nova => &Nova,
        }
    }
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FractalKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownFractal(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_params() {
        let p = FractalParams::new(100, 100.0).unwrap();
        assert_eq!(p.iter_max, 100);
        assert_eq!(p.bail_out, 100.0);
    }

    #[test]
    fn invalid_iter_max() {
        assert!(FractalParams::new(0, 100.0).is_err());
    }

    #[test]
    fn invalid_bail_out() {
        assert!(FractalParams::new(100, 0.0).is_err());
        assert!(FractalParams::new(100, -1.0).is_err());
        assert!(FractalParams::new(100, f64::NAN).is_err());
        assert!(FractalParams::new(100, f64::INFINITY).is_err());
    }

    #[test]
    fn orbit_grows_on_demand() {
        let mut orbit = Orbit::new(4);
        orbit.ensure_len(2);
        assert_eq!(orbit.len(), 4);
        orbit.ensure_len(10);
        assert_eq!(orbit.len(), 10);
        assert_eq!(orbit.y.len(), 10);
    }

    #[test]
    fn kind_ids_round_trip() {
        for kind in FractalKind::ALL {
            assert_eq!(kind.id().parse::<FractalKind>().unwrap(), kind);
        }
        assert_eq!("nova".parse::<FractalKind>().unwrap(), FractalKind::Nova);
        assert!("JULIA".parse::<FractalKind>().is_err());
    }

    #[test]
    fn kind_serializes_as_id() {
        let json = serde_json::to_string(&FractalKind::BurningShip).unwrap();
        assert_eq!(json, "\"BURNING_SHIP\"");
    }

    #[test]
    fn defaults_come_from_formula() {
        let p = FractalKind::OddOnion.formula().default_params();
        assert_eq!(p.iter_max, 150);
        assert_eq!(p.bail_out, 100.0);
        let nova = FractalKind::Nova.formula();
        assert_eq!(nova.default_region().radius, 1.0);
        assert_eq!(nova.default_bail_out(), 0.001);
    }
}
