//! Lattice value noise and multi-octave turbulence.
//!
//! The lattice is drawn once from a fixed-seed generator, so every image
//! rendered with turbulence is reproducible across runs and threads.

use std::sync::LazyLock;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// Side length of the (wrapping) noise lattice.
pub const LATTICE_SIZE: usize = 256;

const LATTICE_SEED: u64 = 0;

/// Octaves summed by the orbit decoration.
pub const DEFAULT_OCTAVES: u32 = 3;

static LATTICE: LazyLock<Box<[f32]>> = LazyLock::new(|| {
    let mut rng = Pcg32::seed_from_u64(LATTICE_SEED);
    let lattice: Box<[f32]> = (0..LATTICE_SIZE * LATTICE_SIZE)
        .map(|_| rng.random::<f32>())
        .collect();
    debug!(size = LATTICE_SIZE, "Noise lattice initialised");
    lattice
});

#[inline]
fn lattice_at(i: usize, j: usize) -> f64 {
    LATTICE[i * LATTICE_SIZE + j] as f64
}

/// Force the lattice to be built now rather than on first use by a worker.
pub fn init() {
    LazyLock::force(&LATTICE);
}

/// Bilinearly interpolated lattice noise at `(u, v)`, in `[0, 1)`.
///
/// The lattice wraps every [`LATTICE_SIZE`] units in both directions.
pub fn noise(u: f64, v: f64) -> f64 {
    let fu = u.floor();
    let fv = v.floor();
    let du = u - fu;
    let dv = v - fv;

    let n = LATTICE_SIZE as i64;
    let iu = (fu as i64).rem_euclid(n) as usize;
    let iv = (fv as i64).rem_euclid(n) as usize;
    let ip = (iu + 1) % LATTICE_SIZE;
    let iq = (iv + 1) % LATTICE_SIZE;

    let bot = lattice_at(iu, iv) + du * (lattice_at(ip, iv) - lattice_at(iu, iv));
    let top = lattice_at(iu, iq) + du * (lattice_at(ip, iq) - lattice_at(iu, iq));
    bot + dv * (top - bot)
}

/// Fractal Brownian motion: `octaves` noise samples at halving scales,
/// each weighted by its scale and normalised by the total weight.
pub fn turbulence(x: f64, y: f64, scale: f64, octaves: u32) -> f64 {
    let mut sum = 0.0;
    let mut weight = 0.0;
    let mut s = scale;
    for _ in 0..octaves {
        sum += noise(x / s, y / s) * s;
        weight += s;
        s /= 2.0;
    }
    if weight == 0.0 {
        0.0
    } else {
        sum / weight
    }
}

/// Strength and base scale of the turbulence applied to orbit points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurbulenceParams {
    pub intensity: f64,
    pub scale: f64,
}

impl TurbulenceParams {
    pub fn new(intensity: f64, scale: f64) -> crate::Result<Self> {
        let params = Self { intensity, scale };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            return Err(CoreError::InvalidTurbulence {
                reason: format!("scale must be positive and finite, got {}", self.scale),
            });
        }
        if !self.intensity.is_finite() {
            return Err(CoreError::InvalidTurbulence {
                reason: format!("intensity must be finite, got {}", self.intensity),
            });
        }
        Ok(())
    }

    /// Offset added to both coordinates of an orbit point.
    #[inline]
    pub fn offset(&self, x: f64, y: f64) -> f64 {
        self.intensity * turbulence(x, y, self.scale, DEFAULT_OCTAVES)
    }
}
