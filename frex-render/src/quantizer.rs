use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::RenderError;
use crate::palette::{blue, green, red, rgb, ColorScheme, TiePoint};

/// An RGB centroid; alpha is ignored throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb {
    r: i32,
    g: i32,
    b: i32,
}

impl Rgb {
    #[inline]
    fn from_argb(c: u32) -> Self {
        Self {
            r: red(c) as i32,
            g: green(c) as i32,
            b: blue(c) as i32,
        }
    }

    /// Manhattan distance.
    #[inline]
    fn mdist(&self, o: &Rgb) -> u32 {
        (self.r - o.r).unsigned_abs() + (self.g - o.g).unsigned_abs() + (self.b - o.b).unsigned_abs()
    }

    #[inline]
    fn brightness(&self) -> i32 {
        self.r + self.g + self.b
    }

    fn to_argb(self) -> u32 {
        rgb(self.r as u8, self.g as u8, self.b as u8)
    }
}

/// Running channel sums of one cluster.
#[derive(Debug, Clone, Copy, Default)]
struct Accu {
    r: u64,
    g: u64,
    b: u64,
    n: u64,
}

impl Accu {
    #[inline]
    fn add(&mut self, c: &Rgb) {
        self.r += c.r as u64;
        self.g += c.g as u64;
        self.b += c.b as u64;
        self.n += 1;
    }

    fn merge(&mut self, o: &Accu) {
        self.r += o.r;
        self.g += o.g;
        self.b += o.b;
        self.n += o.n;
    }

    /// Rounded mean, or `None` for an empty cluster.
    fn mean(&self) -> Option<Rgb> {
        if self.n == 0 {
            return None;
        }
        let avg = |sum: u64| ((sum + self.n / 2) / self.n) as i32;
        Some(Rgb {
            r: avg(self.r),
            g: avg(self.g),
            b: avg(self.b),
        })
    }
}

/// Index of the nearest centroid; ties go to the lower index.
#[inline]
fn nearest(centroids: &[Rgb], c: &Rgb) -> usize {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (k, centroid) in centroids.iter().enumerate() {
        let d = centroid.mdist(c);
        if d < best_dist {
            best_dist = d;
            best = k;
        }
    }
    best
}

/// Derives a color scheme from an image by k-means clustering its pixels.
///
/// [`cancel`](Self::cancel) may be called from another thread while
/// [`quantize`](Self::quantize) runs; the flag stays set afterwards.
#[derive(Debug)]
pub struct ColorQuantizer {
    cluster_count: usize,
    max_distance: u32,
    max_iter_count: u32,
    seed: Option<u64>,
    cancelled: AtomicBool,
}

impl ColorQuantizer {
    pub fn new(cluster_count: usize, max_distance: u32, max_iter_count: u32) -> crate::Result<Self> {
        if cluster_count < 2 {
            return Err(RenderError::InvalidQuantizer {
                reason: format!("cluster count must be >= 2, got {cluster_count}"),
            });
        }
        if max_iter_count < 1 {
            return Err(RenderError::InvalidQuantizer {
                reason: "iteration limit must be >= 1".to_string(),
            });
        }
        Ok(Self {
            cluster_count,
            max_distance,
            max_iter_count,
            seed: None,
            cancelled: AtomicBool::new(false),
        })
    }

    /// Use a fixed seed for picking the initial centroids.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    pub fn max_iter_count(&self) -> u32 {
        self.max_iter_count
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cluster `pixels` (ARGB) and return the centroids as an opaque scheme
    /// ordered from dark to bright, or `None` if cancelled.
    ///
    /// `progress` receives a message, the iteration number and the
    /// iteration limit once per iteration.
    pub fn quantize(
        &self,
        pixels: &[u32],
        mut progress: impl FnMut(&str, u32, u32),
    ) -> crate::Result<Option<ColorScheme>> {
        if pixels.is_empty() {
            return Err(RenderError::InvalidQuantizer {
                reason: "no pixels to quantize".to_string(),
            });
        }

        let k = self.cluster_count;
        let mut rng = Pcg32::seed_from_u64(self.seed.unwrap_or_else(rand::random));
        let mut centroids: Vec<Rgb> = (0..k)
            .map(|_| Rgb::from_argb(pixels[rng.random_range(0..pixels.len())]))
            .collect();

        for iter in 1..=self.max_iter_count {
            if self.is_cancelled() {
                debug!(iter, "Quantization cancelled");
                return Ok(None);
            }

            let sums = pixels
                .par_iter()
                .fold(
                    || vec![Accu::default(); k],
                    |mut acc, &p| {
                        let c = Rgb::from_argb(p);
                        acc[nearest(&centroids, &c)].add(&c);
                        acc
                    },
                )
                .reduce(
                    || vec![Accu::default(); k],
                    |mut a, b| {
                        for (x, y) in a.iter_mut().zip(&b) {
                            x.merge(y);
                        }
                        a
                    },
                );

            let mut movement = 0;
            for (centroid, accu) in centroids.iter_mut().zip(&sums) {
                if let Some(mean) = accu.mean() {
                    movement = movement.max(centroid.mdist(&mean));
                    *centroid = mean;
                }
            }

            debug!(iter, movement, "Quantizer iteration");
            progress(&format!("iter {iter}, {movement}"), iter, self.max_iter_count);

            if movement <= self.max_distance {
                info!(iterations = iter, clusters = k, "Quantizer converged");
                break;
            }
        }

        centroids.sort_by_key(Rgb::brightness);
        let last = (k - 1) as f64;
        let tie_points = centroids
            .iter()
            .enumerate()
            .map(|(i, c)| TiePoint::new(i as f64 / last, c.to_argb()))
            .collect();
        ColorScheme::new(tie_points).map(Some)
    }
}

impl Default for ColorQuantizer {
    fn default() -> Self {
        Self {
            cluster_count: 8,
            max_distance: 3,
            max_iter_count: 25,
            seed: None,
            cancelled: AtomicBool::new(false),
        }
    }
}
