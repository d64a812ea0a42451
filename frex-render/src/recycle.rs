//! Reuse of computed pixels after the viewport moves.
//!
//! After a pan or zoom most of the new image shows plane points that the
//! previous image already sampled. [`recycle`] carries those samples over so
//! the next render pass only computes what is actually new.

use rayon::prelude::*;
use tracing::debug;

use frex_core::Region;

use crate::image::Image;

/// How the previous image's pixel grid relates to the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reprojection {
    /// Old pixel `(x, y)` lands at `(x + dx, y + dy)`.
    Pan { dx: i32, dy: i32 },
    /// Region change: the old image showed `from`, the new one shows `to`.
    Zoom { from: Region, to: Region },
}

/// Affine map from old to new pixel coordinates: `new = scale * old + t`.
#[derive(Debug, Clone, Copy)]
struct GridMap {
    scale: f64,
    tx: f64,
    ty: f64,
}

impl GridMap {
    #[inline]
    fn forward(&self, x: f64, y: f64) -> (f64, f64) {
        (self.scale * x + self.tx, self.scale * y + self.ty)
    }

    #[inline]
    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.scale, (y - self.ty) / self.scale)
    }
}

impl Reprojection {
    fn grid_map(&self, old: &Image, new: &Image) -> GridMap {
        match *self {
            Reprojection::Pan { dx, dy } => GridMap {
                scale: 1.0,
                tx: dx as f64,
                ty: dy as f64,
            },
            Reprojection::Zoom { from, to } => {
                let (w1, h1) = (old.width() as f64, old.height() as f64);
                let (w2, h2) = (new.width() as f64, new.height() as f64);
                let s1 = from.pixel_size(old.width(), old.height());
                let s2 = to.pixel_size(new.width(), new.height());
                let scale = s1 / s2;
                GridMap {
                    scale,
                    tx: w2 / 2.0 + (from.center.x - to.center.x) / s2 - scale * w1 / 2.0,
                    ty: h2 / 2.0 - (from.center.y - to.center.y) / s2 - scale * h1 / 2.0,
                }
            }
        }
    }
}

/// Round half away from zero and bounds-check against `width` × `height`.
#[inline]
fn to_pixel(x: f64, y: f64, width: u32, height: u32) -> Option<(u32, u32)> {
    let (x, y) = (x.round(), y.round());
    if x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64 {
        Some((x as u32, y as u32))
    } else {
        None
    }
}

#[inline]
fn copy_pixel(old: &Image, i1: usize, new: &Image, i2: usize) {
    if old.is_computed(i1) {
        new.set_pixel(i2, old.color(i1), old.value(i1));
    } else {
        new.set_color(i2, old.color(i1));
    }
}

/// Clear `new`, then copy every sample of `old` that stays visible under
/// `reprojection`.
///
/// Colors are copied whether or not the source was computed, so the new
/// image can be shown as a preview right away. Values and the computed
/// state only come from computed sources. Returns the number of pixels of
/// `new` that no longer need computing.
pub fn recycle(old: &Image, new: &Image, reprojection: &Reprojection) -> usize {
    new.clear();
    let map = reprojection.grid_map(old, new);
    let (w1, h1) = (old.width(), old.height());
    let (w2, h2) = (new.width(), new.height());

    if map.scale > 1.0 {
        // Finer grid: every old pixel has a distinct destination.
        (0..h1).into_par_iter().for_each(|y1| {
            for x1 in 0..w1 {
                let (x, y) = map.forward(x1 as f64, y1 as f64);
                if let Some((x2, y2)) = to_pixel(x, y, w2, h2) {
                    copy_pixel(old, old.index(x1, y1), new, new.index(x2, y2));
                }
            }
        });
    } else {
        (0..h2).into_par_iter().for_each(|y2| {
            for x2 in 0..w2 {
                let (x, y) = map.inverse(x2 as f64, y2 as f64);
                if let Some((x1, y1)) = to_pixel(x, y, w1, h1) {
                    copy_pixel(old, old.index(x1, y1), new, new.index(x2, y2));
                }
            }
        });
    }

    let reused = new.computed_count();
    debug!(?reprojection, scale = map.scale, reused, "Recycled image");
    reused
}

impl Image {
    /// Allocate a `width` × `height` image and recycle `self` into it.
    pub fn recycled(
        &self,
        reprojection: &Reprojection,
        width: u32,
        height: u32,
    ) -> crate::Result<Image> {
        let image = Image::new(width, height)?;
        recycle(self, &image, reprojection);
        Ok(image)
    }
}
