use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::RenderError;
use crate::palette::{alpha, blue, green, red};

/// Per-pixel render target shared between the caller and the workers.
///
/// Holds a packed ARGB color and an `f32` shading value per pixel. A value
/// of [`Image::NOT_COMPUTED`] (any negative value, in fact) marks a pixel
/// that still has to be computed; there is no separate flag array.
///
/// Cells are relaxed atomics so workers can fill disjoint rows through a
/// shared `Arc<Image>` while the caller reads a progressive preview.
pub struct Image {
    width: u32,
    height: u32,
    colors: Box<[AtomicU32]>,
    /// `f32` bit patterns.
    values: Box<[AtomicU32]>,
}

fn alloc_cells(len: usize, init: u32, width: u32, height: u32) -> crate::Result<Box<[AtomicU32]>> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| RenderError::OutOfMemory { width, height })?;
    cells.extend((0..len).map(|_| AtomicU32::new(init)));
    Ok(cells.into_boxed_slice())
}

impl Image {
    /// Shading value of a pixel that has not been computed yet.
    pub const NOT_COMPUTED: f32 = -1.0;

    /// Allocate an image with every pixel not computed and transparent black.
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::InvalidDimensions { width, height })?;
        let colors = alloc_cells(len, 0, width, height)?;
        let values = alloc_cells(len, Self::NOT_COMPUTED.to_bits(), width, height)?;
        Ok(Self {
            width,
            height,
            colors,
            values,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Linear index of pixel `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn color(&self, i: usize) -> u32 {
        self.colors[i].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn value(&self, i: usize) -> f32 {
        f32::from_bits(self.values[i].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn is_computed(&self, i: usize) -> bool {
        self.value(i) >= 0.0
    }

    #[inline]
    pub fn set_pixel(&self, i: usize, color: u32, value: f32) {
        self.values[i].store(value.to_bits(), Ordering::Relaxed);
        self.colors[i].store(color, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_color(&self, i: usize, color: u32) {
        self.colors[i].store(color, Ordering::Relaxed);
    }

    /// Mark every pixel not computed and reset colors to 0.
    pub fn clear(&self) {
        for c in self.colors.iter() {
            c.store(0, Ordering::Relaxed);
        }
        self.invalidate();
    }

    /// Mark every pixel not computed but keep colors for a preview.
    pub fn invalidate(&self) {
        let bits = Self::NOT_COMPUTED.to_bits();
        for v in self.values.iter() {
            v.store(bits, Ordering::Relaxed);
        }
    }

    /// Snapshot of all colors, row-major.
    pub fn colors(&self) -> Vec<u32> {
        self.colors.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    /// Snapshot of all shading values, row-major.
    pub fn values(&self) -> Vec<f32> {
        self.values
            .iter()
            .map(|v| f32::from_bits(v.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn computed_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_computed(i)).count()
    }

    /// Row-major RGBA bytes, ready for an encoder.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.len() * 4);
        for c in self.colors.iter() {
            let c = c.load(Ordering::Relaxed);
            pixels.extend_from_slice(&[red(c), green(c), blue(c), alpha(c)]);
        }
        pixels
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_not_computed() {
        let img = Image::new(7, 5).unwrap();
        assert_eq!(img.len(), 35);
        assert_eq!(img.computed_count(), 0);
        assert!(img.values().iter().all(|&v| v == Image::NOT_COMPUTED));
        assert!(img.colors().iter().all(|&c| c == 0));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            Image::new(0, 10),
            Err(RenderError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(Image::new(10, 0).is_err());
    }

    #[test]
    fn set_pixel_marks_computed() {
        let img = Image::new(4, 4).unwrap();
        let i = img.index(2, 3);
        assert_eq!(i, 14);
        img.set_pixel(i, 0xff112233, 0.0);
        assert!(img.is_computed(i));
        assert_eq!(img.color(i), 0xff112233);
        assert_eq!(img.value(i), 0.0);
        assert_eq!(img.computed_count(), 1);
    }

    #[test]
    fn set_color_keeps_value() {
        let img = Image::new(2, 2).unwrap();
        img.set_color(1, 0xffabcdef);
        assert!(!img.is_computed(1));
        assert_eq!(img.color(1), 0xffabcdef);
    }

    #[test]
    fn invalidate_keeps_colors_clear_drops_them() {
        let img = Image::new(3, 1).unwrap();
        img.set_pixel(0, 0xff00ff00, 4.5);
        img.invalidate();
        assert_eq!(img.computed_count(), 0);
        assert_eq!(img.color(0), 0xff00ff00);
        img.clear();
        assert_eq!(img.color(0), 0);
    }

    #[test]
    fn rgba_bytes() {
        let img = Image::new(2, 1).unwrap();
        img.set_pixel(0, 0x80102030, 1.0);
        img.set_pixel(1, 0xffffffff, 2.0);
        assert_eq!(img.to_rgba8(), vec![0x10, 0x20, 0x30, 0x80, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn debug_is_compact() {
        let img = Image::new(640, 480).unwrap();
        assert_eq!(format!("{img:?}"), "Image { width: 640, height: 480, .. }");
    }
}
