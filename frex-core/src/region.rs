use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::point::Point;

/// The visible part of the complex plane: a centre and a radius.
///
/// The radius is half the extent of the shorter image side, so the whole
/// disc `|z - center| <= radius` is visible whatever the aspect ratio.
/// `Region` is `Copy`; a render pass captures its own snapshot and later
/// pans or zooms of the live viewport never reach it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Centre of the region in the complex plane.
    pub center: Point,

    /// Half the extent of the shorter image side, in plane units.
    pub radius: f64,
}

impl Region {
    /// Create a region, rejecting non-positive or non-finite radii.
    pub fn new(center: Point, radius: f64) -> crate::Result<Self> {
        let region = Self { center, radius };
        region.validate()?;
        Ok(region)
    }

    /// Check the invariants a deserialized region may have lost.
    pub fn validate(&self) -> crate::Result<()> {
        if self.radius <= 0.0 || !self.radius.is_finite() {
            return Err(CoreError::InvalidRegion {
                reason: format!("radius must be positive and finite, got {}", self.radius),
            });
        }
        if !self.center.x.is_finite() || !self.center.y.is_finite() {
            return Err(CoreError::InvalidRegion {
                reason: format!("centre must be finite, got {:?}", self.center),
            });
        }
        Ok(())
    }

    /// Plane units per pixel for an image of the given size.
    #[inline]
    pub fn pixel_size(&self, width: u32, height: u32) -> f64 {
        pixel_size_for(self.radius, width, height)
    }

    /// Plane x coordinate of the left image edge.
    #[inline]
    pub fn upper_left_x(&self, width: u32, pixel_size: f64) -> f64 {
        self.center.x - 0.5 * pixel_size * width as f64
    }

    /// Plane y coordinate of the top image edge. The plane's y axis points
    /// up while image rows grow downward.
    #[inline]
    pub fn upper_left_y(&self, height: u32, pixel_size: f64) -> f64 {
        self.center.y + 0.5 * pixel_size * height as f64
    }

    /// Map an image coordinate to the plane, using the same math as the
    /// render workers.
    pub fn pixel_to_point(&self, px: f64, py: f64, width: u32, height: u32) -> Point {
        let ps = self.pixel_size(width, height);
        Point::new(
            self.upper_left_x(width, ps) + px * ps,
            self.upper_left_y(height, ps) - py * ps,
        )
    }

    /// Zoom by `factor`, recentring on the plane point under `(view_x, view_y)`.
    pub fn zoomed(
        &self,
        view_x: f64,
        view_y: f64,
        factor: f64,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        let center = self.pixel_to_point(view_x, view_y, width, height);
        Self::new(center, self.radius / factor)
    }

    /// Zoom by `factor` while keeping the plane point under
    /// `(view_x, view_y)` at the same place on screen.
    pub fn zoomed_about(
        &self,
        view_x: f64,
        view_y: f64,
        factor: f64,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        let radius = self.radius / factor;
        let s1 = self.pixel_size(width, height);
        let s2 = pixel_size_for(radius, width, height);
        let center = Point::new(
            self.center.x + (s1 - s2) * (view_x - width as f64 / 2.0),
            self.center.y - (s1 - s2) * (view_y - height as f64 / 2.0),
        );
        Self::new(center, radius)
    }

    /// Move the centre by a scroll distance measured in whole pixels.
    ///
    /// Image content moves by `(-view_dx, -view_dy)`, which is the pan that
    /// recycling must apply to the previous image.
    pub fn panned(&self, view_dx: i32, view_dy: i32, width: u32, height: u32) -> Self {
        let ps = self.pixel_size(width, height);
        Self {
            center: Point::new(
                self.center.x + ps * view_dx as f64,
                self.center.y - ps * view_dy as f64,
            ),
            radius: self.radius,
        }
    }
}

/// Pixel size for a radius without building a region first.
#[inline]
pub fn pixel_size_for(radius: f64, width: u32, height: u32) -> f64 {
    2.0 * radius / width.min(height) as f64
}
