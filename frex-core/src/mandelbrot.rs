use crate::fractal::{Fractal, FractalParams, Orbit};
use crate::point::Point;
use crate::region::Region;

/// The Mandelbrot set: `z_{n+1} = z_n² + c`.
///
/// In standard mode `init` is the origin and `constant` is the pixel; Julia
/// mode swaps the roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mandelbrot;

impl Fractal for Mandelbrot {
    fn compute_orbit(
        &self,
        init: Point,
        constant: Point,
        params: &FractalParams,
        orbit: &mut Orbit,
    ) -> u32 {
        let iter_max = params.iter_max;
        let bail_out = params.bail_out;
        orbit.ensure_len(iter_max as usize);

        let (mut zx, mut zy) = (init.x, init.y);
        for iter in 0..iter_max {
            let zxx = zx * zx;
            let zyy = zy * zy;
            if zxx + zyy > bail_out {
                return iter;
            }
            zy = 2.0 * zx * zy + constant.y;
            zx = zxx - zyy + constant.x;
            orbit.x[iter as usize] = zx;
            orbit.y[iter as usize] = zy;
        }
        iter_max
    }

    fn default_region(&self) -> Region {
        Region {
            center: Point::new(-0.5, 0.0),
            radius: 1.2,
        }
    }

    fn default_iter_max(&self) -> u32 {
        100
    }

    fn default_bail_out(&self) -> f64 {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FractalParams {
        FractalParams::new(100, 100.0).unwrap()
    }

    fn escape(c: Point) -> u32 {
        Mandelbrot.compute_orbit(Point::ORIGIN, c, &params(), &mut Orbit::default())
    }

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape(Point::new(0.0, 0.0)), 100);
    }

    #[test]
    fn far_point_escapes_early() {
        // z1 = 2+2i (|z|² = 8), z2 = 2+10i (|z|² = 104 > 100).
        assert_eq!(escape(Point::new(2.0, 2.0)), 2);
    }

    #[test]
    fn escape_is_checked_before_stepping() {
        let mut orbit = Orbit::default();
        let iter = Mandelbrot.compute_orbit(
            Point::new(20.0, 0.0),
            Point::ORIGIN,
            &params(),
            &mut orbit,
        );
        assert_eq!(iter, 0);
    }

    #[test]
    fn orbit_records_each_step() {
        let mut orbit = Orbit::default();
        let c = Point::new(-1.0, 0.0);
        let iter = Mandelbrot.compute_orbit(Point::ORIGIN, c, &params(), &mut orbit);
        assert_eq!(iter, 100);
        assert_eq!(orbit.len(), 100);
        // Period-2 cycle 0 → -1 → 0 → -1 …
        assert_eq!((orbit.x[0], orbit.y[0]), (-1.0, 0.0));
        assert_eq!((orbit.x[1], orbit.y[1]), (0.0, 0.0));
        assert_eq!((orbit.x[2], orbit.y[2]), (-1.0, 0.0));
    }

    #[test]
    fn julia_mode_uses_init_as_pixel() {
        let mut orbit = Orbit::default();
        let iter = Mandelbrot.compute_orbit(
            Point::new(0.5, 0.0),
            Point::ORIGIN,
            &params(),
            &mut orbit,
        );
        // z → z² from 0.5 converges to 0.
        assert_eq!(iter, 100);
        assert!(orbit.x[99].abs() < 1e-12);
    }

    #[test]
    fn deterministic_results() {
        let points = [
            Point::new(-0.75, 0.1),
            Point::new(0.3, 0.5),
            Point::new(-2.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        let run1: Vec<_> = points.iter().map(|&c| escape(c)).collect();
        let run2: Vec<_> = points.iter().map(|&c| escape(c)).collect();
        assert_eq!(run1, run2);
    }
}
