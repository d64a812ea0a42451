use crate::fractal::{Fractal, FractalParams, Orbit};
use crate::point::Point;
use crate::region::Region;

/// The Mandelbrot step disturbed by swapping `x` and `y` whenever `y < x`.
///
/// The swap happens after the point is recorded, so the orbit holds the
/// plain quadratic iterate and the disturbance shows up one step later.
#[derive(Debug, Clone, Copy, Default)]
pub struct OddOnion;

impl Fractal for OddOnion {
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
            if zy < zx {
                std::mem::swap(&mut zx, &mut zy);
            }
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
        150
    }

    fn default_bail_out(&self) -> f64 {
        100.0
    }
}
