use crate::fractal::{Fractal, FractalParams, Orbit};
use crate::point::Point;
use crate::region::Region;

/// Nova fractal: a relaxed Newton iteration for `f(z) = z³ - z`,
/// `z_{n+1} = c + z_n - f(z_n) / f'(z_n)`.
///
/// Unlike the quadratic formulas it stops when the orbit *converges*: once
/// two successive points are closer than `bail_out`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nova;

impl Fractal for Nova {
    fn compute_orbit(
        &self,
        init: Point,
        constant: Point,
        params: &FractalParams,
        orbit: &mut Orbit,
    ) -> u32 {
        let iter_max = params.iter_max;
        let rr = params.bail_out * params.bail_out;
        orbit.ensure_len(iter_max as usize);

        let (mut zx, mut zy) = (init.x, init.y);
        let (mut px, mut py) = (zx, zy);

        for iter in 0..iter_max {
            // g = z(z - 1), so f = g(z + 1).
            let gx = zx * (zx - 1.0) - zy * zy;
            let gy = zx * zy + (zx - 1.0) * zy;
            let fx = gx * (zx + 1.0) - gy * zy;
            let fy = gx * zy + (zx + 1.0) * gy;

            // f' = (2z - 1)(z + 1) + z(z - 1) = 3z² - 1.
            let dx = (2.0 * zx - 1.0) * (zx + 1.0) - 2.0 * zy * zy + zx * (zx - 1.0) - zy * zy;
            let dy = (2.0 * zx - 1.0) * zy + (zx + 1.0) * 2.0 * zy + gy;
            let dd = dx * dx + dy * dy;

            zx = constant.x + zx - (fx * dx + fy * dy) / dd;
            zy = constant.y + zy - (dx * fy - fx * dy) / dd;

            let step = (zx - px) * (zx - px) + (zy - py) * (zy - py);
            if step < rr {
                return iter;
            }
            px = zx;
            py = zy;

            orbit.x[iter as usize] = zx;
            orbit.y[iter as usize] = zy;
        }
        iter_max
    }

    fn default_region(&self) -> Region {
        Region {
            center: Point::ORIGIN,
            radius: 1.0,
        }
    }

    fn default_iter_max(&self) -> u32 {
        100
    }

    fn default_bail_out(&self) -> f64 {
        0.001
    }
}
