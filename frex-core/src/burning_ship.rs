use crate::fractal::{Fractal, FractalParams, Orbit};
use crate::point::Point;
use crate::region::Region;

/// The Burning Ship: `z_{n+1} = (x² - y², 2|xy|) + c`.
///
/// The imaginary axis is flipped on entry so the ship appears upright.
#[derive(Debug, Clone, Copy, Default)]
pub struct BurningShip;

impl Fractal for BurningShip {
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

        let (mut zx, mut zy) = (init.x, -init.y);
        let cy = -constant.y;
        for iter in 0..iter_max {
            let zxx = zx * zx;
            let zyy = zy * zy;
            if zxx + zyy > bail_out {
                return iter;
            }
            zy = 2.0 * (zx * zy).abs() + cy;
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
