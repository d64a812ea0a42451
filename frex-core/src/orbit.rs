use crate::distance::DistanceFunction;
use crate::error::CoreError;
use crate::fractal::Orbit;
use crate::point::Point;
use crate::turbulence::TurbulenceParams;

/// Decorates an orbit by how closely it passes the zero set of a
/// [`DistanceFunction`].
///
/// Each orbit point contributes `1 / (1 + d²)` where `d` is the scaled
/// distance at that point, so the result lies in `[0, num_points]` and a
/// point exactly on the zero set contributes 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitFunction {
    distance: DistanceFunction,
    dilation: f64,
    inv_dilation: f64,
    translate: Point,
    turbulence: Option<TurbulenceParams>,
}

impl OrbitFunction {
    pub fn new(
        distance: DistanceFunction,
        dilation: f64,
        translate: Point,
        turbulence: Option<TurbulenceParams>,
    ) -> crate::Result<Self> {
        if dilation == 0.0 || !dilation.is_finite() {
            return Err(CoreError::InvalidDilation(dilation));
        }
        if let Some(t) = &turbulence {
            t.validate()?;
        }
        Ok(Self {
            distance,
            dilation,
            inv_dilation: 1.0 / dilation,
            translate,
            turbulence,
        })
    }

    pub fn distance(&self) -> DistanceFunction {
        self.distance
    }

    pub fn dilation(&self) -> f64 {
        self.dilation
    }

    pub fn translate(&self) -> Point {
        self.translate
    }

    pub fn turbulence(&self) -> Option<TurbulenceParams> {
        self.turbulence
    }

    /// Sum the vicinity of the first `num_points` orbit points.
    ///
    /// Turbulence is sampled at the untranslated point and shifts both
    /// coordinates by the same amount. Non-finite distances count as
    /// infinitely far away and contribute nothing.
    pub fn process_orbit(&self, num_points: usize, orbit: &Orbit) -> f32 {
        let n = num_points.min(orbit.len());
        let (tx, ty) = (self.translate.x, self.translate.y);
        let mut sum = 0.0;
        for (&x, &y) in orbit.x[..n].iter().zip(&orbit.y[..n]) {
            let shift = match &self.turbulence {
                Some(t) => t.offset(x, y),
                None => 0.0,
            };
            let d = self.inv_dilation * self.distance.evaluate(x - tx + shift, y - ty + shift);
            if d.is_finite() {
                sum += 1.0 / (1.0 + d * d);
            }
        }
        sum as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit_of(points: &[(f64, f64)]) -> Orbit {
        let mut orbit = Orbit::new(points.len());
        for (i, &(x, y)) in points.iter().enumerate() {
            orbit.x[i] = x;
            orbit.y[i] = y;
        }
        orbit
    }

    fn plain(distance: DistanceFunction) -> OrbitFunction {
        OrbitFunction::new(distance, 1.0, Point::ORIGIN, None).unwrap()
    }

    #[test]
    fn points_on_zero_set_sum_to_count() {
        let orbit = orbit_of(&[(0.0, 3.0), (-2.0, 0.0), (0.0, 0.0)]);
        assert_eq!(plain(DistanceFunction::Linear1).process_orbit(3, &orbit), 3.0);
    }

    #[test]
    fn only_first_points_count() {
        let orbit = orbit_of(&[(0.0, 3.0), (-2.0, 0.0), (0.0, 0.0)]);
        assert_eq!(plain(DistanceFunction::Linear1).process_orbit(2, &orbit), 2.0);
        assert_eq!(plain(DistanceFunction::Linear1).process_orbit(0, &orbit), 0.0);
    }

    #[test]
    fn dilation_scales_distance() {
        let orbit = orbit_of(&[(1.0, 1.0)]);
        // d = 1 / 2, contribution = 1 / 1.25
        let f = OrbitFunction::new(DistanceFunction::Linear1, 2.0, Point::ORIGIN, None).unwrap();
        assert!((f.process_orbit(1, &orbit) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn translation_moves_zero_set() {
        let orbit = orbit_of(&[(1.5, -0.5)]);
        let f = OrbitFunction::new(
            DistanceFunction::Linear1,
            1.0,
            Point::new(1.5, 7.0),
            None,
        )
        .unwrap();
        assert_eq!(f.process_orbit(1, &orbit), 1.0);
    }

    #[test]
    fn infinite_distance_contributes_nothing() {
        let orbit = orbit_of(&[(1.0, 0.0), (0.0, 0.0)]);
        // DivXy is infinite for y = 0; LogXx is -inf at x = 0.
        assert_eq!(plain(DistanceFunction::DivXy).process_orbit(2, &orbit), 0.0);
        let v = plain(DistanceFunction::LogXx).process_orbit(2, &orbit);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn sum_stays_in_range() {
        let points: Vec<_> = (0..50)
            .map(|i| (i as f64 * 0.13 - 3.0, 1.7 - i as f64 * 0.07))
            .collect();
        let orbit = orbit_of(&points);
        let t = TurbulenceParams::new(0.5, 0.25).unwrap();
        for distance in DistanceFunction::ALL {
            for turbulence in [None, Some(t)] {
                let f = OrbitFunction::new(distance, 0.5, Point::new(0.1, 0.2), turbulence)
                    .unwrap();
                let v = f.process_orbit(points.len(), &orbit);
                assert!(
                    (0.0..=50.0).contains(&v),
                    "{distance} gave {v} out of range"
                );
            }
        }
    }

    #[test]
    fn turbulence_changes_result() {
        let points: Vec<_> = (0..20).map(|i| (i as f64 * 0.31, i as f64 * 0.17)).collect();
        let orbit = orbit_of(&points);
        let plain = plain(DistanceFunction::Ring1).process_orbit(20, &orbit);
        let t = TurbulenceParams::new(1.0, 0.5).unwrap();
        let noisy = OrbitFunction::new(DistanceFunction::Ring1, 1.0, Point::ORIGIN, Some(t))
            .unwrap()
            .process_orbit(20, &orbit);
        assert_ne!(plain, noisy);
    }

    #[test]
    fn invalid_dilation() {
        for d in [0.0, f64::NAN, f64::INFINITY] {
            assert!(OrbitFunction::new(DistanceFunction::X, d, Point::ORIGIN, None).is_err());
        }
        assert!(OrbitFunction::new(DistanceFunction::X, -2.0, Point::ORIGIN, None).is_ok());
    }

    #[test]
    fn invalid_turbulence_is_rejected() {
        let bad = TurbulenceParams {
            intensity: 1.0,
            scale: 0.0,
        };
        assert!(OrbitFunction::new(DistanceFunction::X, 1.0, Point::ORIGIN, Some(bad)).is_err());
    }
}
