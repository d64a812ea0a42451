use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A scalar field over the plane whose zero set decorates an orbit.
///
/// Orbit points that pass close to the zero set light up; see
/// [`OrbitFunction`](crate::OrbitFunction). All variants are pure
/// functions, so one value can be shared by every worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceFunction {
    X,
    Y,
    MinXy,
    MaxXy,
    AddXy,
    SubXy,
    MulXy,
    DivXy,
    LogXx,
    #[default]
    Linear1,
    Linear2,
    Linear3,
    Cubic1,
    Cubic2,
    Ring1,
    Ring2,
    Ring3,
    Ring4,
    Sin1,
    Sin2,
    Sin3,
    Sin4,
    Dist1,
    Dist2,
    Dist3,
    LogDist1,
    LogDist2,
    FloorDist,
}

/// `|v - k|`, the distance of a squared radius from ring `k`.
#[inline]
fn ring(v: f64, k: f64) -> f64 {
    if v > k {
        v - k
    } else {
        k - v
    }
}

impl DistanceFunction {
    pub const ALL: [DistanceFunction; 28] = [
        Self::X,
        Self::Y,
        Self::MinXy,
        Self::MaxXy,
        Self::AddXy,
        Self::SubXy,
        Self::MulXy,
        Self::DivXy,
        Self::LogXx,
        Self::Linear1,
        Self::Linear2,
        Self::Linear3,
        Self::Cubic1,
        Self::Cubic2,
        Self::Ring1,
        Self::Ring2,
        Self::Ring3,
        Self::Ring4,
        Self::Sin1,
        Self::Sin2,
        Self::Sin3,
        Self::Sin4,
        Self::Dist1,
        Self::Dist2,
        Self::Dist3,
        Self::LogDist1,
        Self::LogDist2,
        Self::FloorDist,
    ];

    /// Evaluate the field at `(x, y)`.
    ///
    /// May return `±inf` or NaN where the field is singular (`LogXx` at
    /// `x = 0`, `DivXy` at `y = 0`).
    #[inline]
    pub fn evaluate(self, x: f64, y: f64) -> f64 {
        match self {
            Self::X => x,
            Self::Y => y,
            Self::MinXy => x.min(y),
            Self::MaxXy => x.max(y),
            Self::AddXy => x + y,
            Self::SubXy => x - y,
            Self::MulXy => x * y,
            Self::DivXy => {
                if y.abs() > 0.0 {
                    x / y
                } else {
                    f64::INFINITY
                }
            }
            Self::LogXx => (x * x).ln(),
            Self::Linear1 => x.abs().min(y.abs()),
            Self::Linear2 => (y - x).abs().min((y + x).abs()),
            Self::Linear3 => x.abs().min((y - x).abs()).min(y.abs().min((y + x).abs())),
            Self::Cubic1 => ((x + 1.0) * x * (x - 1.0)).abs(),
            Self::Cubic2 => {
                let v = (x + 1.0) * x * (x - 1.0);
                (y - v).abs().min((y + v).abs())
            }
            Self::Ring1 => ring(x * x + y * y, 1.0),
            Self::Ring2 => {
                let v = x * x + y * y;
                ring(v, 1.0).min(ring(v, 2.0))
            }
            Self::Ring3 => {
                let v = x * x + y * y;
                ring(v, 1.0).min(ring(v, 2.0)).min(ring(v, 3.0))
            }
            Self::Ring4 => 1.0 + (x * x + y * y).ln().sin(),
            Self::Sin1 => y - x.sin(),
            Self::Sin2 => {
                let v = 1.0 + x.sin();
                (y - v).min(y + v)
            }
            Self::Sin3 => 1.0 + x.sin().min(y.sin()),
            Self::Sin4 => (x * y).sin(),
            Self::Dist1 => x * x + y * y,
            Self::Dist2 => x * x - y * y,
            Self::Dist3 => (x - y) * (x - y),
            Self::LogDist1 => (x * x + y * y).ln(),
            Self::LogDist2 => {
                let dx1 = (x - 1.0) * (x - 1.0);
                let dx2 = (x + 1.0) * (x + 1.0);
                let dy1 = (y - 1.0) * (y - 1.0);
                let dy2 = (y + 1.0) * (y + 1.0);
                (dx1 + dy1).min(dx1 + dy2).min((dx2 + dy1).min(dx2 + dy2)).ln()
            }
            Self::FloorDist => (x * x + y * y).floor(),
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::MinXy => "MIN_XY",
            Self::MaxXy => "MAX_XY",
            Self::AddXy => "ADD_XY",
            Self::SubXy => "SUB_XY",
            Self::MulXy => "MUL_XY",
            Self::DivXy => "DIV_XY",
            Self::LogXx => "LOG_XX",
            Self::Linear1 => "LINEAR_1",
            Self::Linear2 => "LINEAR_2",
            Self::Linear3 => "LINEAR_3",
            Self::Cubic1 => "CUBIC_1",
            Self::Cubic2 => "CUBIC_2",
            Self::Ring1 => "RING_1",
            Self::Ring2 => "RING_2",
            Self::Ring3 => "RING_3",
            Self::Ring4 => "RING_4",
            Self::Sin1 => "SIN_1",
            Self::Sin2 => "SIN_2",
            Self::Sin3 => "SIN_3",
            Self::Sin4 => "SIN_4",
            Self::Dist1 => "DIST_1",
            Self::Dist2 => "DIST_2",
            Self::Dist3 => "DIST_3",
            Self::LogDist1 => "LOG_DIST_1",
            Self::LogDist2 => "LOG_DIST_2",
            Self::FloorDist => "FLOOR_DIST",
        }
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DistanceFunction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Older configurations name the cross-shaped field "STINGS".
        if s.eq_ignore_ascii_case("STINGS") {
            return Ok(Self::Linear1);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownDistanceFunction(s.to_string()))
    }
}

impl TryFrom<String> for DistanceFunction {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DistanceFunction> for String {
    fn from(f: DistanceFunction) -> Self {
        f.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn ids_round_trip() {
        for f in DistanceFunction::ALL {
            assert_eq!(f.id().parse::<DistanceFunction>().unwrap(), f);
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = DistanceFunction::ALL.iter().map(|f| f.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DistanceFunction::ALL.len());
    }

    #[test]
    fn stings_alias() {
        assert_eq!(
            "STINGS".parse::<DistanceFunction>().unwrap(),
            DistanceFunction::Linear1
        );
        assert!("SPIRAL".parse::<DistanceFunction>().is_err());
    }

    #[test]
    fn serde_uses_ids() {
        let json = serde_json::to_string(&DistanceFunction::LogDist2).unwrap();
        assert_eq!(json, "\"LOG_DIST_2\"");
        let back: DistanceFunction = serde_json::from_str("\"ring_3\"").unwrap();
        assert_eq!(back, DistanceFunction::Ring3);
        assert!(serde_json::from_str::<DistanceFunction>("\"NOPE\"").is_err());
    }

    #[test]
    fn linear_fields_vanish_on_axes() {
        assert_eq!(DistanceFunction::Linear1.evaluate(0.0, 5.0), 0.0);
        assert_eq!(DistanceFunction::Linear1.evaluate(-3.0, 2.0), 2.0);
        assert_eq!(DistanceFunction::Linear2.evaluate(2.0, -2.0), 0.0);
        assert_eq!(DistanceFunction::Linear3.evaluate(3.0, 3.0), 0.0);
    }

    #[test]
    fn rings_vanish_on_unit_circle() {
        let (x, y) = (0.6, 0.8);
        assert!(DistanceFunction::Ring1.evaluate(x, y).abs() < EPSILON);
        assert!(DistanceFunction::Ring2.evaluate(x, y).abs() < EPSILON);
        assert!(DistanceFunction::Ring3.evaluate(x, y).abs() < EPSILON);
        assert!((DistanceFunction::Ring1.evaluate(0.0, 0.0) - 1.0).abs() < EPSILON);
        assert!((DistanceFunction::Ring3.evaluate(1.5, 0.0) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn division_by_zero_is_infinite() {
        assert_eq!(DistanceFunction::DivXy.evaluate(1.0, 0.0), f64::INFINITY);
        assert_eq!(DistanceFunction::DivXy.evaluate(1.0, 4.0), 0.25);
    }

    #[test]
    fn cubic_roots() {
        for x in [-1.0, 0.0, 1.0] {
            assert!(DistanceFunction::Cubic1.evaluate(x, 7.0).abs() < EPSILON);
        }
        assert!(DistanceFunction::Cubic2.evaluate(2.0, -6.0).abs() < EPSILON);
    }

    #[test]
    fn log_dist_vanishes_at_corners() {
        assert!(DistanceFunction::LogDist2.evaluate(1.0, -1.0).is_infinite());
        assert!((DistanceFunction::LogDist1.evaluate(1.0, 0.0)).abs() < EPSILON);
    }

    #[test]
    fn floor_dist_is_stepped() {
        assert_eq!(DistanceFunction::FloorDist.evaluate(1.0, 1.0), 2.0);
        assert_eq!(DistanceFunction::FloorDist.evaluate(0.5, 0.5), 0.0);
    }
}
