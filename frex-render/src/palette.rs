use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Length of the gradient table built from a color scheme.
pub const GRADIENT_COLOR_COUNT: usize = 1024;

// ---------------------------------------------------------------------------
// ARGB helpers
// ---------------------------------------------------------------------------

#[inline]
pub fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// An opaque color.
#[inline]
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    argb(0xff, r, g, b)
}

#[inline]
pub fn alpha(c: u32) -> u8 {
    (c >> 24) as u8
}

#[inline]
pub fn red(c: u32) -> u8 {
    (c >> 16) as u8
}

#[inline]
pub fn green(c: u32) -> u8 {
    (c >> 8) as u8
}

#[inline]
pub fn blue(c: u32) -> u8 {
    c as u8
}

// ---------------------------------------------------------------------------
// Color scheme
// ---------------------------------------------------------------------------

/// A color pinned at a position in `[0, 1]` along a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiePoint {
    pub position: f64,
    pub color: u32,
}

impl TiePoint {
    pub fn new(position: f64, color: u32) -> Self {
        Self { position, color }
    }
}

/// An ordered list of tie points from which gradient tables are built.
///
/// Serialized through its text form, `pos,#aarrggbb` entries joined by `;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorScheme {
    tie_points: Vec<TiePoint>,
}

impl ColorScheme {
    /// Create a scheme from at least two tie points with finite,
    /// non-decreasing positions in `[0, 1]`.
    pub fn new(tie_points: Vec<TiePoint>) -> crate::Result<Self> {
        if tie_points.len() < 2 {
            return Err(RenderError::InvalidPalette(format!(
                "need at least 2 tie points, got {}",
                tie_points.len()
            )));
        }
        let mut last = 0.0;
        for tp in &tie_points {
            if !(0.0..=1.0).contains(&tp.position) {
                return Err(RenderError::InvalidPalette(format!(
                    "tie point position {} outside [0, 1]",
                    tp.position
                )));
            }
            if tp.position < last {
                return Err(RenderError::InvalidPalette(format!(
                    "tie point position {} follows {last}",
                    tp.position
                )));
            }
            last = tp.position;
        }
        Ok(Self { tie_points })
    }

    /// Space `colors` evenly over `[0, 1]`.
    pub fn from_colors(colors: &[u32]) -> crate::Result<Self> {
        if colors.len() < 2 {
            return Err(RenderError::InvalidPalette(format!(
                "need at least 2 colors, got {}",
                colors.len()
            )));
        }
        Ok(evenly_spaced(colors))
    }

    pub fn tie_points(&self) -> &[TiePoint] {
        &self.tie_points
    }

    /// Sample the scheme at `count` evenly spaced positions `i / count`.
    pub fn gradient(&self, count: usize) -> Vec<u32> {
        let tps = &self.tie_points;
        let last = tps.len() - 1;
        let mut index = 0;
        (0..count)
            .map(|i| {
                let position = i as f64 / count as f64;
                while index < last && position > tps[index + 1].position {
                    index += 1;
                }
                if index < last {
                    interpolate(&tps[index], &tps[index + 1], position)
                } else {
                    tps[last].color
                }
            })
            .collect()
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

fn evenly_spaced(colors: &[u32]) -> ColorScheme {
    let span = (colors.len() - 1) as f64;
    ColorScheme {
        tie_points: colors
            .iter()
            .enumerate()
            .map(|(i, &color)| TiePoint::new(i as f64 / span, color))
            .collect(),
    }
}

/// Per-channel linear blend between two tie points, truncated to integers.
fn interpolate(tp1: &TiePoint, tp2: &TiePoint, position: f64) -> u32 {
    let span = tp2.position - tp1.position;
    if span <= 0.0 {
        return tp2.color;
    }
    let w = ((position - tp1.position) / span).clamp(0.0, 1.0);
    let channel = |c1: u8, c2: u8| -> u8 {
        let v = c1 as f64 + w * (c2 as f64 - c1 as f64);
        (v as i32).clamp(0, 255) as u8
    };
    let (c1, c2) = (tp1.color, tp2.color);
    argb(
        channel(alpha(c1), alpha(c2)),
        channel(red(c1), red(c2)),
        channel(green(c1), green(c2)),
        channel(blue(c1), blue(c2)),
    )
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tp) in self.tie_points.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{},#{:08x}", tp.position, tp.color)?;
        }
        Ok(())
    }
}

fn parse_color(s: &str) -> crate::Result<u32> {
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| RenderError::InvalidPalette(format!("color {s:?} must start with '#'")))?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RenderError::InvalidPalette(format!("invalid color {s:?}")));
    }
    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| RenderError::InvalidPalette(format!("invalid color {s:?}")))?;
    match hex.len() {
        8 => Ok(value),
        6 => Ok(0xff00_0000 | value),
        _ => Err(RenderError::InvalidPalette(format!(
            "color {s:?} must be #RRGGBB or #AARRGGBB"
        ))),
    }
}

impl FromStr for ColorScheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tie_points = s
            .split(';')
            .map(|entry| {
                let mut parts = entry.split(',');
                let (Some(pos), Some(color), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(RenderError::InvalidPalette(format!(
                        "tie point {entry:?} must be \"position,#color\""
                    )));
                };
                let position = pos.trim().parse::<f64>().map_err(|_| {
                    RenderError::InvalidPalette(format!("invalid position {:?}", pos.trim()))
                })?;
                Ok(TiePoint::new(position, parse_color(color.trim())?))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Self::new(tie_points)
    }
}

impl TryFrom<String> for ColorScheme {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColorScheme> for String {
    fn from(scheme: ColorScheme) -> Self {
        scheme.as_text()
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        evenly_spaced(HEAT)
    }
}

// ---------------------------------------------------------------------------
// Palette: scheme plus gradient table
// ---------------------------------------------------------------------------

/// A color scheme together with its [`GRADIENT_COLOR_COUNT`]-entry gradient
/// table, built once on construction and shared cheaply between renders.
///
/// Serializes as the scheme's text; deserializing rebuilds the table.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Palette {
    scheme: ColorScheme,
    gradient: Arc<[u32]>,
}

impl Palette {
    pub fn new(scheme: ColorScheme) -> Self {
        let gradient = scheme.gradient(GRADIENT_COLOR_COUNT).into();
        Self { scheme, gradient }
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    pub fn gradient(&self) -> &Arc<[u32]> {
        &self.gradient
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Palette").field(&self.scheme.as_text()).finish()
    }
}

impl TryFrom<String> for Palette {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Self::new(s.parse()?))
    }
}

impl From<Palette> for String {
    fn from(palette: Palette) -> Self {
        palette.scheme.as_text()
    }
}

// ---------------------------------------------------------------------------
// Built-in schemes
// ---------------------------------------------------------------------------

const BLACK: u32 = 0xff00_0000;
const WHITE: u32 = 0xffff_ffff;
const RED: u32 = 0xffff_0000;
const YELLOW: u32 = 0xffff_ff00;
const BLUE: u32 = 0xff00_00ff;
const ORANGE: u32 = 0xffff_8000;

const CLOUDS: &[u32] = &[
    0xff19191d, 0xff605f67, 0xff737486, 0xffb8a3a0, 0xff8d94b0, 0xffffc8a0, 0xfffefc8d,
    0xfffefec2,
];
const BRICKS: &[u32] = &[
    0xff120e05, 0xff363531, 0xff6d6960, 0xff6d6960, 0xffd2c9ac, 0xffd9c7a1, 0xff6d6960,
    0xff7d6b47, 0xfff5f2ed,
];
const EARTH: &[u32] = &[BLACK, 0xff5e331f, 0xfff0d6ab, WHITE];
const OCEAN: &[u32] = &[BLACK, 0xff03142e, 0xff8794a6, 0xff85a67a, WHITE];
const RAINBOW: &[u32] = &[RED, YELLOW, 0xff008000, BLUE, 0xff4b0082, 0xff9400d3];
const FIRE: &[u32] = &[BLACK, RED, YELLOW, WHITE, 0xff7f7fff];
const HEAT: &[u32] = &[BLACK, RED, YELLOW, WHITE];
const BLACK_AND_WHITE: &[u32] = &[BLACK, WHITE];
const METAL: &[u32] = &[BLACK, WHITE, 0xffaaaaaa, WHITE, 0xff444444, WHITE];
const SUNSET: &[u32] = &[BLACK, ORANGE, WHITE, 0xffff5a64, WHITE];

const BUILTIN: &[(&str, &[u32])] = &[
    ("CLOUDS", CLOUDS),
    ("BRICKS", BRICKS),
    ("EARTH", EARTH),
    ("OCEAN", OCEAN),
    ("RAINBOW", RAINBOW),
    ("FIRE", FIRE),
    ("HEAT", HEAT),
    ("BLACK_AND_WHITE", BLACK_AND_WHITE),
    ("METAL", METAL),
    ("SUNSET", SUNSET),
    ("ORANGE", &[BLACK, ORANGE, WHITE]),
    ("YELLOW", &[BLACK, YELLOW, WHITE]),
    ("RED", &[BLACK, RED, WHITE]),
    ("GREEN", &[BLACK, 0xff00ff00, WHITE]),
    ("BLUE", &[BLACK, BLUE, WHITE]),
];

/// All built-in schemes with their ids, in registry order.
pub fn builtin_schemes() -> Vec<(&'static str, ColorScheme)> {
    BUILTIN
        .iter()
        .map(|&(id, colors)| (id, evenly_spaced(colors)))
        .collect()
}

/// Look up a built-in scheme by id, ignoring case.
pub fn builtin_scheme(id: &str) -> Option<ColorScheme> {
    BUILTIN
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(id.trim()))
        .map(|&(_, colors)| evenly_spaced(colors))
}

// ---------------------------------------------------------------------------
// Color mapping
// ---------------------------------------------------------------------------

/// Maps a shading value to an entry of a gradient table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMapping {
    pub gain: f64,
    pub offset: f64,
    /// Mirror the gradient back and forth instead of clamping at its end.
    pub repeat: bool,
}

impl ColorMapping {
    /// Index into a gradient of `n` entries, or `None` for a value that has
    /// not been computed.
    #[inline]
    pub fn index(&self, value: f32, n: usize) -> Option<usize> {
        if value.is_nan() || value < 0.0 || n == 0 {
            return None;
        }
        let raw = (self.gain * value as f64 * n as f64 + self.offset).floor();
        // NaN and negatives saturate to 0.
        let k = if raw > 0.0 { raw as u64 } else { 0 };
        let n = n as u64;
        let k = if self.repeat {
            let k = k % (2 * n);
            if k >= n {
                2 * n - k - 1
            } else {
                k
            }
        } else {
            k.min(n - 1)
        };
        Some(k as usize)
    }

    /// The color for `value`, or 0 (transparent black) when not computed.
    #[inline]
    pub fn color(&self, value: f32, gradient: &[u32]) -> u32 {
        match self.index(value, gradient.len()) {
            Some(i) => gradient[i],
            None => 0,
        }
    }
}

impl Default for ColorMapping {
    fn default() -> Self {
        Self {
            gain: 1.0,
            offset: 0.0,
            repeat: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
