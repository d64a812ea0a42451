use std::sync::Arc;

use serde::{Deserialize, Serialize};

use frex_core::{
    DistanceFunction, Fractal, FractalKind, FractalParams, OrbitFunction, Point, Region,
    TurbulenceParams,
};

use crate::palette::{ColorMapping, ColorScheme, Palette};

/// Everything a render pass needs to know about what to draw.
///
/// The generator takes an immutable snapshot of this at `start()`, so
/// editing a config never affects a run in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub fractal: FractalKind,
    pub region: Region,
    pub iter_max: u32,
    pub bail_out: f64,

    /// Iterate with [`julia`](Self::julia) as the constant and the pixel as
    /// the starting point.
    #[serde(default)]
    pub julia_mode: bool,
    #[serde(default)]
    pub julia: Point,

    /// Shade by orbit decoration instead of escape time.
    #[serde(default)]
    pub decorated: bool,
    #[serde(default)]
    pub distance: DistanceFunction,
    #[serde(default = "default_dilation")]
    pub dilation: f64,
    #[serde(default)]
    pub translate: Point,
    #[serde(default)]
    pub turbulence: bool,
    #[serde(default = "default_turbulence_intensity")]
    pub turbulence_intensity: f64,
    #[serde(default = "default_turbulence_scale")]
    pub turbulence_scale: f64,

    #[serde(default, rename = "color_scheme")]
    palette: Palette,
    #[serde(default = "default_color_gain")]
    pub color_gain: f64,
    #[serde(default)]
    pub color_offset: f64,
    #[serde(default = "default_true")]
    pub color_repeat: bool,
}

fn default_dilation() -> f64 {
    0.2
}

fn default_turbulence_intensity() -> f64 {
    0.5
}

fn default_turbulence_scale() -> f64 {
    0.25
}

fn default_color_gain() -> f64 {
    0.01
}

fn default_true() -> bool {
    true
}

impl RenderConfig {
    /// Defaults for `kind`: its home region and iteration limits, the HEAT
    /// scheme, one gradient pass over the iteration range.
    pub fn for_fractal(kind: FractalKind) -> Self {
        let formula = kind.formula();
        let iter_max = formula.default_iter_max();
        Self {
            fractal: kind,
            region: formula.default_region(),
            iter_max,
            bail_out: formula.default_bail_out(),
            julia_mode: false,
            julia: Point::ORIGIN,
            decorated: false,
            distance: DistanceFunction::default(),
            dilation: default_dilation(),
            translate: Point::ORIGIN,
            turbulence: false,
            turbulence_intensity: default_turbulence_intensity(),
            turbulence_scale: default_turbulence_scale(),
            palette: Palette::default(),
            color_gain: 1.0 / iter_max as f64,
            color_offset: 0.0,
            color_repeat: true,
        }
    }

    /// Return the first violated invariant, if any.
    pub fn validate(&self) -> crate::Result<()> {
        self.region.validate()?;
        self.params().validate()?;
        self.orbit_function()?;
        Ok(())
    }

    pub fn formula(&self) -> &'static dyn Fractal {
        self.fractal.formula()
    }

    pub fn params(&self) -> FractalParams {
        FractalParams {
            iter_max: self.iter_max,
            bail_out: self.bail_out,
        }
    }

    pub fn turbulence_params(&self) -> Option<TurbulenceParams> {
        self.turbulence.then_some(TurbulenceParams {
            intensity: self.turbulence_intensity,
            scale: self.turbulence_scale,
        })
    }

    pub fn orbit_function(&self) -> frex_core::Result<OrbitFunction> {
        OrbitFunction::new(
            self.distance,
            self.dilation,
            self.translate,
            self.turbulence_params(),
        )
    }

    pub fn color_mapping(&self) -> ColorMapping {
        ColorMapping {
            gain: self.color_gain,
            offset: self.color_offset,
            repeat: self.color_repeat,
        }
    }

    pub fn color_scheme(&self) -> &ColorScheme {
        self.palette.scheme()
    }

    /// Replace the color scheme and rebuild the gradient table.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.palette = Palette::new(scheme);
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn gradient(&self) -> &Arc<[u32]> {
        self.palette.gradient()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::for_fractal(FractalKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{builtin_scheme, GRADIENT_COLOR_COUNT};

    #[test]
    fn defaults_follow_formula() {
        let c = RenderConfig::for_fractal(FractalKind::OddOnion);
        assert_eq!(c.iter_max, 150);
        assert_eq!(c.bail_out, 100.0);
        assert_eq!(c.region.center, Point::new(-0.5, 0.0));
        assert!((c.color_gain - 1.0 / 150.0).abs() < 1e-15);
        assert!(c.color_repeat);
        assert!(c.validate().is_ok());
        assert_eq!(c.gradient().len(), GRADIENT_COLOR_COUNT);
    }

    #[test]
    fn validate_reports_bad_fields() {
        let mut c = RenderConfig::default();
        c.iter_max = 0;
        assert!(c.validate().is_err());

        let mut c = RenderConfig::default();
        c.region.radius = -1.0;
        assert!(c.validate().is_err());

        let mut c = RenderConfig::default();
        c.dilation = 0.0;
        assert!(c.validate().is_err());

        let mut c = RenderConfig::default();
        c.turbulence = true;
        c.turbulence_scale = 0.0;
        assert!(c.validate().is_err());
        c.turbulence = false;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn scheme_change_rebuilds_gradient() {
        let mut c = RenderConfig::default();
        let before = c.gradient().clone();
        c.set_color_scheme(builtin_scheme("OCEAN").unwrap());
        assert_ne!(c.gradient(), &before);
        assert_eq!(c.gradient()[0], 0xff000000);
    }

    #[test]
    fn json_round_trip() {
        let mut c = RenderConfig::for_fractal(FractalKind::Nova);
        c.julia_mode = true;
        c.julia = Point::new(-0.8, 0.156);
        c.decorated = true;
        c.distance = DistanceFunction::Ring2;
        c.turbulence = true;
        c.set_color_scheme(builtin_scheme("CLOUDS").unwrap());

        let json = serde_json::to_string_pretty(&c).unwrap();
        assert!(json.contains("\"RING_2\""));
        assert!(json.contains("\"NOVA\""));
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.gradient(), c.gradient());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{
            "region": { "center": { "x": 0.0, "y": 0.0 }, "radius": 2.0 },
            "iter_max": 50,
            "bail_out": 4.0
        }"#;
        let c: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.fractal, FractalKind::Mandelbrot);
        assert_eq!(c.dilation, 0.2);
        assert_eq!(c.color_scheme(), &ColorScheme::default());
        assert!(c.color_repeat);
    }

    #[test]
    fn invalid_scheme_text_fails_to_load() {
        let json = r#"{
            "region": { "center": { "x": 0.0, "y": 0.0 }, "radius": 2.0 },
            "iter_max": 50,
            "bail_out": 4.0,
            "color_scheme": "0,#000000"
        }"#;
        assert!(serde_json::from_str::<RenderConfig>(json).is_err());
    }
}
