use frex_core::{
    DistanceFunction, Fractal, FractalKind, FractalParams, Orbit, OrbitFunction, Point, Region,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

/// Compute the shading value of every pixel of a region, row by row.
fn render_values(
    kind: FractalKind,
    region: &Region,
    decoration: Option<&OrbitFunction>,
) -> Vec<f32> {
    let fractal = kind.formula();
    let params = fractal.default_params();
    let mut orbit = Orbit::default();
    let mut values = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for py in 0..HEIGHT {
        for px in 0..WIDTH {
            let c = region.pixel_to_point(px as f64, py as f64, WIDTH, HEIGHT);
            let iter = fractal.compute_orbit(Point::ORIGIN, c, &params, &mut orbit);
            let value = match decoration {
                Some(f) => f.process_orbit(iter as usize, &orbit),
                None if iter < params.iter_max => iter as f32,
                None => 0.0,
            };
            values.push(value);
        }
    }
    values
}

#[test]
fn every_formula_renders_both_inside_and_outside() {
    for kind in [FractalKind::Mandelbrot, FractalKind::BurningShip, FractalKind::OddOnion] {
        let region = kind.formula().default_region();
        let values = render_values(kind, &region, None);
        assert_eq!(values.len(), (WIDTH * HEIGHT) as usize);
        let inside = values.iter().filter(|&&v| v == 0.0).count();
        assert!(inside > 0, "{kind} has no interior pixels");
        assert!(inside < values.len(), "{kind} has no escaping pixels");
    }
}

#[test]
fn nova_converges_everywhere_near_roots() {
    let fractal = FractalKind::Nova.formula();
    let params = FractalParams::new(100, 0.001).unwrap();
    let mut orbit = Orbit::default();
    for root in [-1.0, 0.0, 1.0] {
        let iter = fractal.compute_orbit(Point::new(root + 0.01, 0.0), Point::ORIGIN, &params, &mut orbit);
        assert!(iter < 20, "no convergence near root {root}: {iter}");
    }
}

#[test]
fn decorated_render_is_deterministic_and_bounded() {
    let region = FractalKind::Mandelbrot.formula().default_region();
    let decoration = OrbitFunction::new(
        DistanceFunction::Ring2,
        0.5,
        Point::new(0.1, -0.1),
        Some(frex_core::TurbulenceParams::new(0.3, 0.2).unwrap()),
    )
    .unwrap();

    let run1 = render_values(FractalKind::Mandelbrot, &region, Some(&decoration));
    let run2 = render_values(FractalKind::Mandelbrot, &region, Some(&decoration));
    assert_eq!(run1, run2);

    let iter_max = FractalKind::Mandelbrot.formula().default_iter_max() as f32;
    assert!(run1.iter().all(|&v| (0.0..=iter_max).contains(&v)));
    assert!(run1.iter().any(|&v| v > 0.0));
}

#[test]
fn zoomed_region_renders_a_subset_of_the_plane() {
    let region = FractalKind::Mandelbrot.formula().default_region();
    let zoomed = region
        .zoomed_about(WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0, 2.0, WIDTH, HEIGHT)
        .unwrap();
    assert_eq!(zoomed.center, region.center);
    assert!((zoomed.pixel_size(WIDTH, HEIGHT) * 2.0 - region.pixel_size(WIDTH, HEIGHT)).abs() < 1e-15);
}
