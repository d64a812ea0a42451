//! Headless renderer: builds a [`RenderConfig`], runs the generator and
//! writes the result as a PNG.

mod export;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use tracing::{debug, error, info, warn};

use frex_core::{DistanceFunction, FractalKind, Point};
use frex_render::{
    builtin_scheme, ColorScheme, Generator, Image, ProgressListener, RenderConfig, Reprojection,
};

#[derive(Parser, Debug)]
#[command(name = "frex", version, about = "Render escape-time fractals to PNG")]
struct Args {
    /// JSON render configuration to start from.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Formula id (MANDELBROT, BURNING_SHIP, ODD_ONION, NOVA).
    #[arg(long)]
    fractal: Option<FractalKind>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Worker tasks; 0 uses one per available core.
    #[arg(long, default_value_t = 0)]
    tasks: usize,

    #[arg(long)]
    iter_max: Option<u32>,

    /// Shade by orbit decoration instead of escape time.
    #[arg(long)]
    decorated: bool,

    #[arg(long)]
    distance: Option<DistanceFunction>,

    /// Built-in scheme id, or a scheme in `pos,#aarrggbb;...` form.
    #[arg(long)]
    scheme: Option<String>,

    /// Julia constant as `X,Y`; switches to Julia mode.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    julia: Option<Point>,

    /// After the first pass, zoom about the centre by this factor and
    /// render again, reusing pixels where possible.
    #[arg(long)]
    zoom: Option<f64>,

    #[arg(long, default_value = "frex.png")]
    output: PathBuf,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let Some((x, y)) = s.split_once(',') else {
        return Err(format!("expected X,Y but got '{s}'"));
    };
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(Point::new(x, y))
}

fn resolve_scheme(s: &str) -> frex_render::Result<ColorScheme> {
    match builtin_scheme(s) {
        Some(scheme) => Ok(scheme),
        None => s.parse(),
    }
}

/// Start from `--config` (or the formula defaults) and apply the overrides.
fn build_config(args: &Args) -> Result<RenderConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let mut config: RenderConfig = serde_json::from_str(&text)?;
            if let Some(kind) = args.fractal {
                config.fractal = kind;
            }
            config
        }
        None => RenderConfig::for_fractal(args.fractal.unwrap_or_default()),
    };

    if let Some(iter_max) = args.iter_max {
        config.iter_max = iter_max;
    }
    if args.decorated {
        config.decorated = true;
    }
    if let Some(distance) = args.distance {
        config.distance = distance;
    }
    if let Some(scheme) = &args.scheme {
        config.set_color_scheme(resolve_scheme(scheme)?);
    }
    if let Some(julia) = args.julia {
        config.julia_mode = true;
        config.julia = julia;
    }

    if let Err(e) = config.validate() {
        warn!(error = %e, "Invalid render configuration");
        return Err(e.into());
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Logs progress and hands `on_stopped` to the waiting main thread.
struct ChannelListener {
    rows: AtomicU32,
    stopped: Mutex<mpsc::Sender<bool>>,
}

impl ProgressListener for ChannelListener {
    fn on_started(&self, num_tasks: usize) {
        self.rows.store(0, Ordering::Relaxed);
        debug!(num_tasks, "Render started");
    }

    fn on_some_lines_computed(&self, task_id: usize, first_row: u32, last_row: u32) {
        let rows = self.rows.fetch_add(last_row - first_row + 1, Ordering::Relaxed);
        debug!(task_id, first_row, last_row, rows, "Lines computed");
    }

    fn on_stopped(&self, cancelled: bool) {
        if let Ok(tx) = self.stopped.lock() {
            let _ = tx.send(cancelled);
        }
    }
}

fn render(
    generator: &Generator,
    done: &mpsc::Receiver<bool>,
    image: &Arc<Image>,
) -> Result<(), Box<dyn Error>> {
    let t0 = Instant::now();
    generator.start(Arc::clone(image), false);
    if done.recv()? {
        return Err("render was cancelled".into());
    }
    info!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        computed = image.computed_count(),
        "Pass finished"
    );
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = build_config(&args)?;
    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let (width, height) = (args.width, args.height);
    let (tx, done) = mpsc::channel();
    let listener = Arc::new(ChannelListener {
        rows: AtomicU32::new(0),
        stopped: Mutex::new(tx),
    });
    let mut generator = Generator::new(config.clone(), args.tasks, listener)?;
    info!(
        fractal = %config.fractal,
        width,
        height,
        tasks = generator.num_tasks(),
        "Rendering"
    );

    let mut image = Arc::new(Image::new(width, height)?);
    render(&generator, &done, &image)?;

    if let Some(factor) = args.zoom {
        let from = config.region;
        let to = from.zoomed_about(width as f64 / 2.0, height as f64 / 2.0, factor, width, height)?;
        let next = image.recycled(&Reprojection::Zoom { from, to }, width, height)?;
        info!(
            factor,
            reused = next.computed_count(),
            total = next.len(),
            "Recycled pixels after zoom"
        );
        config.region = to;
        generator.set_config(config.clone())?;
        image = Arc::new(next);
        render(&generator, &done, &image)?;
    }

    export::write_png(&image, &config, &args.output)?;
    info!(path = %args.output.display(), "Saved image");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
