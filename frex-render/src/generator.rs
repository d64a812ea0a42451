use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info};

use frex_core::{
    BurningShip, Fractal, FractalKind, FractalParams, Mandelbrot, Nova, OddOnion, Orbit,
    OrbitFunction, Point, Region,
};

use crate::config::RenderConfig;
use crate::image::Image;
use crate::palette::ColorMapping;

/// Rows a worker completes between two progress reports.
pub const REPORT_INTERVAL: u32 = 16;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Receives progress from a running generator.
///
/// `on_started` is called on the thread that calls [`Generator::start`];
/// the other callbacks arrive on worker threads.
pub trait ProgressListener: Send + Sync {
    fn on_started(&self, _num_tasks: usize) {}

    /// Rows `first_row..=last_row` of band `task_id` are finished.
    fn on_some_lines_computed(&self, _task_id: usize, _first_row: u32, _last_row: u32) {}

    /// Called exactly once per run, after every worker has returned.
    fn on_stopped(&self, cancelled: bool);
}

// ---------------------------------------------------------------------------
// Cancellation and state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Default)]
struct Control {
    generation: AtomicU64,
    /// Generation of the latest run and that run's state.
    state: Mutex<(u64, GeneratorState)>,
    rows_done: AtomicUsize,
    rows_total: AtomicUsize,
}

/// Cancels and observes the runs of one generator from any thread.
///
/// Each run is tagged with a generation number. Advancing the generation
/// tells every in-flight worker to stop at its next row.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<Control>,
}

impl CancelHandle {
    /// Cancel the current run, if any. Returns immediately.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    #[inline]
    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Rows finished and rows in total for the latest run.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.inner.rows_done.load(Ordering::Relaxed),
            self.inner.rows_total.load(Ordering::Relaxed),
        )
    }

    pub fn state(&self) -> GeneratorState {
        self.lock_state().1
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, (u64, GeneratorState)> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel whatever is running and open a new run over `rows_total` rows.
    fn begin_run(&self, rows_total: usize) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.lock_state() = (generation, GeneratorState::Running);
        self.inner.rows_total.store(rows_total, Ordering::Relaxed);
        self.inner.rows_done.store(0, Ordering::Relaxed);
        generation
    }

    fn add_rows(&self, generation: u64, rows: usize) {
        if self.is_current(generation) {
            self.inner.rows_done.fetch_add(rows, Ordering::Relaxed);
        }
    }

    /// Record the outcome of run `generation` unless a newer run replaced it.
    fn end_run(&self, generation: u64, cancelled: bool) {
        let mut state = self.lock_state();
        if state.0 == generation {
            state.1 = if cancelled {
                GeneratorState::Cancelled
            } else {
                GeneratorState::Completed
            };
        }
    }
}

// ---------------------------------------------------------------------------
// Render pass snapshot
// ---------------------------------------------------------------------------

/// Immutable per-run snapshot of everything the workers read.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub fractal: FractalKind,
    pub params: FractalParams,
    pub region: Region,
    pub width: u32,
    pub height: u32,
    pub pixel_size: f64,
    pub upper_left: Point,
    /// Julia constant, when rendering in Julia mode.
    pub julia: Option<Point>,
    /// Orbit decoration, when shading by distance field.
    pub decoration: Option<OrbitFunction>,
    pub gradient: Arc<[u32]>,
    pub mapping: ColorMapping,
}

impl RenderPass {
    pub fn new(config: &RenderConfig, width: u32, height: u32) -> crate::Result<Self> {
        let orbit_function = config.orbit_function()?;
        Ok(Self::with_orbit_function(config, orbit_function, width, height))
    }

    fn with_orbit_function(
        config: &RenderConfig,
        orbit_function: OrbitFunction,
        width: u32,
        height: u32,
    ) -> Self {
        let region = config.region;
        let pixel_size = region.pixel_size(width, height);
        Self {
            fractal: config.fractal,
            params: config.params(),
            region,
            width,
            height,
            pixel_size,
            upper_left: Point::new(
                region.upper_left_x(width, pixel_size),
                region.upper_left_y(height, pixel_size),
            ),
            julia: config.julia_mode.then_some(config.julia),
            decoration: config.decorated.then_some(orbit_function),
            gradient: Arc::clone(config.gradient()),
            mapping: config.color_mapping(),
        }
    }

    /// Shading value of plane point `z`.
    #[inline]
    pub fn compute_value<F: Fractal>(&self, fractal: &F, z: Point, orbit: &mut Orbit) -> f32 {
        let (init, constant) = match self.julia {
            Some(c) => (z, c),
            None => (Point::ORIGIN, z),
        };
        let iter = fractal.compute_orbit(init, constant, &self.params, orbit);
        match &self.decoration {
            Some(f) => f.process_orbit(iter as usize, orbit),
            None if iter < self.params.iter_max => iter as f32,
            None => 0.0,
        }
    }

    #[inline]
    pub fn color(&self, value: f32) -> u32 {
        self.mapping.color(value, &self.gradient)
    }

    /// Compute the missing pixels of row `y`, recoloring the others when
    /// `colors_only` is set.
    fn fill_row<F: Fractal>(
        &self,
        fractal: &F,
        image: &Image,
        y: u32,
        colors_only: bool,
        orbit: &mut Orbit,
    ) {
        let ps = self.pixel_size;
        let zy = self.upper_left.y - y as f64 * ps;
        let row = image.index(0, y);
        for x in 0..self.width {
            let i = row + x as usize;
            if !image.is_computed(i) {
                let z = Point::new(self.upper_left.x + x as f64 * ps, zy);
                let value = self.compute_value(fractal, z, orbit);
                image.set_pixel(i, self.color(value), value);
            } else if colors_only {
                image.set_color(i, self.color(image.value(i)));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

/// Split `height` rows into `min(num_tasks, height)` contiguous bands whose
/// sizes differ by at most one; the first `height % n` bands are larger.
pub fn band_rows(height: u32, num_tasks: usize) -> Vec<Range<u32>> {
    let n = (num_tasks.max(1) as u64).min(height as u64) as u32;
    if n == 0 {
        return Vec::new();
    }
    let base = height / n;
    let extra = height % n;
    let mut start = 0;
    (0..n)
        .map(|i| {
            let len = base + u32::from(i < extra);
            let band = start..start + len;
            start += len;
            band
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// State shared by the workers of one run.
struct Run {
    generation: u64,
    pass: RenderPass,
    image: Arc<Image>,
    colors_only: bool,
    listener: Arc<dyn ProgressListener>,
    control: CancelHandle,
    remaining: AtomicUsize,
    started: Instant,
}

impl Run {
    /// Fill one band, reporting finished rows every [`REPORT_INTERVAL`]
    /// rows and once more for any remainder.
    fn fill_band<F: Fractal>(&self, fractal: &F, task: usize, rows: Range<u32>) {
        let mut orbit = Orbit::new(self.pass.params.iter_max as usize);
        let mut unreported = rows.start;
        let mut next = rows.start;
        for y in rows {
            if !self.control.is_current(self.generation) {
                break;
            }
            self.pass
                .fill_row(fractal, &self.image, y, self.colors_only, &mut orbit);
            self.control.add_rows(self.generation, 1);
            next = y + 1;
            if next - unreported == REPORT_INTERVAL {
                self.listener.on_some_lines_computed(task, unreported, y);
                unreported = next;
            }
        }
        if unreported < next {
            self.listener.on_some_lines_computed(task, unreported, next - 1);
        }
    }

    fn run_band(&self, task: usize, rows: Range<u32>) {
        match self.pass.fractal {
            FractalKind::Mandelbrot => self.fill_band(&Mandelbrot, task, rows),
            FractalKind::BurningShip => self.fill_band(&BurningShip, task, rows),
            FractalKind::OddOnion => self.fill_band(&OddOnion, task, rows),
            FractalKind::Nova => self.fill_band(&Nova, task, rows),
        }
    }

    fn finish(&self) {
        let cancelled = !self.control.is_current(self.generation);
        self.control.end_run(self.generation, cancelled);
        info!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            cancelled, "Render complete"
        );
        self.listener.on_stopped(cancelled);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Body of one pool task: fill the band, then count down.
fn band_task(run: Arc<Run>, task: usize, rows: Range<u32>) {
    let band = rows.clone();
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run.run_band(task, rows))) {
        error!(
            task,
            first_row = band.start,
            last_row = band.end.saturating_sub(1),
            message = panic_message(payload.as_ref()),
            "Render worker panicked"
        );
    }
    // AcqRel: the last worker sees every other worker's pixel writes.
    if run.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
        run.finish();
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

fn build_pool(num_tasks: usize) -> crate::Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(num_tasks)
        .thread_name(|i| format!("frex-worker-{i}"))
        .build()?)
}

/// `0` means one task per available CPU.
fn effective_tasks(num_tasks: usize) -> usize {
    if num_tasks > 0 {
        return num_tasks;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fills images in parallel on a dedicated worker pool.
///
/// Each `start()` splits the image into horizontal bands, one per task, and
/// returns at once. Completion is signalled through the
/// [`ProgressListener`]; a new `start()` or a `cancel()` stops the
/// previous run at row granularity.
pub struct Generator {
    config: RenderConfig,
    orbit_function: OrbitFunction,
    num_tasks: usize,
    pool: ThreadPool,
    listener: Arc<dyn ProgressListener>,
    control: CancelHandle,
}

impl Generator {
    pub fn new(
        config: RenderConfig,
        num_tasks: usize,
        listener: Arc<dyn ProgressListener>,
    ) -> crate::Result<Self> {
        config.validate()?;
        let orbit_function = config.orbit_function()?;
        let num_tasks = effective_tasks(num_tasks);
        let pool = build_pool(num_tasks)?;
        debug!(num_tasks, "Generator created");
        Ok(Self {
            config,
            orbit_function,
            num_tasks,
            pool,
            listener,
            control: CancelHandle::default(),
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replace the configuration used by the next `start()`.
    pub fn set_config(&mut self, config: RenderConfig) -> crate::Result<()> {
        config.validate()?;
        self.orbit_function = config.orbit_function()?;
        self.config = config;
        Ok(())
    }

    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    /// Rebuild the worker pool. A run in progress finishes on the old pool.
    pub fn set_num_tasks(&mut self, num_tasks: usize) -> crate::Result<()> {
        let num_tasks = effective_tasks(num_tasks);
        if num_tasks != self.num_tasks {
            self.pool = build_pool(num_tasks)?;
            self.num_tasks = num_tasks;
        }
        Ok(())
    }

    /// Start filling `image`, cancelling any run in progress.
    ///
    /// Pixels that are already computed are skipped; with `colors_only`
    /// they are recolored from their stored value instead. Returns
    /// immediately after `on_started`.
    pub fn start(&self, image: Arc<Image>, colors_only: bool) {
        let generation = self.control.begin_run(image.height() as usize);
        let pass = RenderPass::with_orbit_function(
            &self.config,
            self.orbit_function,
            image.width(),
            image.height(),
        );
        let bands = band_rows(image.height(), self.num_tasks);
        debug!(
            tasks = bands.len(),
            width = image.width(),
            height = image.height(),
            colors_only,
            "Starting render"
        );
        self.listener.on_started(bands.len());

        let run = Arc::new(Run {
            generation,
            pass,
            image,
            colors_only,
            listener: Arc::clone(&self.listener),
            control: self.control.clone(),
            remaining: AtomicUsize::new(bands.len()),
            started: Instant::now(),
        });
        for (task, rows) in bands.into_iter().enumerate() {
            let run = Arc::clone(&run);
            self.pool.spawn(move || band_task(run, task, rows));
        }
    }

    /// Stop the current run at the workers' next row. Returns immediately.
    pub fn cancel(&self) {
        debug!(generation = self.control.generation(), "Cancelling render");
        self.control.cancel();
    }

    pub fn state(&self) -> GeneratorState {
        self.control.state()
    }

    /// `(rows_done, rows_total)` of the latest run.
    pub fn progress(&self) -> (usize, usize) {
        self.control.progress()
    }

    /// A handle that can cancel or observe this generator from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.control.clone()
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.control.cancel();
    }
}
