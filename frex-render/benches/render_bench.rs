use std::sync::{mpsc, Arc, Mutex};

use criterion::{criterion_group, criterion_main, Criterion};

use frex_core::{FractalKind, Point, Region};
use frex_render::{
    recycle, ColorQuantizer, Generator, Image, ProgressListener, RenderConfig, Reprojection,
};

struct Done(Mutex<mpsc::Sender<bool>>);

impl ProgressListener for Done {
    fn on_stopped(&self, cancelled: bool) {
        let _ = self.0.lock().unwrap().send(cancelled);
    }
}

fn generator(config: RenderConfig) -> (Generator, mpsc::Receiver<bool>) {
    let (tx, rx) = mpsc::channel();
    let generator = Generator::new(config, 0, Arc::new(Done(Mutex::new(tx)))).unwrap();
    (generator, rx)
}

fn run(generator: &Generator, rx: &mpsc::Receiver<bool>, image: &Arc<Image>, colors_only: bool) {
    generator.start(Arc::clone(image), colors_only);
    rx.recv().unwrap();
}

fn bench_full_frame_render(c: &mut Criterion) {
    let (generator, rx) = generator(RenderConfig::default());
    let image = Arc::new(Image::new(640, 480).unwrap());

    c.bench_function("full_frame_640x480", |b| {
        b.iter(|| {
            image.invalidate();
            run(&generator, &rx, &image, false);
        });
    });
}

fn bench_deep_zoom(c: &mut Criterion) {
    let mut config = RenderConfig::for_fractal(FractalKind::BurningShip);
    config.region = Region::new(Point::new(-1.7615, -0.0285), 0.005).unwrap();
    config.iter_max = 1000;
    let (generator, rx) = generator(config);
    let image = Arc::new(Image::new(256, 256).unwrap());

    c.bench_function("burning_ship_256x256_1000iter", |b| {
        b.iter(|| {
            image.invalidate();
            run(&generator, &rx, &image, false);
        });
    });
}

fn bench_decorated(c: &mut Criterion) {
    let mut config = RenderConfig::default();
    config.decorated = true;
    config.turbulence = true;
    let (generator, rx) = generator(config);
    let image = Arc::new(Image::new(320, 240).unwrap());

    c.bench_function("decorated_turbulent_320x240", |b| {
        b.iter(|| {
            image.invalidate();
            run(&generator, &rx, &image, false);
        });
    });
}

fn bench_recolor(c: &mut Criterion) {
    let (generator, rx) = generator(RenderConfig::default());
    let image = Arc::new(Image::new(640, 480).unwrap());
    run(&generator, &rx, &image, false);

    c.bench_function("recolor_640x480", |b| {
        b.iter(|| run(&generator, &rx, &image, true));
    });
}

fn bench_recycle(c: &mut Criterion) {
    let config = RenderConfig::default();
    let (generator, rx) = generator(config.clone());
    let old = Arc::new(Image::new(640, 480).unwrap());
    run(&generator, &rx, &old, false);
    let new = Image::new(640, 480).unwrap();
    let to = config
        .region
        .zoomed_about(200.0, 150.0, 1.5, 640, 480)
        .unwrap();
    let zoom = Reprojection::Zoom {
        from: config.region,
        to,
    };

    c.bench_function("recycle_zoom_640x480", |b| {
        b.iter(|| recycle(&old, &new, &zoom));
    });
}

fn bench_quantize(c: &mut Criterion) {
    let (generator, rx) = generator(RenderConfig::default());
    let image = Arc::new(Image::new(320, 240).unwrap());
    run(&generator, &rx, &image, false);
    let pixels = image.colors();

    c.bench_function("quantize_8_clusters_320x240", |b| {
        b.iter(|| {
            ColorQuantizer::default()
                .with_seed(1)
                .quantize(&pixels, |_, _, _| {})
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_deep_zoom,
    bench_decorated,
    bench_recolor,
    bench_recycle,
    bench_quantize
);
criterion_main!(benches);
