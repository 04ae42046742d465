use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orb_core::{Image, ImageLevel, OrbConfig};
use orb_fast::{GridCornerDetector, ImagePyramid, OrientationEstimator};

/// Create benchmark image with realistic corner patterns
fn create_benchmark_image(width: usize, height: usize) -> Image {
    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let gradient = ((x as f32 / width as f32) * 50.0) as u8;
            let noise = ((x * 7 + y * 13) % 11) as u8;
            img[y * width + x] = 100 + gradient + noise;
        }
    }

    // Scatter small checkered blocks so every cell has structure
    for i in 0..(width * height / 900) {
        let cx = 20 + (i * 37) % (width - 40);
        let cy = 20 + (i * 53) % (height - 40);
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let x = (cx as i32 + dx) as usize;
                let y = (cy as i32 + dy) as usize;
                img[y * width + x] = if (dx + dy) % 2 == 0 { 30 } else { 230 };
            }
        }
    }
    img
}

fn create_test_config() -> OrbConfig {
    OrbConfig {
        n_threads: 1, // Single-threaded for consistent benchmarks
        ..OrbConfig::default()
    }
}

/// Benchmark grid detection on one level
fn bench_grid_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_detection");
    let grid = GridCornerDetector::new(&create_test_config()).unwrap();

    for &(width, height) in &[(128, 128), (320, 240), (640, 480)] {
        let level = ImageLevel::base(create_benchmark_image(width, height), width, height).unwrap();
        group.bench_with_input(
            BenchmarkId::new("extract_level", format!("{}x{}", width, height)),
            &level,
            |b, level| b.iter(|| black_box(grid.extract_level(black_box(level)))),
        );
    }

    group.finish();
}

/// Benchmark pyramid construction and detection over all levels
fn bench_multiscale(c: &mut Criterion) {
    let (width, height) = (640, 480);
    let cfg = create_test_config();
    let img = create_benchmark_image(width, height);
    let pyramid = ImagePyramid::new(cfg.n_levels, cfg.scale_factor, cfg.n_features).unwrap();
    let grid = GridCornerDetector::new(&cfg).unwrap();

    let mut group = c.benchmark_group("multiscale");

    group.bench_function("build_pyramid", |b| {
        b.iter(|| black_box(pyramid.build(black_box(&img), width, height).unwrap()))
    });

    let levels = pyramid.build(&img, width, height).unwrap();
    group.bench_function("extract_all_levels", |b| {
        b.iter(|| black_box(grid.extract(black_box(&levels))))
    });

    group.finish();
}

/// Benchmark orientation computation
fn bench_orientation(c: &mut Criterion) {
    let (width, height) = (320, 240);
    let level = ImageLevel::base(create_benchmark_image(width, height), width, height).unwrap();
    let grid = GridCornerDetector::new(&create_test_config()).unwrap();
    let estimator = OrientationEstimator::new(15).unwrap();
    let keypoints = grid.extract_level(&level);

    let mut group = c.benchmark_group("orientation");

    if let Some(kp) = keypoints.first() {
        group.bench_function("single_point", |b| {
            b.iter(|| black_box(estimator.orientation(black_box(&level), black_box(kp)).unwrap()))
        });
    }

    group.bench_function("whole_level", |b| {
        b.iter(|| {
            let mut kps = keypoints.clone();
            estimator.compute_level(black_box(&level), &mut kps).unwrap();
            black_box(kps)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_grid_detection, bench_multiscale, bench_orientation);
criterion_main!(benches);
