use criterion::{black_box, criterion_group, criterion_main, Criterion};
use asclepius::classifier::normalize::normalize_with_orientation;
use asclepius::classifier::result::rank_categories;
use asclepius::classifier::tensor::image_to_tensor;
use asclepius::{ClassifierOptions, OrientationTag, RasterImage, TensorLayout};
use image::{DynamicImage, Rgb, RgbImage};

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalize");

    // Configure sampling
    group.sample_size(30);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let sizes = [("vga", (640, 480)), ("hd", (1280, 720)), ("12mp", (4000, 3000))];
    for (name, (width, height)) in sizes {
        let image = photo(width, height);
        group.bench_function(format!("resize_rotate_{}", name), |b| b.iter(|| {
            normalize_with_orientation(
                RasterImage::new(black_box(image.clone())),
                (224, 224),
                OrientationTag::Rotate90,
            )
        }));
    }

    group.finish();
}

fn bench_tensor(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tensor");
    group.sample_size(50);

    let image = photo(224, 224);
    for layout in [TensorLayout::Nchw, TensorLayout::Nhwc] {
        group.bench_function(format!("{:?}", layout), |b| b.iter(|| {
            image_to_tensor(black_box(&image), (224, 224), layout)
        }));
    }

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let options = ClassifierOptions::default();
    let labels: Vec<String> = (0..1000).map(|i| format!("class_{}", i)).collect();
    let scores: Vec<f32> = (0..1000).map(|i| ((i * 7919) % 1000) as f32 / 1000.0).collect();

    c.bench_function("rank_1000_labels", |b| b.iter(|| {
        rank_categories(black_box(&scores), &labels, &options)
    }));
}

criterion_group!(
    benches,
    bench_normalize,
    bench_tensor,
    bench_ranking
);
criterion_main!(benches);
