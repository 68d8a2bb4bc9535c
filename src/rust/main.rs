use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use asclepius::{
    AssetManager, BundledModel, ClassifierOptions, ImageClassifierHelper, ImageReference,
};
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Images to classify (paths or file:// URIs)
    #[arg(required = true)]
    images: Vec<String>,

    /// Directory holding the bundled model and its labels
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Use this ONNX model instead of the bundled one (requires --labels)
    #[arg(short, long, requires = "labels")]
    model: Option<PathBuf>,

    /// Label file for --model, one label per line
    #[arg(short, long, requires = "model")]
    labels: Option<PathBuf>,

    /// Minimum score a category must reach
    #[arg(long, default_value_t = 0.2)]
    threshold: f32,

    /// Number of categories the model may return
    #[arg(long, default_value_t = 3)]
    max_results: usize,

    /// Inference threads
    #[arg(long, default_value_t = 4)]
    threads: usize,
}

fn build_helper(args: &Args) -> anyhow::Result<ImageClassifierHelper> {
    let options = ClassifierOptions::default()
        .with_score_threshold(args.threshold)
        .with_max_results(args.max_results)
        .with_num_threads(args.threads);
    let builder = ImageClassifierHelper::builder().with_options(options);

    let builder = match (&args.model, &args.labels) {
        (Some(model), Some(labels)) => builder.with_custom_model(model, labels)?,
        _ => {
            let assets = args
                .assets
                .as_ref()
                .map(AssetManager::new)
                .unwrap_or_else(AssetManager::new_default);
            info!("Using assets from {:?}", assets.assets_dir());
            builder.with_bundled_model(BundledModel::CancerClassification, &assets)?
        }
    };

    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Loading classifier ===");
    let start_time = Instant::now();
    let helper = Arc::new(build_helper(&args).context("Model file not found or cannot be loaded")?);
    info!("Classifier ready (took {:.2?})", start_time.elapsed());

    let classify_start = Instant::now();
    for (i, image) in args.images.iter().enumerate() {
        info!("Image {}/{}: {}", i + 1, args.images.len(), image);
        let text = Arc::clone(&helper)
            .classify_static_image_async(ImageReference::new(image.as_str()))
            .await;
        println!("{}\t{}", image, text);
    }

    info!("=== Done ===");
    info!("Classification time: {:.2?}", classify_start.elapsed());
    info!(
        "Average time per image: {:.2?}",
        classify_start.elapsed() / args.images.len() as u32
    );

    helper.close();
    Ok(())
}
