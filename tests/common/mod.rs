#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use asclepius::{ClassifierError, ImageInference, TensorLayout};
use env_logger::{Builder, Env};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::{s, Array4};

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Returns the same scores for every image and counts calls.
pub struct ScriptedInference {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedInference {
    pub fn new(labels: &[&str], scores: &[f32]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            scores: scores.to_vec(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ImageInference for ScriptedInference {
    fn input_layout(&self) -> TensorLayout {
        TensorLayout::Nchw
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        assert_eq!(input.shape(), &[1, 3, 224, 224]);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Always fails, like a model whose runtime fell over.
pub struct FailingInference;

impl ImageInference for FailingInference {
    fn input_layout(&self) -> TensorLayout {
        TensorLayout::Nhwc
    }

    fn labels(&self) -> &[String] {
        &[]
    }

    fn run(&self, _input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        Err(ClassifierError::Inference("Failed to run model: out of memory".into()))
    }
}

/// Scores each quadrant of the input by its mean red value, so the winning
/// label tells where the red part of the image ended up.
pub struct QuadrantProbe {
    labels: Vec<String>,
}

impl QuadrantProbe {
    pub fn new() -> Self {
        Self {
            labels: ["top-left", "top-right", "bottom-right", "bottom-left"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ImageInference for QuadrantProbe {
    fn input_layout(&self) -> TensorLayout {
        TensorLayout::Nchw
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let h = input.shape()[2];
        let w = input.shape()[3];
        let (hh, hw) = (h / 2, w / 2);
        let red = input.slice(s![0, 0, .., ..]);
        let mean = |ys: std::ops::Range<usize>, xs: std::ops::Range<usize>| {
            red.slice(s![ys, xs]).mean().unwrap_or(0.0)
        };
        Ok(vec![
            mean(0..hh, 0..hw),
            mean(0..hh, hw..w),
            mean(hh..h, hw..w),
            mean(hh..h, 0..hw),
        ])
    }
}

/// Red top-left quadrant on black
pub fn marked_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if x < width / 2 && y < height / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Inserts a minimal big-endian EXIF APP1 segment carrying only the
/// orientation tag right after the JPEG SOI marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");

    let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
    tiff.extend_from_slice(&1u16.to_be_bytes()); // one IFD entry
    tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes()); // count
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let length = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn put_int(out: &mut Vec<u8>, field: u64, value: u64) {
    put_varint(out, field << 3);
    put_varint(out, value);
}

fn put_bytes(out: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    put_varint(out, (field << 3) | 2);
    put_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

fn float_tensor_info(name: &str, dims: &[u64]) -> Vec<u8> {
    let mut shape = Vec::new();
    for &dim in dims {
        let mut dimension = Vec::new();
        put_int(&mut dimension, 1, dim);
        put_bytes(&mut shape, 1, &dimension);
    }
    let mut tensor = Vec::new();
    put_int(&mut tensor, 1, 1); // FLOAT
    put_bytes(&mut tensor, 2, &shape);
    let mut type_proto = Vec::new();
    put_bytes(&mut type_proto, 1, &tensor);

    let mut info = Vec::new();
    put_bytes(&mut info, 1, name.as_bytes());
    put_bytes(&mut info, 2, &type_proto);
    info
}

fn node(op_type: &str, input: &str, output: &str) -> Vec<u8> {
    let mut node = Vec::new();
    put_bytes(&mut node, 1, input.as_bytes());
    put_bytes(&mut node, 2, output.as_bytes());
    put_bytes(&mut node, 3, op_type.to_lowercase().as_bytes());
    put_bytes(&mut node, 4, op_type.as_bytes());
    node
}

/// Serialized ONNX model scoring an NCHW `[1, 3, 224, 224]` image by its
/// mean red, green and blue values (`GlobalAveragePool` then `Flatten`).
pub fn channel_mean_onnx() -> Vec<u8> {
    let mut graph = Vec::new();
    put_bytes(&mut graph, 1, &node("GlobalAveragePool", "image", "pooled"));
    put_bytes(&mut graph, 1, &node("Flatten", "pooled", "scores"));
    put_bytes(&mut graph, 2, b"channel_mean");
    put_bytes(&mut graph, 11, &float_tensor_info("image", &[1, 3, 224, 224]));
    put_bytes(&mut graph, 12, &float_tensor_info("scores", &[1, 3]));

    let mut opset = Vec::new();
    put_int(&mut opset, 2, 13);

    let mut model = Vec::new();
    put_int(&mut model, 1, 7); // IR version
    put_bytes(&mut model, 2, b"asclepius-tests");
    put_bytes(&mut model, 7, &graph);
    put_bytes(&mut model, 8, &opset);
    model
}

/// Writes the channel-mean model and a `red`/`green`/`blue` label file
/// into a fresh directory under the system temp dir.
pub fn write_channel_mean_model(name: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let dir = std::env::temp_dir().join("asclepius-onnx-fixtures").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let model_path = dir.join("channel_mean.onnx");
    let labels_path = dir.join("channel_mean.labels.txt");
    std::fs::write(&model_path, channel_mean_onnx()).unwrap();
    std::fs::write(&labels_path, "red\ngreen\nblue\n").unwrap();
    (model_path, labels_path)
}

pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}
