use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Channel values are divided by this to land in [0, 1]
const PIXEL_SCALE: f32 = 255.0;

/// Memory layout of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[batch, channels, height, width]`, the usual ONNX export layout
    Nchw,
    /// `[batch, height, width, channels]`, the TFLite layout
    Nhwc,
}

impl TensorLayout {
    /// Detects the layout from a rank-4 input shape by locating the
    /// 3-channel axis. Dynamic dimensions are reported as `-1`.
    pub fn from_input_shape(shape: &[i64]) -> Option<Self> {
        if shape.len() != 4 {
            return None;
        }
        if shape[1] == 3 {
            Some(Self::Nchw)
        } else if shape[3] == 3 {
            Some(Self::Nhwc)
        } else {
            None
        }
    }

    /// Static `(width, height)` declared by the model, if any
    pub fn spatial_size(self, shape: &[i64]) -> Option<(u32, u32)> {
        let (h, w) = match self {
            Self::Nchw => (*shape.get(2)?, *shape.get(3)?),
            Self::Nhwc => (*shape.get(1)?, *shape.get(2)?),
        };
        if h > 0 && w > 0 {
            Some((u32::try_from(w).ok()?, u32::try_from(h).ok()?))
        } else {
            None
        }
    }
}

/// Builds a single-image input tensor: resize (bilinear, skipped when
/// already at `size`), cast to `f32`, scale channel values into [0, 1].
pub fn image_to_tensor(
    image: &DynamicImage,
    size: (u32, u32),
    layout: TensorLayout,
) -> Array4<f32> {
    let (width, height) = size;
    let rgb = if image.width() == width && image.height() == height {
        image.to_rgb8()
    } else {
        image.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let (w, h) = (width as usize, height as usize);
    match layout {
        TensorLayout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / PIXEL_SCALE
        }),
        TensorLayout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / PIXEL_SCALE
        }),
    }
}

pub(crate) fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; scores.len()]
    }
}
