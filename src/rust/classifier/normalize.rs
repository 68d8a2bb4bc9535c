use std::io::Cursor;

use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use super::acquire::RasterImage;

/// Rotation recorded in a photo's EXIF orientation tag (0x0112).
///
/// Only the pure rotations are honoured; mirrored orientations and the
/// "normal" value fall back to [`OrientationTag::Unspecified`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrientationTag {
    #[default]
    Unspecified,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl OrientationTag {
    /// Maps a raw EXIF orientation value to a rotation
    pub fn from_exif_value(value: u32) -> Self {
        match value {
            6 => Self::Rotate90,
            3 => Self::Rotate180,
            8 => Self::Rotate270,
            _ => Self::Unspecified,
        }
    }

    /// Clockwise rotation in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    /// Rotates the image clockwise by the tagged angle
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Unspecified => image.clone(),
            Self::Rotate90 => image.rotate90(),
            Self::Rotate180 => image.rotate180(),
            Self::Rotate270 => image.rotate270(),
        }
    }
}

/// Orientation passed to the inference call, in EXIF terms: the position
/// of the stored image's first row and column.
///
/// The inference adapter transforms the pixels so that the model sees the
/// image as if displayed upright under this orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationHint {
    #[default]
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    LeftTop,
    RightTop,
    RightBottom,
    LeftBottom,
}

impl OrientationHint {
    pub fn from_exif_value(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::TopLeft,
            2 => Self::TopRight,
            3 => Self::BottomRight,
            4 => Self::BottomLeft,
            5 => Self::LeftTop,
            6 => Self::RightTop,
            7 => Self::RightBottom,
            8 => Self::LeftBottom,
            _ => return None,
        })
    }

    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::TopLeft => image.clone(),
            Self::TopRight => image.fliph(),
            Self::BottomRight => image.rotate180(),
            Self::BottomLeft => image.flipv(),
            // transpose
            Self::LeftTop => image.rotate90().fliph(),
            Self::RightTop => image.rotate90(),
            // transverse
            Self::RightBottom => image.rotate270().fliph(),
            Self::LeftBottom => image.rotate270(),
        }
    }
}

/// Reads the EXIF orientation from encoded image bytes.
///
/// Never fails: missing, unreadable or malformed metadata all mean
/// "no rotation".
pub fn read_orientation(bytes: &[u8]) -> OrientationTag {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No usable EXIF metadata: {}", e);
            return OrientationTag::Unspecified;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(OrientationTag::from_exif_value)
        .unwrap_or_default()
}

/// Scales the image to `size` (aspect ratio discarded) and rotates it
/// upright using the orientation stored in its source bytes.
pub fn normalize(image: RasterImage, size: (u32, u32)) -> RasterImage {
    let orientation = image
        .source
        .as_deref()
        .map(read_orientation)
        .unwrap_or_default();
    normalize_with_orientation(image, size, orientation)
}

/// Same as [`normalize`] with an explicit orientation.
pub fn normalize_with_orientation(
    image: RasterImage,
    size: (u32, u32),
    orientation: OrientationTag,
) -> RasterImage {
    let (width, height) = size;
    let scaled = image.pixels.resize_exact(width, height, FilterType::Triangle);
    if orientation != OrientationTag::Unspecified {
        debug!("Rotating image by {} degrees", orientation.degrees());
    }

    RasterImage {
        pixels: orientation.apply(&scaled),
        source: image.source,
    }
}
