use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use log::debug;
use url::Url;

use super::error::ClassifierError;

/// An opaque, read-only locator for an image chosen by the user.
///
/// Accepts `file://` URIs, bare filesystem paths and any other
/// `scheme://` locator a host platform hands out (for example Android
/// `content://` URIs). Resolution is left to a [`MediaResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    raw: String,
    url: Option<Url>,
}

impl ImageReference {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        // single-letter schemes are Windows drive letters, not URIs
        let url = Url::parse(&raw).ok().filter(|url| url.scheme().len() > 1);
        Self { raw, url }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The URI scheme, if the reference has one (`file`, `content`, ...)
    pub fn scheme(&self) -> Option<&str> {
        self.url.as_ref().map(Url::scheme)
    }

    /// Filesystem path for local `file://` URIs and bare paths
    pub fn to_path(&self) -> Option<PathBuf> {
        match &self.url {
            None if self.raw.is_empty() => None,
            None => Some(PathBuf::from(&self.raw)),
            Some(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Some(_) => None,
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ImageReference {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ImageReference {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&Path> for ImageReference {
    fn from(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }
}

/// Host media access: turns an [`ImageReference`] into encoded image bytes.
pub trait MediaResolver: Send + Sync {
    fn open(&self, reference: &ImageReference) -> Result<Vec<u8>, ClassifierError>;
}

/// Resolves `file://` URIs and bare paths from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemResolver;

impl MediaResolver for FileSystemResolver {
    fn open(&self, reference: &ImageReference) -> Result<Vec<u8>, ClassifierError> {
        let path = reference.to_path().ok_or_else(|| {
            ClassifierError::ImageAcquisition(format!("Unsupported image reference: {}", reference))
        })?;
        fs::read(&path).map_err(|e| {
            ClassifierError::ImageAcquisition(format!("Cannot open {}: {}", reference, e))
        })
    }
}

/// Serves images the host has already loaded into memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResolver {
    blobs: HashMap<ImageReference, Arc<[u8]>>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<ImageReference>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.blobs.insert(reference.into(), Arc::from(bytes));
    }

    pub fn with_image(
        mut self,
        reference: impl Into<ImageReference>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl MediaResolver for InMemoryResolver {
    fn open(&self, reference: &ImageReference) -> Result<Vec<u8>, ClassifierError> {
        self.blobs
            .get(reference)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| {
                ClassifierError::ImageAcquisition(format!("Unknown image reference: {}", reference))
            })
    }
}

/// A decoded pixel buffer, optionally carrying the encoded bytes it came from.
///
/// The source bytes are kept so the normalizer can read orientation
/// metadata that decoding throws away.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub pixels: DynamicImage,
    pub source: Option<Arc<[u8]>>,
}

impl RasterImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self { pixels, source: None }
    }

    pub fn with_source(pixels: DynamicImage, source: impl Into<Arc<[u8]>>) -> Self {
        Self {
            pixels,
            source: Some(source.into()),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Resolves the reference and decodes the bytes into a [`RasterImage`].
///
/// # Errors
/// - `ImageAcquisition` if the resolver cannot open the reference
/// - `ImageAcquisition` if the bytes are empty or not a decodable image
pub fn acquire(
    resolver: &dyn MediaResolver,
    reference: &ImageReference,
) -> Result<RasterImage, ClassifierError> {
    let bytes = resolver.open(reference)?;
    if bytes.is_empty() {
        return Err(ClassifierError::ImageAcquisition(format!("Image {} is empty", reference)));
    }

    let pixels = image::load_from_memory(&bytes).map_err(|e| {
        ClassifierError::ImageAcquisition(format!("Cannot decode {}: {}", reference, e))
    })?;
    debug!("Decoded {} ({}x{})", reference, pixels.width(), pixels.height());

    Ok(RasterImage::with_source(pixels, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_reference_parsing() {
        let file = ImageReference::new("file:///tmp/photo.jpg");
        assert_eq!(file.scheme(), Some("file"));
        assert_eq!(file.to_path(), Some(PathBuf::from("/tmp/photo.jpg")));

        let bare = ImageReference::new("photos/cat.png");
        assert_eq!(bare.scheme(), None);
        assert_eq!(bare.to_path(), Some(PathBuf::from("photos/cat.png")));

        let content = ImageReference::new("content://media/external/images/media/42");
        assert_eq!(content.scheme(), Some("content"));
        assert_eq!(content.to_path(), None);

        assert_eq!(ImageReference::new("").to_path(), None);
    }

    #[test]
    fn test_file_uri_is_decoded() {
        let encoded = ImageReference::new("file:///tmp/lesion%20scans/my%20photo.png");
        assert_eq!(encoded.to_path(), Some(PathBuf::from("/tmp/lesion scans/my photo.png")));

        let localhost = ImageReference::new("file://localhost/tmp/x.png");
        assert_eq!(localhost.scheme(), Some("file"));
        assert_eq!(localhost.to_path(), Some(PathBuf::from("/tmp/x.png")));

        // a remote host cannot be read locally
        assert_eq!(ImageReference::new("file://fileserver/share/x.png").to_path(), None);
        assert_eq!(ImageReference::new("FILE:///tmp/x.png").scheme(), Some("file"));
    }

    #[test]
    fn test_acquire_from_memory() {
        let resolver = InMemoryResolver::new().with_image("mem://a", png_bytes(10, 20));
        let image = acquire(&resolver, &"mem://a".into()).unwrap();
        assert_eq!(image.dimensions(), (10, 20));
        assert!(image.source.is_some());
    }

    #[test]
    fn test_acquire_unknown_reference() {
        let resolver = InMemoryResolver::new();
        let err = acquire(&resolver, &"mem://missing".into()).unwrap_err();
        assert!(matches!(err, ClassifierError::ImageAcquisition(_)));
    }

    #[test]
    fn test_acquire_rejects_garbage_and_empty() {
        let resolver = InMemoryResolver::new()
            .with_image("mem://garbage", b"definitely not an image".to_vec())
            .with_image("mem://empty", Vec::new());
        assert!(matches!(
            acquire(&resolver, &"mem://garbage".into()),
            Err(ClassifierError::ImageAcquisition(_))
        ));
        assert!(matches!(
            acquire(&resolver, &"mem://empty".into()),
            Err(ClassifierError::ImageAcquisition(_))
        ));
    }

    #[test]
    fn test_filesystem_resolver() {
        let dir = std::env::temp_dir().join("asclepius-acquire-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("small.png");
        fs::write(&path, png_bytes(4, 4)).unwrap();

        let by_path = acquire(&FileSystemResolver, &ImageReference::from(path.as_path())).unwrap();
        assert_eq!(by_path.dimensions(), (4, 4));

        let uri = ImageReference::new(format!("file://{}", path.display()));
        assert!(acquire(&FileSystemResolver, &uri).is_ok());

        let spaced = dir.join("my photo.png");
        fs::write(&spaced, png_bytes(3, 5)).unwrap();
        let encoded = Url::from_file_path(&spaced).unwrap().to_string();
        assert!(encoded.contains("%20"));
        let image = acquire(&FileSystemResolver, &ImageReference::new(encoded)).unwrap();
        assert_eq!(image.dimensions(), (3, 5));

        let content = ImageReference::new("content://media/1");
        assert!(matches!(
            acquire(&FileSystemResolver, &content),
            Err(ClassifierError::ImageAcquisition(_))
        ));
        assert!(acquire(&FileSystemResolver, &dir.join("missing.png").as_path().into()).is_err());
    }
}
