use std::sync::Arc;

use image::DynamicImage;

use crate::error::LoadError;

/// A decoded image, cheap to clone and share between the view and completions.
#[derive(Debug, Clone)]
pub struct Image(Arc<DynamicImage>);

impl Image {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }

    /// Whether both handles point at the same decoded buffer.
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<DynamicImage> for Image {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Decode downloaded bytes, guessing the format from their content.
pub fn decode(bytes: &[u8]) -> Result<Image, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Decode("empty response body".into()));
    }
    image::load_from_memory(bytes)
        .map(Image::new)
        .map_err(|e| LoadError::Decode(e.to_string()))
}

/// Decode an image file from disk, e.g. a placeholder shipped with the app.
pub fn open(path: &std::path::Path) -> Result<Image, LoadError> {
    let bytes = std::fs::read(path)
        .map_err(|e| LoadError::InvalidRequest(format!("{}: {e}", path.display())))?;
    decode(&bytes)
}

#[cfg(test)]
pub(crate) fn png_1x1() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::new_rgba8(1, 1)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
