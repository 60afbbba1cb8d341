//! Store photo uploads.
//!
//! Photos are accepted by content type, resized to a fixed width and written
//! to the uploads directory under a random name.

use std::path::Path;

use image::{ImageFormat, imageops::FilterType};
use thiserror::Error;
use uuid::Uuid;

/// Width photos are resized to; height follows the aspect ratio.
pub const PHOTO_WIDTH: u32 = 800;

/// Errors that can occur while storing a photo.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload isn't an image.
    #[error("That filetype isn't allowed!")]
    NotAnImage,

    /// The image format can't be decoded.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Decoding or encoding failed.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Writing the file failed.
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking resize task panicked or was cancelled.
    #[error("resize task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An uploaded file as received from the form.
#[derive(Debug)]
pub struct PhotoUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Check the content type and choose a stored filename for it.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotAnImage` unless the content type is `image/*`.
    pub fn filename(&self) -> Result<String, UploadError> {
        let extension = self
            .content_type
            .strip_prefix("image/")
            .map(|subtype| {
                subtype
                    .chars()
                    .take_while(char::is_ascii_alphanumeric)
                    .collect::<String>()
                    .to_ascii_lowercase()
            })
            .filter(|ext| !ext.is_empty())
            .ok_or(UploadError::NotAnImage)?;

        Ok(format!("{}.{extension}", Uuid::new_v4()))
    }
}

/// Resize and store a photo in `dir`, returning its filename.
///
/// Decoding, resizing and encoding run on the blocking thread pool.
///
/// # Errors
///
/// Returns an error if the upload isn't a supported image or can't be written.
pub async fn save_photo(dir: &Path, upload: PhotoUpload) -> Result<String, UploadError> {
    let filename = upload.filename()?;
    let format = ImageFormat::from_mime_type(&upload.content_type)
        .ok_or_else(|| UploadError::UnsupportedFormat(upload.content_type.clone()))?;
    let path = dir.join(&filename);

    tokio::task::spawn_blocking(move || write_resized(&path, &upload.bytes, format)).await??;

    tracing::info!(photo = %filename, "Photo stored");
    Ok(filename)
}

/// Delete a stored photo whose store was never saved.
///
/// Failures are logged; the caller is already handling a more important error.
pub async fn discard_photo(dir: &Path, filename: &str) {
    if let Err(e) = tokio::fs::remove_file(dir.join(filename)).await {
        tracing::warn!(photo = %filename, error = %e, "Failed to discard photo");
    }
}

fn write_resized(path: &Path, bytes: &[u8], format: ImageFormat) -> Result<(), UploadError> {
    let photo = image::load_from_memory_with_format(bytes, format)?;
    let resized = photo.resize(PHOTO_WIDTH, u32::MAX, FilterType::Triangle);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    resized.save_with_format(path, format)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, GenericImageView, RgbImage};

    use super::*;

    fn upload(content_type: &str, bytes: Vec<u8>) -> PhotoUpload {
        PhotoUpload {
            content_type: content_type.to_owned(),
            bytes,
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_filename_uses_subtype_extension() {
        let name = upload("image/jpeg", Vec::new()).filename().unwrap();
        assert!(name.ends_with(".jpeg"));
        let stem = name.trim_end_matches(".jpeg");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_filename_strips_subtype_suffix() {
        let name = upload("image/svg+xml", Vec::new()).filename().unwrap();
        assert!(name.ends_with(".svg"));
    }

    #[test]
    fn test_filename_rejects_non_images() {
        let err = upload("application/pdf", Vec::new()).filename().unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage));
        assert_eq!(err.to_string(), "That filetype isn't allowed!");
    }

    #[tokio::test]
    async fn test_save_photo_resizes_to_width() {
        let dir = std::env::temp_dir().join(format!("storefinder-uploads-{}", Uuid::new_v4()));
        let filename = save_photo(&dir, upload("image/png", png(1600, 1200)))
            .await
            .unwrap();

        let stored = image::open(dir.join(&filename)).unwrap();
        assert_eq!(stored.dimensions(), (PHOTO_WIDTH, 600));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_discard_photo_removes_file() {
        let dir = std::env::temp_dir().join(format!("storefinder-uploads-{}", Uuid::new_v4()));
        let filename = save_photo(&dir, upload("image/png", png(40, 30)))
            .await
            .unwrap();
        assert!(dir.join(&filename).exists());

        discard_photo(&dir, &filename).await;
        assert!(!dir.join(&filename).exists());

        // A second discard only logs
        discard_photo(&dir, &filename).await;
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_save_photo_rejects_garbage() {
        let dir = std::env::temp_dir();
        let result = save_photo(&dir, upload("image/png", b"not a png".to_vec())).await;
        assert!(matches!(result, Err(UploadError::Image(_))));
    }
}
