use std::io;
use std::path::Path;
use tokio::fs;
use tracing::debug;
use crate::core::SourceImage;
use crate::utils::{ImageFormat, PathError, StudioError, StudioResult, ValidationError, format_from_extension};

/// Reads an uploaded file into memory along with its media type.
///
/// The media type comes from the extension; when the extension and the content
/// disagree the sniffed content wins.
pub async fn read_upload(path: impl AsRef<Path>) -> StudioResult<SourceImage> {
    let path = path.as_ref();
    check_upload_path(path)
        .await
        .map_err(|e| StudioError::upload(format!("{}: {}", path.display(), e)))?;

    let bytes = fs::read(path)
        .await
        .map_err(|e| StudioError::upload(format!("Failed to read {}: {}", path.display(), e)))?;

    let declared = format_from_extension(path.to_str().unwrap_or_default()).ok();
    let format = match (declared, ImageFormat::detect(&bytes)) {
        (Some(declared), Some(sniffed)) if sniffed != declared => {
            debug!(
                "{} declares {:?} but contains {:?}",
                extract_filename(path), declared, sniffed
            );
            sniffed
        }
        (Some(declared), _) => declared,
        (None, Some(sniffed)) => sniffed,
        (None, None) => {
            return Err(StudioError::upload(format!(
                "{}: not a JPEG, PNG or WebP image", path.display()
            )));
        }
    };

    debug!("Read upload {} ({} bytes, {})", extract_filename(path), bytes.len(), format.mime_type());
    Ok(SourceImage::new(bytes, format.mime_type()).with_file_name(extract_filename(path)))
}

/// The path must exist and be a regular file. The format is decided once the
/// content is read.
async fn check_upload_path(path: &Path) -> Result<(), ValidationError> {
    let metadata = fs::metadata(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ValidationError::path_not_found(path),
        _ => PathError::from(e).into(),
    })?;

    if !metadata.is_file() {
        return Err(ValidationError::not_a_file(path));
    }
    Ok(())
}

/// Creates `dir` and all missing parents
pub async fn create_dir_all(dir: impl AsRef<Path>) -> StudioResult<()> {
    fs::create_dir_all(dir.as_ref())
        .await
        .map_err(|e| StudioError::IO(format!(
            "Failed to create directory {}: {}", dir.as_ref().display(), e
        )))
}

/// File name component of `path`, or the whole path when it has none
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem of `path`, used to name exports of images that were never items
pub fn extract_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn reads_png_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mug.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let source = read_upload(&path).await.unwrap();
        assert_eq!(source.mime_type, "image/png");
        assert_eq!(source.file_name.as_deref(), Some("mug.png"));
        assert_eq!(source.bytes.as_slice(), tiny_png().as_slice());
    }

    #[tokio::test]
    async fn sniffed_format_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mislabeled.jpg");
        std::fs::write(&path, tiny_png()).unwrap();

        let source = read_upload(&path).await.unwrap();
        assert_eq!(source.mime_type, "image/png");
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, tiny_png()).unwrap();

        assert_eq!(read_upload(&path).await.unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn unrecognized_file_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let err = read_upload(&path).await.unwrap_err();
        assert!(matches!(err, StudioError::Upload(_)));
    }

    #[tokio::test]
    async fn missing_file_is_upload_error() {
        let err = read_upload("/no/such/file.png").await.unwrap_err();
        assert!(matches!(err, StudioError::Upload(_)));
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn directory_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folder.png");
        std::fs::create_dir(&path).unwrap();

        let err = read_upload(&path).await.unwrap_err();
        assert!(matches!(err, StudioError::Upload(_)));
        assert!(err.to_string().contains("Not a file"));
    }

    #[test]
    fn filename_helpers() {
        assert_eq!(extract_filename(Path::new("/a/b/shoe.jpg")), "shoe.jpg");
        assert_eq!(extract_stem(Path::new("/a/b/shoe.jpg")), "shoe");
    }
}
