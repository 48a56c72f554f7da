use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A user-selected image, immutable once constructed.
#[derive(Debug, Clone)]
pub struct Document {
    file_name: String,
    bytes: Arc<[u8]>,
    format: ImageFormat,
}

impl Document {
    /// Wrap raw image bytes. Only JPEG, PNG and WebP are accepted.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self, DocumentError> {
        let file_name = file_name.into();
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(DocumentError::Empty { file_name });
        }

        let format = image::guess_format(&bytes)
            .ok()
            .filter(|f| matches!(f, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP))
            .ok_or_else(|| DocumentError::UnsupportedFormat {
                file_name: file_name.clone(),
            })?;

        Ok(Self {
            file_name,
            bytes: bytes.into(),
            format,
        })
    }

    /// Read an image from disk.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Self::from_bytes(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read document '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document '{file_name}' is empty")]
    Empty { file_name: String },

    #[error("Document '{file_name}' is not a JPEG, PNG or WebP image")]
    UnsupportedFormat { file_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_png_detected() {
        let doc = Document::from_bytes("card.png", PNG_HEADER.to_vec()).unwrap();
        assert_eq!(doc.format(), ImageFormat::Png);
        assert_eq!(doc.mime_type(), "image/png");
        assert_eq!(doc.file_name(), "card.png");
        assert_eq!(doc.len(), PNG_HEADER.len());
    }

    #[test]
    fn test_jpeg_detected_regardless_of_name() {
        let doc = Document::from_bytes("scan.bin", JPEG_HEADER.to_vec()).unwrap();
        assert_eq!(doc.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_empty() {
        let err = Document::from_bytes("empty.png", Vec::new()).unwrap_err();
        assert!(matches!(err, DocumentError::Empty { .. }));
    }

    #[test]
    fn test_rejects_non_image() {
        let err = Document::from_bytes("notes.txt", b"hello world".to_vec()).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = Document::open("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
