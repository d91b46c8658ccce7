//! Core image types: formats and the data-URI image payload.

use crate::error::{EditError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// File name used when downloading an edited image.
pub const DOWNLOAD_FILE_NAME: &str = "edited-product.png";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Attempts to map a MIME type to a known format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        None
    }
}

/// Image bytes plus MIME type, exchanged as a `data:` URI.
///
/// Payloads are immutable. Cloning shares the underlying bytes, so keeping
/// the same image in the session and in several history records is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: Arc<[u8]>,
    mime_type: String,
}

impl ImagePayload {
    /// Creates a payload from raw bytes and an explicit MIME type.
    pub fn new(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Creates a payload, detecting the MIME type from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .ok_or_else(|| EditError::Decode("Unknown image format".into()))?;
        Ok(Self::new(data, format.mime_type()))
    }

    /// Loads a local image file as an upload.
    ///
    /// The MIME type is taken from the file contents, then from the extension.
    /// Anything that is not recognisably an image is rejected.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });

        match format {
            Some(format) => {
                tracing::debug!(
                    path = %path.display(),
                    size_bytes = data.len(),
                    mime_type = format.mime_type(),
                    "loaded image"
                );
                Ok(Self::new(data, format.mime_type()))
            }
            None => Err(EditError::InvalidRequest(format!(
                "{} is not a supported image file",
                path.display()
            ))),
        }
    }

    /// Parses a `data:<mime>;base64,<data>` URI.
    ///
    /// Whitespace inside the base64 section and missing padding are tolerated.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| EditError::InvalidDataUri("missing `data:` scheme".into()))?;

        let (header, encoded) = rest
            .split_once(',')
            .ok_or_else(|| EditError::InvalidDataUri("missing `,` separator".into()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| EditError::InvalidDataUri("only base64 data URIs are supported".into()))?;

        if mime_type.is_empty() {
            return Err(EditError::InvalidDataUri("missing MIME type".into()));
        }

        let data = decode_base64_lenient(encoded).map_err(|e| EditError::Decode(e.to_string()))?;
        Ok(Self::new(data, mime_type))
    }

    /// Returns the raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the known format for this payload's MIME type, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Saves the image bytes to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

impl FromStr for ImagePayload {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_data_uri(s)
    }
}

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Handles embedded whitespace and missing `=` padding.
pub(crate) fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(cleaned.trim_end_matches('='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";
    const GIF_MAGIC: [u8; 12] = *b"GIF89a\x01\x00\x01\x00\x00\x00";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&GIF_MAGIC),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"hello world!"), None);
    }

    #[test]
    fn test_format_from_extension_and_mime() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("txt"), None);
        assert_eq!(
            ImageFormat::from_mime_type("image/webp"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_data_uri_parse() {
        let payload = ImagePayload::from_data_uri("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.data(), &PNG_MAGIC[..8]);
        assert_eq!(payload.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_data_uri_tolerates_whitespace_and_missing_padding() {
        let payload: ImagePayload = "data:image/jpeg;base64,/9j/\n4A"
            .parse()
            .unwrap();
        assert_eq!(payload.data(), &[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(payload.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_data_uri_rejects_malformed() {
        assert!(matches!(
            ImagePayload::from_data_uri("image/png;base64,AAAA"),
            Err(EditError::InvalidDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64"),
            Err(EditError::InvalidDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png,rawdata"),
            Err(EditError::InvalidDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:;base64,AAAA"),
            Err(EditError::InvalidDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64,!!!!"),
            Err(EditError::Decode(_))
        ));
    }

    #[test]
    fn test_from_bytes_detects_format() {
        let payload = ImagePayload::from_bytes(JPEG_MAGIC.to_vec()).unwrap();
        assert_eq!(payload.mime_type(), "image/jpeg");
        assert!(ImagePayload::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_clone_shares_bytes() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), "image/png");
        let copy = payload.clone();
        assert_eq!(payload, copy);
        assert!(std::ptr::eq(payload.data().as_ptr(), copy.data().as_ptr()));
    }

    #[test]
    fn test_from_path_uses_magic_bytes_then_extension() {
        let dir = tempfile::tempdir().unwrap();

        let png_path = dir.path().join("product.bin");
        std::fs::write(&png_path, PNG_MAGIC).unwrap();
        let payload = ImagePayload::from_path(&png_path).unwrap();
        assert_eq!(payload.mime_type(), "image/png");

        let jpg_path = dir.path().join("product.JPG");
        std::fs::File::create(&jpg_path)
            .unwrap()
            .write_all(b"truncated")
            .unwrap();
        let payload = ImagePayload::from_path(&jpg_path).unwrap();
        assert_eq!(payload.mime_type(), "image/jpeg");

        let txt_path = dir.path().join("notes.txt");
        std::fs::write(&txt_path, "hello").unwrap();
        assert!(matches!(
            ImagePayload::from_path(&txt_path),
            Err(EditError::InvalidRequest(_))
        ));

        assert!(matches!(
            ImagePayload::from_path(dir.path().join("missing.png")),
            Err(EditError::Io(_))
        ));
    }

    #[test]
    fn test_save_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DOWNLOAD_FILE_NAME);
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), "image/png");
        payload.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);
    }
}
