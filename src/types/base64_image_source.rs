use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Largest image file the API accepts, before encoding.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Represents a base64-encoded image source.
///
/// This can be created from raw bytes, a base64-encoded string, or a file path.
/// The media_type must be one of the supported image formats: "image/jpeg", "image/png",
/// "image/gif", or "image/webp".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Base64ImageSource {
    /// The source type (always "base64" for this struct)
    #[serde(default = "default_type", rename = "type")]
    pub r#type: String,

    /// The media type of the image (jpeg, png, gif, or webp)
    pub media_type: ImageMediaType,

    /// The base64-encoded data of the image
    pub data: String,
}

/// Supported image media types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,

    #[serde(rename = "image/png")]
    Png,

    #[serde(rename = "image/gif")]
    Gif,

    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMediaType {
    /// Determine the media type from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageMediaType::Jpeg),
            "png" => Some(ImageMediaType::Png),
            "gif" => Some(ImageMediaType::Gif),
            "webp" => Some(ImageMediaType::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageMediaType::Jpeg => write!(f, "image/jpeg"),
            ImageMediaType::Png => write!(f, "image/png"),
            ImageMediaType::Gif => write!(f, "image/gif"),
            ImageMediaType::Webp => write!(f, "image/webp"),
        }
    }
}

fn default_type() -> String {
    "base64".to_string()
}

impl Base64ImageSource {
    /// Create a new Base64ImageSource from a base64-encoded string
    pub fn new(data: String, media_type: ImageMediaType) -> Self {
        Self {
            r#type: default_type(),
            media_type,
            data,
        }
    }

    /// Create a Base64ImageSource by encoding raw image bytes.
    pub fn from_bytes(bytes: &[u8], media_type: ImageMediaType) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::new(data, media_type)
    }

    /// Create a Base64ImageSource from a file path
    ///
    /// This will read the file and encode it as base64.
    /// The media_type is determined from the file extension.  Empty files and
    /// files over [`MAX_IMAGE_BYTES`] are rejected without being read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let path = path.as_ref();

        let media_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageMediaType::from_extension)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Unsupported file extension. Must be jpeg, png, gif, or webp",
                )
            })?;

        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len > MAX_IMAGE_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("image is {len} bytes; the limit is {MAX_IMAGE_BYTES} bytes"),
            ));
        }
        let mut buffer = Vec::new();
        file.take(MAX_IMAGE_BYTES + 1).read_to_end(&mut buffer)?;
        if buffer.len() as u64 > MAX_IMAGE_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("image exceeds the limit of {MAX_IMAGE_BYTES} bytes"),
            ));
        }
        if buffer.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "image file is empty",
            ));
        }

        Ok(Self::from_bytes(&buffer, media_type))
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }
}
