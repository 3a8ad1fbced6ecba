use serde::{Deserialize, Serialize};

use crate::types::Base64ImageSource;

/// An image embedded in a user message.
///
/// Images are always carried inline as base64 data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageBlock {
    /// The source of the image.
    pub source: Base64ImageSource,
}

impl ImageBlock {
    /// Create a new `ImageBlock` with a Base64 image source.
    pub fn new(source: Base64ImageSource) -> Self {
        Self { source }
    }
}

impl From<Base64ImageSource> for ImageBlock {
    fn from(source: Base64ImageSource) -> Self {
        Self::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::base64_image_source::ImageMediaType;
    use serde_json::{json, to_value};

    #[test]
    fn test_image_block_with_base64() {
        let base64_source =
            Base64ImageSource::new("SGVsbG8gd29ybGQ=".to_string(), ImageMediaType::Jpeg);

        let image_block = ImageBlock::new(base64_source);
        let json = to_value(&image_block).unwrap();

        assert_eq!(
            json,
            json!({
                "source": {
                    "type": "base64",
                    "data": "SGVsbG8gd29ybGQ=",
                    "media_type": "image/jpeg"
                }
            })
        );
    }
}
