// Public modules
pub mod base64_image_source;
pub mod content_block;
pub mod image_block;
pub mod message;
pub mod message_create_params;
pub mod message_param;
pub mod model;
pub mod stop_reason;
pub mod text_block;
pub mod usage;

// Re-exports
pub use base64_image_source::{Base64ImageSource, ImageMediaType, MAX_IMAGE_BYTES};
pub use content_block::ContentBlock;
pub use image_block::ImageBlock;
pub use message::{Message, NON_TEXT_REPLY};
pub use message_create_params::MessageCreateParams;
pub use message_param::{MessageParam, MessageParamContent, MessageRole};
pub use model::{KnownModel, Model};
pub use stop_reason::StopReason;
pub use text_block::TextBlock;
pub use usage::Usage;
