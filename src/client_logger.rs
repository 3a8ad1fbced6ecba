//! Logging hooks for Anthropic client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to capture
//! every API interaction passing through the [`Anthropic`](crate::Anthropic)
//! client, and [`JsonlLogger`], which appends one JSON object per event to a file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::Error;
use crate::types::{Message, MessageCreateParams, MessageParamContent};

/// A trait for logging Anthropic client operations.
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request, before it is sent.
    fn log_request(&self, params: &MessageCreateParams);

    /// Log a complete response from a successful `send` call.
    fn log_response(&self, message: &Message);

    /// Log a failed `send` call.
    fn log_error(&self, error: &Error);
}

/// Appends JSON lines describing each client event to a file.
///
/// Image payloads are never written; requests are summarized by message count,
/// image count, and model.
pub struct JsonlLogger {
    file: Mutex<File>,
}

impl JsonlLogger {
    /// Open (or create) the log file in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_event(&self, event: serde_json::Value) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let mut record = json!({ "ts": timestamp });
        if let (Some(record), serde_json::Value::Object(event)) = (record.as_object_mut(), event) {
            record.extend(event);
        }
        // Write failures are ignored.
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{record}");
        }
    }
}

impl ClientLogger for JsonlLogger {
    fn log_request(&self, params: &MessageCreateParams) {
        let images: usize = params
            .messages
            .iter()
            .map(|m| m.content.image_count())
            .sum();
        let text_messages = params
            .messages
            .iter()
            .filter(|m| matches!(m.content, MessageParamContent::String(_)))
            .count();
        self.write_event(json!({
            "event": "request",
            "model": params.model.to_string(),
            "max_tokens": params.max_tokens,
            "messages": params.messages.len(),
            "plain_messages": text_messages,
            "images": images,
            "has_system": params.system.is_some(),
        }));
    }

    fn log_response(&self, message: &Message) {
        self.write_event(json!({
            "event": "response",
            "id": message.id,
            "model": message.model.to_string(),
            "stop_reason": message.stop_reason.map(|r| r.to_string()),
            "input_tokens": message.usage.input_tokens,
            "output_tokens": message.usage.output_tokens,
        }));
    }

    fn log_error(&self, error: &Error) {
        self.write_event(json!({
            "event": "error",
            "status": error.status_code(),
            "message": error.to_string(),
        }));
    }
}
