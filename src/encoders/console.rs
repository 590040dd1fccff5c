//! Console encoder for human-readable output

use super::json::JsonEncoder;
use crate::core::{Encoder, EncoderConfig, Entry, Field, Result};
use std::sync::Arc;

/// Encodes entries as separator-delimited text for people reading a
/// terminal:
///
/// ```text
/// 2025-01-08T10:30:45.123Z	INFO	http	server/routes.rs:42	request served	{"status":200}
/// ```
///
/// Time, level, name, caller and message come first, each skipped when its
/// key is empty or the value is absent. Fields follow as one compact JSON
/// object, and a stacktrace, if any, goes on the next line.
#[derive(Clone)]
pub struct ConsoleEncoder {
    config: Arc<EncoderConfig>,
    fields: JsonEncoder,
}

impl ConsoleEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        let config = Arc::new(config);
        Self {
            fields: JsonEncoder::with_shared_config(Arc::clone(&config)),
            config,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl Encoder for ConsoleEncoder {
    fn with_fields(&self, fields: &[Field]) -> Box<dyn Encoder> {
        Box::new(Self {
            config: Arc::clone(&self.config),
            fields: self.fields.extended(fields),
        })
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>> {
        let config = &*self.config;
        let mut elements: Vec<String> = Vec::with_capacity(6);

        if !config.time_key.is_empty() {
            elements.push(config.time_encoder.encode(&entry.timestamp).to_string());
        }
        if !config.level_key.is_empty() {
            elements.push(config.level_encoder.encode(entry.level));
        }
        if !entry.logger_name.is_empty() && !config.name_key.is_empty() {
            elements.push(entry.logger_name.clone());
        }
        if let Some(caller) = entry.caller.as_ref().filter(|_| !config.caller_key.is_empty()) {
            elements.push(config.caller_encoder.encode(caller));
        }
        if !config.message_key.is_empty() {
            elements.push(escape_message(&entry.message));
        }

        let mut line = elements.join(config.console_separator()).into_bytes();

        if let Some(object) = self.fields.encode_fields_object(fields) {
            if !line.is_empty() {
                line.extend_from_slice(config.console_separator().as_bytes());
            }
            line.extend_from_slice(&object);
        }

        if let Some(stack) = entry.stack.as_ref().filter(|_| !config.stacktrace_key.is_empty()) {
            line.push(b'\n');
            line.extend_from_slice(stack.as_bytes());
        }

        line.extend_from_slice(config.line_ending().as_bytes());
        Ok(line)
    }
}

/// Keep a message on one line: newlines, carriage returns and tabs are
/// written as their escape sequences.
fn escape_message(message: &str) -> String {
    if !message.contains(['\n', '\r', '\t']) {
        return message.to_string();
    }

    let mut escaped = String::with_capacity(message.len() + 8);
    for ch in message.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}
