//! JSON encoder: one object per line (JSONL)
//!
//! Compatible with log aggregation tools like ELK, Loki, etc.

use crate::core::{Encoder, EncoderConfig, Entry, Field, FieldValue, Primitive, Result};
use std::sync::Arc;

/// Encodes each entry as a single-line JSON object.
///
/// Context fields added through [`Encoder::with_fields`] are encoded once
/// and copied into every entry as bytes.
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::{Encoder, EncoderConfig, Entry, Field, LogLevel};
/// use rust_structured_logger::encoders::JsonEncoder;
///
/// let config = EncoderConfig {
///     level_key: "level".to_string(),
///     message_key: "msg".to_string(),
///     ..EncoderConfig::default()
/// };
/// let encoder = JsonEncoder::new(config);
/// let line = encoder
///     .encode_entry(&Entry::new(LogLevel::Info, "hello"), &[Field::int("n", 1)])
///     .unwrap();
/// assert_eq!(line, b"{\"level\":\"info\",\"msg\":\"hello\",\"n\":1}\n");
/// ```
#[derive(Clone)]
pub struct JsonEncoder {
    config: Arc<EncoderConfig>,
    context: Vec<u8>,
    open_namespaces: usize,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    pub(crate) fn with_shared_config(config: Arc<EncoderConfig>) -> Self {
        Self {
            config,
            context: Vec::new(),
            open_namespaces: 0,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn buffer(&self, bytes: Vec<u8>, open_namespaces: usize) -> JsonBuffer<'_> {
        JsonBuffer {
            buf: bytes,
            config: &self.config,
            open_namespaces,
        }
    }

    /// A copy of this encoder with `fields` pre-encoded into its context
    pub(crate) fn extended(&self, fields: &[Field]) -> Self {
        let mut out = self.buffer(self.context.clone(), self.open_namespaces);
        for field in fields {
            out.add_field(field);
        }
        let open_namespaces = out.open_namespaces;
        let context = out.buf;

        Self {
            config: Arc::clone(&self.config),
            context,
            open_namespaces,
        }
    }

    /// Context and call-site fields rendered as one object, or `None` when
    /// there are no fields at all.
    pub(crate) fn encode_fields_object(&self, fields: &[Field]) -> Option<Vec<u8>> {
        if self.context.is_empty() && fields.is_empty() {
            return None;
        }

        let mut out = self.buffer(Vec::with_capacity(self.context.len() + 64), 0);
        out.buf.push(b'{');
        out.splice_context(&self.context, self.open_namespaces);
        for field in fields {
            out.add_field(field);
        }
        out.close_namespaces();
        out.buf.push(b'}');
        Some(out.buf)
    }
}

impl Encoder for JsonEncoder {
    fn with_fields(&self, fields: &[Field]) -> Box<dyn Encoder> {
        Box::new(self.extended(fields))
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>> {
        let config = &*self.config;
        let mut out = self.buffer(Vec::with_capacity(self.context.len() + 256), 0);
        out.buf.push(b'{');

        if !config.level_key.is_empty() {
            out.add_key(&config.level_key);
            out.append_str(&config.level_encoder.encode(entry.level));
        }
        if !config.time_key.is_empty() {
            out.add_key(&config.time_key);
            out.append_primitive(&config.time_encoder.encode(&entry.timestamp));
        }
        if !entry.logger_name.is_empty() && !config.name_key.is_empty() {
            out.add_key(&config.name_key);
            out.append_str(&entry.logger_name);
        }
        if let Some(caller) = entry.caller.as_ref().filter(|_| !config.caller_key.is_empty()) {
            out.add_key(&config.caller_key);
            out.append_str(&config.caller_encoder.encode(caller));
        }
        if !config.message_key.is_empty() {
            out.add_key(&config.message_key);
            out.append_str(&entry.message);
        }

        out.splice_context(&self.context, self.open_namespaces);
        for field in fields {
            out.add_field(field);
        }
        out.close_namespaces();

        if let Some(stack) = entry.stack.as_ref().filter(|_| !config.stacktrace_key.is_empty()) {
            out.add_key(&config.stacktrace_key);
            out.append_str(stack);
        }

        out.buf.push(b'}');
        out.buf.extend_from_slice(config.line_ending().as_bytes());
        Ok(out.buf)
    }
}

/// Byte buffer plus the state needed to place separators and close scopes
struct JsonBuffer<'a> {
    buf: Vec<u8>,
    config: &'a EncoderConfig,
    open_namespaces: usize,
}

impl JsonBuffer<'_> {
    fn add_separator(&mut self) {
        match self.buf.last() {
            None | Some(b'{') | Some(b'[') | Some(b':') | Some(b',') => {}
            Some(_) => self.buf.push(b','),
        }
    }

    fn add_key(&mut self, key: &str) {
        self.add_separator();
        escape_into(&mut self.buf, key);
        self.buf.push(b':');
    }

    fn splice_context(&mut self, context: &[u8], open_namespaces: usize) {
        if context.is_empty() {
            return;
        }
        self.add_separator();
        self.buf.extend_from_slice(context);
        self.open_namespaces += open_namespaces;
    }

    fn close_namespaces(&mut self) {
        for _ in 0..self.open_namespaces {
            self.buf.push(b'}');
        }
        self.open_namespaces = 0;
    }

    fn add_field(&mut self, field: &Field) {
        match &field.value {
            FieldValue::Namespace => {
                self.add_key(&field.key);
                self.buf.push(b'{');
                self.open_namespaces += 1;
            }
            FieldValue::Marshaler(marshaler) => match marshaler.marshal_log() {
                Ok(value) => {
                    self.add_key(&field.key);
                    self.append_value(&value);
                }
                Err(err) => {
                    self.add_key(&format!("{}Error", field.key));
                    self.append_str(&err.to_string());
                }
            },
            value => {
                self.add_key(&field.key);
                self.append_value(value);
            }
        }
    }

    fn append_value(&mut self, value: &FieldValue) {
        match value {
            FieldValue::String(s) => self.append_str(s),
            FieldValue::Int(i) => self.buf.extend_from_slice(i.to_string().as_bytes()),
            FieldValue::Uint(u) => self.buf.extend_from_slice(u.to_string().as_bytes()),
            FieldValue::Float(f) => self.append_float(*f),
            FieldValue::Bool(b) => {
                let text: &[u8] = if *b { b"true" } else { b"false" };
                self.buf.extend_from_slice(text);
            }
            FieldValue::Null => self.buf.extend_from_slice(b"null"),
            FieldValue::Duration(d) => {
                let encoded = self.config.duration_encoder.encode(*d);
                self.append_primitive(&encoded);
            }
            FieldValue::Time(t) => {
                let encoded = self.config.time_encoder.encode(t);
                self.append_primitive(&encoded);
            }
            FieldValue::Error(err) => self.append_str(&err.to_string()),
            FieldValue::Array(items) => {
                self.buf.push(b'[');
                for item in items {
                    self.add_separator();
                    self.append_value(item);
                }
                self.buf.push(b']');
            }
            FieldValue::Object(fields) => {
                let outer = std::mem::take(&mut self.open_namespaces);
                self.buf.push(b'{');
                for field in fields {
                    self.add_field(field);
                }
                self.close_namespaces();
                self.buf.push(b'}');
                self.open_namespaces = outer;
            }
            FieldValue::Namespace => self.buf.extend_from_slice(b"{}"),
            FieldValue::Marshaler(marshaler) => match marshaler.marshal_log() {
                Ok(value) => self.append_value(&value),
                Err(err) => self.append_str(&err.to_string()),
            },
        }
    }

    fn append_primitive(&mut self, value: &Primitive) {
        match value {
            Primitive::Int(i) => self.buf.extend_from_slice(i.to_string().as_bytes()),
            Primitive::Float(f) => self.append_float(*f),
            Primitive::Text(s) => self.append_str(s),
        }
    }

    fn append_float(&mut self, value: f64) {
        match serde_json::Number::from_f64(value) {
            Some(number) => self.buf.extend_from_slice(number.to_string().as_bytes()),
            None if value.is_nan() => self.buf.extend_from_slice(b"\"NaN\""),
            None if value > 0.0 => self.buf.extend_from_slice(b"\"+Inf\""),
            None => self.buf.extend_from_slice(b"\"-Inf\""),
        }
    }

    fn append_str(&mut self, s: &str) {
        escape_into(&mut self.buf, s);
    }
}

/// Write `s` as a quoted JSON string.
fn escape_into(buf: &mut Vec<u8>, s: &str) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (idx, &byte) in bytes.iter().enumerate() {
        let escaped: &[u8] = match byte {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x00..=0x1f => {
                buf.extend_from_slice(&bytes[start..idx]);
                buf.extend_from_slice(b"\\u00");
                buf.push(HEX[(byte >> 4) as usize]);
                buf.push(HEX[(byte & 0x0f) as usize]);
                start = idx + 1;
                continue;
            }
            _ => continue,
        };
        buf.extend_from_slice(&bytes[start..idx]);
        buf.extend_from_slice(escaped);
        start = idx + 1;
    }
    buf.extend_from_slice(&bytes[start..]);
    buf.push(b'"');
}
