//! Encoder implementations

pub mod console;
pub mod json;

pub use console::ConsoleEncoder;
pub use json::JsonEncoder;

use crate::core::{Encoder, EncoderConfig, LoggerError, Result};

/// Build the encoder registered under `name` (`"json"` or `"console"`).
pub fn new_encoder(name: &str, config: EncoderConfig) -> Result<Box<dyn Encoder>> {
    match name {
        "json" => Ok(Box::new(JsonEncoder::new(config))),
        "console" => Ok(Box::new(ConsoleEncoder::new(config))),
        other => Err(LoggerError::UnknownEncoding(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_encoding() {
        assert!(new_encoder("json", EncoderConfig::production()).is_ok());
        assert!(new_encoder("console", EncoderConfig::development()).is_ok());
        assert!(matches!(
            new_encoder("yaml", EncoderConfig::default()),
            Err(LoggerError::UnknownEncoding(name)) if name == "yaml"
        ));
    }
}
