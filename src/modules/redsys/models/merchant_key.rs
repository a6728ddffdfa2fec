use crate::core::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// The shared merchant secret: exactly 24 raw bytes, configured as a
/// Base64 string. Validated at construction so a malformed key is a
/// startup failure, never a per-request one.
#[derive(Clone)]
pub struct MerchantKey([u8; 24]);

impl MerchantKey {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            AppError::Configuration(format!("Merchant key is not valid Base64: {}", e))
        })?;

        let key: [u8; 24] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            AppError::Configuration(format!(
                "Merchant key must decode to exactly 24 bytes, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

// Never leak key material through logs
impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerchantKey([redacted; 24 bytes])")
    }
}
