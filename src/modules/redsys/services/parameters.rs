use crate::core::{AppError, Result};
use crate::modules::redsys::models::MerchantData;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::debug;

/// Canonical JSON <-> Base64 codec for the protocol parameter blob,
/// plus best-effort recovery of the merchant-data sidecar.
pub struct ParameterCodec;

impl ParameterCodec {
    /// JSON-stringify then Base64-encode the UTF-8 bytes. The output
    /// is the exact string the signature is computed over.
    pub fn encode<T: Serialize>(parameters: &T) -> Result<String> {
        let json = serde_json::to_string(parameters)?;
        Ok(STANDARD.encode(json.as_bytes()))
    }

    /// Inverse of encode. Called on attacker-controlled input: bad
    /// Base64 or bad JSON comes back as a typed decode error, never a
    /// panic.
    pub fn decode(parameters_b64: &str) -> Result<serde_json::Value> {
        let bytes = STANDARD
            .decode(parameters_b64.trim())
            .map_err(|e| AppError::decode(format!("Parameters are not valid Base64: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::decode(format!("Parameters are not valid JSON: {}", e)))
    }

    /// Best-effort decode of the correlation sidecar. The gateway and
    /// intermediate integrations are known to re-encode this value, so
    /// four strategies are tried in order:
    ///   1. Base64 -> UTF-8 -> JSON
    ///   2. raw string -> JSON
    ///   3. substring between first '{' and last '}' -> JSON
    ///   4. URL-decode -> JSON
    ///
    /// Returns None when all fail; the webhook must still acknowledge
    /// the gateway, so this is not an error path.
    pub fn decode_merchant_data(raw: &str) -> Option<MerchantData> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(bytes) = STANDARD.decode(trimmed) {
            if let Ok(text) = String::from_utf8(bytes) {
                if let Ok(data) = serde_json::from_str(&text) {
                    return Some(data);
                }
            }
        }

        if let Ok(data) = serde_json::from_str(trimmed) {
            return Some(data);
        }

        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                if let Ok(data) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(data);
                }
            }
        }

        if let Ok(decoded) = urlencoding::decode(trimmed) {
            if let Ok(data) = serde_json::from_str(&decoded) {
                return Some(data);
            }
        }

        debug!(raw = %trimmed, "Merchant data did not decode under any strategy");
        None
    }
}
