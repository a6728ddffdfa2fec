use crate::config::AccessTokenConfig;
use crate::core::{AppError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// What a token grants access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Receipt,
    EntryPass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Reservation id the token is bound to
    pub rid: String,
    pub purpose: TokenPurpose,
    /// Unix expiry timestamp
    pub exp: i64,
}

/// Issues and validates the time-boxed signed tokens embedded in
/// receipt and entry-pass URLs. Format: base64url(claims JSON) "."
/// hex(HMAC-SHA256 of the encoded claims).
#[derive(Clone)]
pub struct AccessTokenService {
    secret: Vec<u8>,
    receipt_ttl: Duration,
    pass_ttl: Duration,
}

impl AccessTokenService {
    pub fn new(config: &AccessTokenConfig) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            receipt_ttl: Duration::hours(config.receipt_ttl_hours),
            pass_ttl: Duration::hours(config.pass_ttl_hours),
        }
    }

    pub fn issue(
        &self,
        reservation_id: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let ttl = match purpose {
            TokenPurpose::Receipt => self.receipt_ttl,
            TokenPurpose::EntryPass => self.pass_ttl,
        };
        let claims = TokenClaims {
            rid: reservation_id.to_string(),
            purpose,
            exp: (now + ttl).timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        Ok(format!("{}.{}", payload, self.signature_of(&payload)?))
    }

    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AppError::validation("Malformed access token"))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(payload.as_bytes());
        let supplied =
            hex::decode(signature).map_err(|_| AppError::validation("Invalid token signature"))?;
        if mac.verify_slice(&supplied).is_err() {
            return Err(AppError::validation("Invalid token signature"));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AppError::validation("Malformed access token payload"))?;
        let claims: TokenClaims = serde_json::from_slice(&bytes)?;

        if claims.exp < now.timestamp() {
            return Err(AppError::validation("Access token expired"));
        }

        Ok(claims)
    }

    fn signature_of(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
