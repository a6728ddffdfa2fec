use crate::core::{AppError, Result};
use crate::modules::redsys::models::MerchantKey;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use cbc::cipher::block_padding::ZeroPadding;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type HmacSha256 = Hmac<Sha256>;

/// Produces and verifies the HMAC-SHA256 signatures the gateway
/// requires. Signing is deterministic: the per-order key is the 3DES
/// ciphertext of the order id, and HMAC has no nonce.
#[derive(Debug, Clone)]
pub struct SignatureCodec {
    merchant_key: MerchantKey,
}

impl SignatureCodec {
    pub fn new(merchant_key: MerchantKey) -> Self {
        Self { merchant_key }
    }

    /// Derive the per-order HMAC key: 3DES-CBC encrypt the UTF-8 order
    /// id under the merchant secret with a zero IV.
    ///
    /// The plaintext is ZERO-padded (not PKCS#7) to the next multiple
    /// of 8 bytes; the raw ciphertext is the key, untruncated. Both
    /// details are gateway protocol requirements: get either wrong and
    /// every signature silently mismatches.
    pub fn derive_key(&self, order_id: &str) -> Result<Vec<u8>> {
        let iv = [0u8; 8];

        let encryptor = TdesCbcEnc::new_from_slices(self.merchant_key.as_bytes(), &iv)
            .map_err(|e| AppError::internal(format!("3DES initialization failed: {}", e)))?;

        Ok(encryptor.encrypt_padded_vec_mut::<ZeroPadding>(order_id.as_bytes()))
    }

    /// HMAC-SHA256 over the UTF-8 bytes of the *already Base64-encoded*
    /// parameter string, Base64-encoded. Signing the raw JSON instead
    /// of the Base64 string is the classic integration mistake.
    pub fn sign(&self, order_id: &str, parameters_b64: &str) -> Result<String> {
        let derived = self.derive_key(order_id)?;

        let mut mac = HmacSha256::new_from_slice(&derived)
            .map_err(|e| AppError::internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(parameters_b64.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Recompute the signature for (order id, parameters) and compare
    /// against the supplied one in constant time.
    ///
    /// The gateway emits notification signatures in the URL-safe
    /// Base64 alphabet; both alphabets are accepted here.
    pub fn verify(&self, signature_b64: &str, order_id: &str, parameters_b64: &str) -> bool {
        let Some(supplied) = decode_either_alphabet(signature_b64) else {
            return false;
        };

        let Ok(derived) = self.derive_key(order_id) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&derived) else {
            return false;
        };
        mac.update(parameters_b64.as_bytes());

        // Mac::verify_slice is a constant-time comparison
        mac.verify_slice(&supplied).is_ok()
    }
}

fn decode_either_alphabet(input: &str) -> Option<Vec<u8>> {
    STANDARD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .ok()
}
