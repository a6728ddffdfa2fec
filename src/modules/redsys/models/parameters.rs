use crate::core::{AppError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Signature version tag the gateway expects on every envelope
pub const SIGNATURE_VERSION: &str = "HMAC_SHA256_V1";

/// A checkout request as the business layer hands it to the form
/// builder. Ephemeral: never persisted as its own entity.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Amount in the gateway's minor currency unit (centavos)
    pub amount_minor: i64,
    /// Gateway order identifier, 4 to 12 characters
    pub order_id: String,
    pub description: Option<String>,
    pub card_holder: Option<String>,
    /// Opaque correlation payload echoed back in the notification
    pub merchant_data: Option<serde_json::Value>,
    /// Route the payment through Bizum instead of card entry
    pub use_bizum: bool,
}

/// The three POST fields the client form submits to realizarPago
#[derive(Debug, Clone, Serialize)]
pub struct SignedEnvelope {
    #[serde(rename = "Ds_SignatureVersion")]
    pub signature_version: String,
    #[serde(rename = "Ds_MerchantParameters")]
    pub merchant_parameters: String,
    #[serde(rename = "Ds_Signature")]
    pub signature: String,
}

/// Outbound protocol parameter map. Field names are the gateway's
/// fixed vocabulary and must match byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerchantParameters {
    #[serde(rename = "DS_MERCHANT_AMOUNT")]
    pub amount: String,
    #[serde(rename = "DS_MERCHANT_ORDER")]
    pub order: String,
    #[serde(rename = "DS_MERCHANT_MERCHANTCODE")]
    pub merchant_code: String,
    #[serde(rename = "DS_MERCHANT_CURRENCY")]
    pub currency: String,
    #[serde(rename = "DS_MERCHANT_TRANSACTIONTYPE")]
    pub transaction_type: String,
    #[serde(rename = "DS_MERCHANT_TERMINAL")]
    pub terminal: String,
    #[serde(rename = "DS_MERCHANT_MERCHANTURL")]
    pub merchant_url: String,
    #[serde(rename = "DS_MERCHANT_URLOK")]
    pub url_ok: String,
    #[serde(rename = "DS_MERCHANT_URLKO")]
    pub url_ko: String,
    #[serde(
        rename = "DS_MERCHANT_PRODUCTDESCRIPTION",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub product_description: Option<String>,
    #[serde(
        rename = "DS_MERCHANT_TITULAR",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub card_holder: Option<String>,
    #[serde(
        rename = "DS_MERCHANT_MERCHANTNAME",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub merchant_name: Option<String>,
    /// "z" enables Bizum
    #[serde(
        rename = "DS_MERCHANT_PAYMETHODS",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub pay_methods: Option<String>,
    /// Base64 of arbitrary JSON, echoed back in the notification
    #[serde(
        rename = "DS_MERCHANT_MERCHANTDATA",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub merchant_data: Option<String>,
}

/// Inbound notification parameters. Tolerant of extra fields and of
/// the gateway sending numerics as either strings or numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationParameters {
    #[serde(rename = "Ds_Order", alias = "DS_ORDER")]
    pub order: String,
    #[serde(
        rename = "Ds_Response",
        alias = "DS_RESPONSE",
        deserialize_with = "string_or_number"
    )]
    pub response: String,
    #[serde(
        rename = "Ds_Amount",
        alias = "DS_AMOUNT",
        deserialize_with = "string_or_number"
    )]
    pub amount: String,
    #[serde(rename = "Ds_Currency", default)]
    pub currency: Option<String>,
    #[serde(rename = "Ds_MerchantCode", default)]
    pub merchant_code: Option<String>,
    #[serde(rename = "Ds_Terminal", default)]
    pub terminal: Option<String>,
    #[serde(rename = "Ds_AuthorisationCode", default)]
    pub authorisation_code: Option<String>,
    #[serde(rename = "Ds_TransactionType", default)]
    pub transaction_type: Option<String>,
    #[serde(rename = "Ds_SecurePayment", default)]
    pub secure_payment: Option<String>,
    #[serde(rename = "Ds_Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Ds_Hour", default)]
    pub hour: Option<String>,
    #[serde(rename = "Ds_MerchantData", default)]
    pub merchant_data: Option<String>,
}

impl NotificationParameters {
    /// Parse from the decoded parameter map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::decode(format!("Malformed notification parameters: {}", e)))
    }

    /// Amount in minor units, as sent by the gateway
    pub fn amount_minor(&self) -> Result<i64> {
        self.amount
            .parse()
            .map_err(|_| AppError::decode(format!("Invalid Ds_Amount: {}", self.amount)))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
