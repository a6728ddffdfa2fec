use crate::config::RedsysConfig;
use crate::core::{AppError, Result};
use crate::modules::outbox::{OutboxEvent, OutboxEventType, OutboxStore};
use crate::modules::redsys::models::{
    MerchantParameters, PaymentRequest, SignedEnvelope, SIGNATURE_VERSION,
};
use crate::modules::redsys::services::parameters::ParameterCodec;
use crate::modules::redsys::services::signature::SignatureCodec;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Standard authorization transaction type
const TRANSACTION_TYPE_AUTHORIZATION: &str = "0";
/// DS_MERCHANT_PAYMETHODS value that enables Bizum
const PAY_METHOD_BIZUM: &str = "z";

/// Assembles the outbound redirect payload: validates the request,
/// builds the protocol parameter map, and produces the signed
/// envelope plus the gateway URL the client form must POST to.
///
/// Nothing is marked paid here; state changes happen only on the
/// verified callback.
pub struct PaymentFormBuilder {
    config: RedsysConfig,
    signature_codec: SignatureCodec,
    outbox: Arc<dyn OutboxStore>,
}

/// Result of building a redirect: the envelope fields and where to
/// submit them
#[derive(Debug, Clone, serde::Serialize)]
pub struct RedirectForm {
    pub action_url: String,
    #[serde(flatten)]
    pub envelope: SignedEnvelope,
}

impl PaymentFormBuilder {
    pub fn new(config: RedsysConfig, outbox: Arc<dyn OutboxStore>) -> Self {
        let signature_codec = SignatureCodec::new(config.merchant_key.clone());
        Self {
            config,
            signature_codec,
            outbox,
        }
    }

    /// Build the signed redirect for a checkout request.
    ///
    /// Persists one PAYMENT_INITIATED outbox event per call for audit;
    /// a failed outbox write is logged but does not block the redirect.
    pub async fn build_redirect(&self, request: &PaymentRequest) -> Result<RedirectForm> {
        validate(request)?;

        let parameters = self.merchant_parameters(request);
        let envelope = self.signed_envelope_of(&request.order_id, &parameters)?;

        info!(
            order = %request.order_id,
            amount_minor = request.amount_minor,
            bizum = request.use_bizum,
            "Built signed payment redirect"
        );

        let audit = OutboxEvent::new(
            OutboxEventType::PaymentInitiated,
            &request.order_id,
            json!({
                "order": request.order_id,
                "amount_minor": request.amount_minor,
                "merchant_code": self.config.merchant_code,
                "parameters": serde_json::to_value(&parameters)?,
            }),
        );
        if let Err(e) = self.outbox.append(audit).await {
            warn!(order = %request.order_id, error = %e, "Failed to record payment initiation");
        }

        Ok(RedirectForm {
            action_url: self.config.environment.action_url().to_string(),
            envelope,
        })
    }

    /// Encode-then-sign as one composed operation. The signature is
    /// computed over the Base64 parameter string, not the raw map;
    /// the gateway reproduces the same ordering on its side.
    fn signed_envelope_of(
        &self,
        order_id: &str,
        parameters: &MerchantParameters,
    ) -> Result<SignedEnvelope> {
        let merchant_parameters = ParameterCodec::encode(parameters)?;
        let signature = self.signature_codec.sign(order_id, &merchant_parameters)?;

        Ok(SignedEnvelope {
            signature_version: SIGNATURE_VERSION.to_string(),
            merchant_parameters,
            signature,
        })
    }

    fn merchant_parameters(&self, request: &PaymentRequest) -> MerchantParameters {
        MerchantParameters {
            amount: request.amount_minor.to_string(),
            order: request.order_id.clone(),
            merchant_code: self.config.merchant_code.clone(),
            currency: self.config.currency.numeric_code().to_string(),
            transaction_type: TRANSACTION_TYPE_AUTHORIZATION.to_string(),
            terminal: self.config.terminal.clone(),
            merchant_url: self.config.merchant_url.clone(),
            url_ok: self.config.url_ok.clone(),
            url_ko: self.config.url_ko.clone(),
            product_description: request.description.clone(),
            card_holder: request.card_holder.clone(),
            merchant_name: self.config.merchant_name.clone(),
            pay_methods: request.use_bizum.then(|| PAY_METHOD_BIZUM.to_string()),
            merchant_data: request
                .merchant_data
                .as_ref()
                .map(|data| STANDARD.encode(data.to_string().as_bytes())),
        }
    }
}

fn validate(request: &PaymentRequest) -> Result<()> {
    if request.amount_minor <= 0 {
        return Err(AppError::validation(format!(
            "Amount must be positive, got {}",
            request.amount_minor
        )));
    }

    let order_len = request.order_id.chars().count();
    if !(4..=12).contains(&order_len) {
        return Err(AppError::validation(format!(
            "Order id must be 4 to 12 characters, got {}",
            order_len
        )));
    }

    Ok(())
}
