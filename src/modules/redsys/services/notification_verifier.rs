use crate::core::currency::Currency;
use crate::core::{AppError, Result};
use crate::modules::redsys::models::notification_record::{
    EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED,
};
use crate::modules::redsys::models::{
    classify, MerchantKey, NotificationParameters, NotificationRecord, ResponseClassification,
};
use crate::modules::redsys::repositories::WebhookEventStore;
use crate::modules::redsys::services::parameters::ParameterCodec;
use crate::modules::redsys::services::signature::SignatureCodec;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Decodes an inbound notification, checks its signature against the
/// merchant key, classifies the response code, and persists a
/// webhook-event record.
///
/// `process_notification` never propagates an error past this
/// boundary: the HTTP handler has to answer 200 to the gateway
/// regardless of business outcome, so failures are carried in the
/// returned outcome and surfaced through logs and persisted state.
pub struct NotificationVerifier {
    signature_codec: SignatureCodec,
    webhook_events: Arc<dyn WebhookEventStore>,
    currency: Currency,
}

/// What the webhook handler and the reconciliation engine get back
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    /// Signature valid AND response code approved
    pub success: bool,
    /// Gateway order reference, when the parameters decoded
    pub order: Option<String>,
    /// Amount converted back to major units
    pub amount: Option<Decimal>,
    pub authorisation_code: Option<String>,
    pub response_code: Option<String>,
    /// Raw merchant-data sidecar, still undecoded
    pub merchant_data: Option<String>,
    /// Present when verification or decoding failed
    pub error: Option<String>,
    /// Persisted webhook-event row, when the record insert succeeded
    pub record_id: Option<String>,
}

impl NotificationOutcome {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            order: None,
            amount: None,
            authorisation_code: None,
            response_code: None,
            merchant_data: None,
            error: Some(error.into()),
            record_id: None,
        }
    }
}

impl NotificationVerifier {
    pub fn new(
        merchant_key: MerchantKey,
        currency: Currency,
        webhook_events: Arc<dyn WebhookEventStore>,
    ) -> Self {
        Self {
            signature_codec: SignatureCodec::new(merchant_key),
            webhook_events,
            currency,
        }
    }

    /// Decode the parameters, recompute the expected signature from
    /// the order id found inside them, and compare. Distinguishes
    /// decode failures from signature mismatches so the two are
    /// separable in logs.
    pub fn verify(&self, signature: &str, parameters_b64: &str) -> Result<NotificationParameters> {
        let value = ParameterCodec::decode(parameters_b64)?;
        let params = NotificationParameters::from_value(value)?;

        if !self
            .signature_codec
            .verify(signature, &params.order, parameters_b64)
        {
            return Err(AppError::SignatureMismatch(params.order.clone()));
        }

        Ok(params)
    }

    /// Full notification pipeline: verify, classify, persist the
    /// webhook-event row, convert the amount back to major units.
    pub async fn process_notification(
        &self,
        signature: &str,
        parameters_b64: &str,
    ) -> NotificationOutcome {
        let params = match self.verify(signature, parameters_b64) {
            Ok(params) => params,
            Err(AppError::SignatureMismatch(order)) => {
                // Security-relevant: not a malformed payload
                warn!(order = %order, "Notification signature mismatch, discarding");
                return NotificationOutcome::rejected(format!(
                    "signature mismatch for order {}",
                    order
                ));
            }
            Err(e) => {
                warn!(error = %e, "Notification parameters failed to decode");
                return NotificationOutcome::rejected(e.to_string());
            }
        };

        let classification = classify(&params.response);
        let success = classification.is_approved();

        info!(
            order = %params.order,
            response = %params.response,
            outcome = %classification,
            "Verified gateway notification"
        );

        let event_type = if success {
            EVENT_PAYMENT_SUCCEEDED
        } else {
            EVENT_PAYMENT_FAILED
        };
        let event_data = serde_json::to_value(&params).unwrap_or_default();
        let record = NotificationRecord::new(event_type, &params.order, event_data);

        // A failed insert must not turn a verified payment into a 5xx:
        // log it and let reconciliation continue. On redelivery the
        // store hands back the existing row, so the id is stable.
        let record_id = match self.webhook_events.record(record).await {
            Ok(stored) => Some(stored.id),
            Err(e) => {
                error!(order = %params.order, error = %e, "Failed to persist webhook event");
                None
            }
        };

        let amount = match params.amount_minor() {
            Ok(minor) => Some(self.currency.from_minor_units(minor)),
            Err(e) => {
                warn!(order = %params.order, error = %e, "Notification amount did not parse");
                None
            }
        };

        let decline_reason = match classification {
            ResponseClassification::Approved => None,
            ResponseClassification::Declined { reason } => Some(reason),
        };

        NotificationOutcome {
            success,
            order: Some(params.order),
            amount,
            authorisation_code: params.authorisation_code,
            response_code: Some(params.response),
            merchant_data: params.merchant_data,
            error: decline_reason,
            record_id,
        }
    }

    /// Flag the persisted webhook event as processed once
    /// reconciliation has run. Operator-facing only; a failure is
    /// logged and never reaches the gateway response.
    pub async fn mark_processed(&self, outcome: &NotificationOutcome) {
        let Some(record_id) = outcome.record_id.as_deref() else {
            return;
        };
        if let Err(e) = self.webhook_events.mark_processed(record_id).await {
            error!(record = %record_id, error = %e, "Failed to mark webhook event processed");
        }
    }
}
