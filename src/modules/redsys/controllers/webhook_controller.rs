use crate::modules::reconciliation::ReconciliationEngine;
use crate::modules::redsys::services::NotificationVerifier;
use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};

/// Webhook controller for the Redsys server-to-server notification.
///
/// The gateway retries aggressively on anything but a 200, so once
/// both envelope fields are present the handler always acknowledges
/// with 200 regardless of verification or business outcome. The only
/// 400 is a genuinely malformed request missing the fields.
pub struct RedsysWebhookController {
    verifier: NotificationVerifier,
    engine: ReconciliationEngine,
}

impl RedsysWebhookController {
    pub fn new(verifier: NotificationVerifier, engine: ReconciliationEngine) -> Self {
        Self { verifier, engine }
    }

    /// Mount under /webhooks; the shared controller handle is cloned
    /// into every worker's app instance
    pub fn configure(cfg: &mut web::ServiceConfig, controller: web::Data<Self>) {
        cfg.service(
            web::scope("/webhooks")
                .app_data(controller)
                .service(receive_notification),
        );
    }
}

/// JSON body shape; the gateway's own field names and the camelCase
/// aliases some integrations send are both accepted
#[derive(Debug, Deserialize)]
struct JsonNotification {
    #[serde(alias = "Ds_Signature", alias = "signature")]
    ds_signature: Option<String>,
    #[serde(alias = "Ds_MerchantParameters", alias = "merchantParameters")]
    ds_merchant_parameters: Option<String>,
}

/// Form-encoded body shape (the gateway's default content type)
#[derive(Debug, Deserialize)]
struct FormNotification {
    #[serde(rename = "Ds_Signature")]
    ds_signature: Option<String>,
    #[serde(rename = "Ds_MerchantParameters")]
    ds_merchant_parameters: Option<String>,
}

fn extract_envelope(req: &HttpRequest, body: &web::Bytes) -> Option<(String, String)> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let (signature, parameters) = if content_type.starts_with("application/json") {
        let parsed: JsonNotification = serde_json::from_slice(body).ok()?;
        (parsed.ds_signature, parsed.ds_merchant_parameters)
    } else {
        let parsed: FormNotification = serde_urlencoded::from_bytes(body).ok()?;
        (parsed.ds_signature, parsed.ds_merchant_parameters)
    };

    Some((signature?, parameters?))
}

/// POST /webhooks/redsys
#[post("/redsys")]
async fn receive_notification(
    req: HttpRequest,
    body: web::Bytes,
    controller: web::Data<RedsysWebhookController>,
) -> HttpResponse {
    let Some((signature, parameters)) = extract_envelope(&req, &body) else {
        warn!("Notification rejected: missing Ds_Signature or Ds_MerchantParameters");
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Missing Ds_Signature or Ds_MerchantParameters"
        }));
    };

    let outcome = controller
        .verifier
        .process_notification(&signature, &parameters)
        .await;

    info!(
        order = ?outcome.order,
        success = outcome.success,
        "Notification processed, reconciling"
    );

    controller.engine.reconcile(&outcome).await;
    controller.verifier.mark_processed(&outcome).await;

    // Always 200 from here on: failures live in logs and persisted
    // state, never in the status code
    HttpResponse::Ok().json(serde_json::json!({
        "received": true,
        "success": outcome.success,
        "order": outcome.order,
    }))
}
