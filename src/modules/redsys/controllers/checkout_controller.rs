use crate::core::Result;
use crate::modules::redsys::models::PaymentRequest;
use crate::modules::redsys::services::PaymentFormBuilder;
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use tracing::info;

/// Checkout controller: turns a business checkout request into the
/// signed three-field form the browser submits to the gateway
pub struct CheckoutController {
    form_builder: PaymentFormBuilder,
}

impl CheckoutController {
    pub fn new(form_builder: PaymentFormBuilder) -> Self {
        Self { form_builder }
    }

    pub fn configure(cfg: &mut web::ServiceConfig, controller: web::Data<Self>) {
        cfg.service(
            web::scope("/payments/redsys")
                .app_data(controller)
                .service(create_checkout),
        );
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    /// Amount in minor units (centavos)
    amount_minor: i64,
    order_id: String,
    description: Option<String>,
    card_holder: Option<String>,
    merchant_data: Option<serde_json::Value>,
    #[serde(default)]
    use_bizum: bool,
}

/// POST /payments/redsys/checkout
#[post("/checkout")]
async fn create_checkout(
    body: web::Json<CheckoutRequest>,
    controller: web::Data<CheckoutController>,
) -> Result<HttpResponse> {
    let request = PaymentRequest {
        amount_minor: body.amount_minor,
        order_id: body.order_id.clone(),
        description: body.description.clone(),
        card_holder: body.card_holder.clone(),
        merchant_data: body.merchant_data.clone(),
        use_bizum: body.use_bizum,
    };

    let form = controller.form_builder.build_redirect(&request).await?;

    info!(order = %request.order_id, "Checkout redirect issued");

    Ok(HttpResponse::Ok().json(form))
}
