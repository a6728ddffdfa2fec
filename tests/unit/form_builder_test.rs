// End-to-end assembly of the outbound redirect form: parameter map
// contents, signature validity, gateway URL selection, and the
// payment-initiated audit event.

use async_trait::async_trait;
use courtpay::config::{RedsysConfig, RedsysEnvironment};
use courtpay::core::{Currency, Result};
use courtpay::modules::outbox::{OutboxEvent, OutboxEventType, OutboxStore};
use courtpay::modules::redsys::models::{MerchantKey, PaymentRequest, SIGNATURE_VERSION};
use courtpay::modules::redsys::services::{ParameterCodec, PaymentFormBuilder, SignatureCodec};
use serde_json::json;
use std::sync::{Arc, Mutex};

const SANDBOX_KEY: &str = "sq7HjrUOBfKmC576ILgskD5srU870gJ7";

#[derive(Default)]
struct RecordingOutbox {
    events: Mutex<Vec<OutboxEvent>>,
}

#[async_trait]
impl OutboxStore for RecordingOutbox {
    async fn append(&self, event: OutboxEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn exists(&self, event_type: OutboxEventType, correlation_id: &str) -> Result<bool> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().any(|e| {
            e.event_type == event_type.to_string() && e.correlation_id == correlation_id
        }))
    }
}

fn config(environment: RedsysEnvironment) -> RedsysConfig {
    RedsysConfig {
        merchant_code: "999008881".to_string(),
        terminal: "1".to_string(),
        merchant_name: Some("Test Club".to_string()),
        currency: Currency::EUR,
        merchant_key: MerchantKey::from_base64(SANDBOX_KEY).unwrap(),
        environment,
        merchant_url: "https://club.example/webhooks/redsys".to_string(),
        url_ok: "https://club.example/payment/ok".to_string(),
        url_ko: "https://club.example/payment/ko".to_string(),
    }
}

fn builder(environment: RedsysEnvironment) -> (PaymentFormBuilder, Arc<RecordingOutbox>) {
    let outbox = Arc::new(RecordingOutbox::default());
    (
        PaymentFormBuilder::new(config(environment), outbox.clone()),
        outbox,
    )
}

fn request(order_id: &str) -> PaymentRequest {
    PaymentRequest {
        amount_minor: 4550,
        order_id: order_id.to_string(),
        description: Some("Court booking".to_string()),
        card_holder: None,
        merchant_data: Some(json!({"type": "reservation", "reservationId": "res-9"})),
        use_bizum: false,
    }
}

#[tokio::test]
async fn test_redirect_carries_expected_parameters() {
    let (builder, _) = builder(RedsysEnvironment::Test);
    let form = builder.build_redirect(&request("00012345")).await.unwrap();

    assert_eq!(form.envelope.signature_version, SIGNATURE_VERSION);

    let params = ParameterCodec::decode(&form.envelope.merchant_parameters).unwrap();
    assert_eq!(params["DS_MERCHANT_AMOUNT"], "4550");
    assert_eq!(params["DS_MERCHANT_ORDER"], "00012345");
    assert_eq!(params["DS_MERCHANT_MERCHANTCODE"], "999008881");
    assert_eq!(params["DS_MERCHANT_CURRENCY"], "978");
    assert_eq!(params["DS_MERCHANT_TRANSACTIONTYPE"], "0");
    assert_eq!(params["DS_MERCHANT_TERMINAL"], "1");
    assert_eq!(
        params["DS_MERCHANT_MERCHANTURL"],
        "https://club.example/webhooks/redsys"
    );
    // No Bizum requested: the pay-methods restriction must be absent
    assert!(params.get("DS_MERCHANT_PAYMETHODS").is_none());
}

#[tokio::test]
async fn test_signature_verifies_against_parameters() {
    let (builder, _) = builder(RedsysEnvironment::Test);
    let form = builder.build_redirect(&request("00012345")).await.unwrap();

    let codec = SignatureCodec::new(MerchantKey::from_base64(SANDBOX_KEY).unwrap());
    assert!(codec.verify(
        &form.envelope.signature,
        "00012345",
        &form.envelope.merchant_parameters
    ));
}

#[tokio::test]
async fn test_merchant_data_is_base64_of_correlation_json() {
    let (builder, _) = builder(RedsysEnvironment::Test);
    let form = builder.build_redirect(&request("00012345")).await.unwrap();

    let params = ParameterCodec::decode(&form.envelope.merchant_parameters).unwrap();
    let raw = params["DS_MERCHANT_MERCHANTDATA"].as_str().unwrap();
    let decoded = ParameterCodec::decode_merchant_data(raw).unwrap();
    assert_eq!(decoded.correlation_id(), "res-9");
}

#[tokio::test]
async fn test_bizum_sets_pay_methods() {
    let (builder, _) = builder(RedsysEnvironment::Test);
    let mut request = request("00012345");
    request.use_bizum = true;

    let form = builder.build_redirect(&request).await.unwrap();
    let params = ParameterCodec::decode(&form.envelope.merchant_parameters).unwrap();
    assert_eq!(params["DS_MERCHANT_PAYMETHODS"], "z");
}

#[tokio::test]
async fn test_environment_selects_gateway_url() {
    let (test_builder, _) = builder(RedsysEnvironment::Test);
    let form = test_builder.build_redirect(&request("00012345")).await.unwrap();
    assert_eq!(
        form.action_url,
        "https://sis-t.redsys.es:25443/sis/realizarPago"
    );

    let (prod_builder, _) = builder(RedsysEnvironment::Production);
    let form = prod_builder.build_redirect(&request("00012345")).await.unwrap();
    assert_eq!(form.action_url, "https://sis.redsys.es/sis/realizarPago");
}

#[tokio::test]
async fn test_initiation_event_recorded() {
    let (builder, outbox) = builder(RedsysEnvironment::Test);
    builder.build_redirect(&request("00012345")).await.unwrap();

    let events = outbox.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "PAYMENT_INITIATED");
    assert_eq!(events[0].correlation_id, "00012345");
    assert_eq!(events[0].payload["amount_minor"], 4550);
}

#[tokio::test]
async fn test_invalid_requests_rejected_before_signing() {
    let (builder, outbox) = builder(RedsysEnvironment::Test);

    let mut bad_amount = request("00012345");
    bad_amount.amount_minor = 0;
    assert!(builder.build_redirect(&bad_amount).await.is_err());

    let mut short_order = request("00012345");
    short_order.order_id = "123".to_string();
    assert!(builder.build_redirect(&short_order).await.is_err());

    let mut long_order = request("00012345");
    long_order.order_id = "1234567890123".to_string();
    assert!(builder.build_redirect(&long_order).await.is_err());

    // Nothing was audited for rejected requests
    assert!(outbox.events.lock().unwrap().is_empty());
}
