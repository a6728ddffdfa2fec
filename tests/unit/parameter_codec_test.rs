// Round-trip and recovery tests for the Base64 parameter codec and the
// four merchant-data decode strategies.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use courtpay::modules::redsys::models::MerchantData;
use courtpay::modules::redsys::services::ParameterCodec;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn test_encode_decode_round_trip(
        order in "[A-Za-z0-9]{4,12}",
        amount in 1i64..10_000_000i64
    ) {
        let value = json!({ "Ds_Order": order, "Ds_Amount": amount.to_string() });
        let encoded = ParameterCodec::encode(&value).unwrap();
        let decoded = ParameterCodec::decode(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_never_panics_on_garbage(input in "[ -~]{0,100}") {
        let _ = ParameterCodec::decode(&input);
        let _ = ParameterCodec::decode_merchant_data(&input);
    }
}

#[test]
fn test_decode_rejects_invalid_base64() {
    assert!(ParameterCodec::decode("!!!not-base64!!!").is_err());
}

#[test]
fn test_decode_rejects_non_json_payload() {
    let encoded = STANDARD.encode("this is not json");
    assert!(ParameterCodec::decode(&encoded).is_err());
}

#[test]
fn test_decode_tolerates_surrounding_whitespace() {
    let encoded = format!("  {}\n", ParameterCodec::encode(&json!({"a": 1})).unwrap());
    assert_eq!(ParameterCodec::decode(&encoded).unwrap(), json!({"a": 1}));
}

fn topup(order_id: &str) -> MerchantData {
    MerchantData::WalletTopup {
        order_id: order_id.to_string(),
    }
}

#[test]
fn test_merchant_data_from_base64_json() {
    let raw = STANDARD.encode(r#"{"type":"wallet_topup","orderId":"ord-7"}"#);
    assert_eq!(
        ParameterCodec::decode_merchant_data(&raw),
        Some(topup("ord-7"))
    );
}

#[test]
fn test_merchant_data_from_raw_json() {
    assert_eq!(
        ParameterCodec::decode_merchant_data(r#"{"type":"wallet_topup","orderId":"ord-7"}"#),
        Some(topup("ord-7"))
    );
}

#[test]
fn test_merchant_data_from_wrapped_json() {
    // Some gateway paths wrap the JSON in stray characters
    assert_eq!(
        ParameterCodec::decode_merchant_data(
            r#"xx{"type":"wallet_topup","orderId":"ord-7"}yy"#
        ),
        Some(topup("ord-7"))
    );
}

#[test]
fn test_merchant_data_from_url_encoded_json() {
    assert_eq!(
        ParameterCodec::decode_merchant_data(
            "%7B%22type%22%3A%22wallet_topup%22%2C%22orderId%22%3A%22ord-7%22%7D"
        ),
        Some(topup("ord-7"))
    );
}

#[test]
fn test_merchant_data_reservation_variant() {
    let raw = STANDARD.encode(r#"{"type":"reservation","reservationId":"res-3"}"#);
    assert_eq!(
        ParameterCodec::decode_merchant_data(&raw),
        Some(MerchantData::Reservation {
            reservation_id: "res-3".to_string()
        })
    );
}

#[test]
fn test_merchant_data_unknown_type_is_none() {
    assert_eq!(
        ParameterCodec::decode_merchant_data(r#"{"type":"gift_card","orderId":"ord-7"}"#),
        None
    );
}

#[test]
fn test_merchant_data_empty_and_garbage_are_none() {
    assert_eq!(ParameterCodec::decode_merchant_data(""), None);
    assert_eq!(ParameterCodec::decode_merchant_data("   "), None);
    assert_eq!(ParameterCodec::decode_merchant_data("not json at all"), None);
}
