// Response-code classification: the 0..=99 approval window, the fixed
// decline table, and the unknown-code fallback.

use courtpay::modules::redsys::models::response_code::describe;
use courtpay::modules::redsys::models::{classify, ResponseClassification};
use proptest::prelude::*;

#[test]
fn test_approval_window_boundaries() {
    assert!(classify("0").is_approved());
    assert!(classify("00").is_approved());
    assert!(classify("0000").is_approved());
    assert!(classify("99").is_approved());
    assert!(!classify("100").is_approved());
    assert!(!classify("-1").is_approved());
}

#[test]
fn test_leading_zeros_and_whitespace_tolerated() {
    assert!(classify(" 0 ").is_approved());
    assert!(classify("007").is_approved());
}

#[test]
fn test_known_decline_table() {
    for (code, reason) in [
        ("101", "expired card"),
        ("129", "CVV2/CVC2 mismatch"),
        ("184", "cardholder authentication failed"),
        ("190", "declined by issuer without reason"),
        ("913", "repeated order"),
    ] {
        assert_eq!(
            classify(code),
            ResponseClassification::Declined {
                reason: reason.to_string()
            },
            "code {}",
            code
        );
    }
}

#[test]
fn test_unknown_code_reason_names_the_code() {
    match classify("777") {
        ResponseClassification::Declined { reason } => assert!(reason.contains("777")),
        other => panic!("expected decline, got {:?}", other),
    }
}

#[test]
fn test_non_numeric_code_declined() {
    assert!(!classify("abc").is_approved());
    assert!(!classify("").is_approved());
}

#[test]
fn test_refund_authorisation_is_not_a_payment_approval() {
    // 900 means "authorised for refunds/confirmations", never a sale
    assert!(!classify("900").is_approved());
}

#[test]
fn test_describe_covers_only_the_published_table() {
    assert_eq!(describe(101), Some("expired card"));
    assert_eq!(describe(950), Some("refund operation not allowed"));
    assert_eq!(describe(42), None);
    assert_eq!(describe(777), None);
}

proptest! {
    #[test]
    fn test_every_code_classifies_without_panic(code in "[ -~]{0,10}") {
        let _ = classify(&code);
    }

    #[test]
    fn test_numeric_window_is_exact(code in -1000i64..1000i64) {
        let approved = classify(&code.to_string()).is_approved();
        prop_assert_eq!(approved, (0..=99).contains(&code));
    }
}
