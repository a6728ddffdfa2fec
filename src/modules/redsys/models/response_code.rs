use std::fmt;

/// Outcome of classifying a gateway response code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClassification {
    /// Numeric response code in 0..=99
    Approved,
    /// Everything else, with a human-readable reason
    Declined { reason: String },
}

impl ResponseClassification {
    pub fn is_approved(&self) -> bool {
        matches!(self, ResponseClassification::Approved)
    }
}

impl fmt::Display for ResponseClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseClassification::Approved => write!(f, "approved"),
            ResponseClassification::Declined { reason } => write!(f, "declined: {}", reason),
        }
    }
}

/// Classify a gateway response code: 0..=99 inclusive is an approved
/// payment, anything else a decline. Code 900 (authorised for refunds
/// and confirmations) intentionally stays outside the approved range.
pub fn classify(code: &str) -> ResponseClassification {
    if let Ok(numeric) = code.trim().parse::<i64>() {
        if (0..=99).contains(&numeric) {
            return ResponseClassification::Approved;
        }
        if let Some(reason) = describe(numeric) {
            return ResponseClassification::Declined {
                reason: reason.to_string(),
            };
        }
    }

    ResponseClassification::Declined {
        reason: format!("unknown error ({})", code),
    }
}

/// Fixed decline-code descriptions published by the gateway
pub fn describe(code: i64) -> Option<&'static str> {
    match code {
        101 => Some("expired card"),
        102 => Some("card under suspicion of fraud"),
        106 => Some("PIN attempts exceeded"),
        125 => Some("card not effective"),
        129 => Some("CVV2/CVC2 mismatch"),
        180 => Some("card not supported by this service"),
        184 => Some("cardholder authentication failed"),
        190 => Some("declined by issuer without reason"),
        191 => Some("wrong expiry date"),
        904 => Some("merchant not registered at FUC"),
        909 => Some("system error"),
        912 => Some("issuer not available"),
        913 => Some("repeated order"),
        944 => Some("invalid session"),
        950 => Some("refund operation not allowed"),
        _ => None,
    }
}
