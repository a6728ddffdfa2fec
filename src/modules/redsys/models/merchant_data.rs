use serde::{Deserialize, Serialize};

/// Correlation payload embedded in the outbound request and echoed
/// back unchanged in the notification. Attacker-untrusted until the
/// envelope signature has been verified; anything not matching one of
/// the known variants is rejected at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MerchantData {
    ShopOrder {
        #[serde(rename = "orderId")]
        order_id: String,
    },
    WalletTopup {
        #[serde(rename = "orderId")]
        order_id: String,
    },
    Reservation {
        #[serde(rename = "reservationId")]
        reservation_id: String,
    },
}

impl MerchantData {
    /// The local entity this notification correlates to
    pub fn correlation_id(&self) -> &str {
        match self {
            MerchantData::ShopOrder { order_id } => order_id,
            MerchantData::WalletTopup { order_id } => order_id,
            MerchantData::Reservation { reservation_id } => reservation_id,
        }
    }
}
