pub mod merchant_data;
pub mod merchant_key;
pub mod notification_record;
pub mod parameters;
pub mod response_code;

pub use merchant_data::MerchantData;
pub use merchant_key::MerchantKey;
pub use notification_record::NotificationRecord;
pub use parameters::{
    MerchantParameters, NotificationParameters, PaymentRequest, SignedEnvelope, SIGNATURE_VERSION,
};
pub use response_code::{classify, ResponseClassification};
