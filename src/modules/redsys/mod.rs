pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{MerchantData, MerchantKey, PaymentRequest, SignedEnvelope};
pub use services::{
    NotificationOutcome, NotificationVerifier, ParameterCodec, PaymentFormBuilder, SignatureCodec,
};
