pub mod form_builder;
pub mod notification_verifier;
pub mod parameters;
pub mod signature;

pub use form_builder::{PaymentFormBuilder, RedirectForm};
pub use notification_verifier::{NotificationOutcome, NotificationVerifier};
pub use parameters::ParameterCodec;
pub use signature::SignatureCodec;
