pub mod access_token;
pub mod calendar;
pub mod mailer;
pub mod qr;

pub use access_token::{AccessTokenService, TokenClaims, TokenPurpose};
pub use mailer::{ConfirmationMailer, HttpMailer, ReservationConfirmation};
