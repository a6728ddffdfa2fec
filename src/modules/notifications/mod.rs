pub mod services;

pub use services::{
    AccessTokenService, ConfirmationMailer, HttpMailer, ReservationConfirmation, TokenPurpose,
};
