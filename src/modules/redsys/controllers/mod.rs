pub mod checkout_controller;
pub mod webhook_controller;

pub use checkout_controller::CheckoutController;
pub use webhook_controller::RedsysWebhookController;
