pub mod order;
pub mod reservation;

pub use order::{Order, PaymentStatus};
pub use reservation::Reservation;
