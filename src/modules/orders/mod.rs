pub mod models;
pub mod repositories;

pub use models::{Order, PaymentStatus, Reservation};
pub use repositories::{OrderRepository, OrderStore, ReservationRepository, ReservationStore};
