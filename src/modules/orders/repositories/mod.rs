pub mod order_repository;
pub mod reservation_repository;

pub use order_repository::{OrderRepository, OrderStore};
pub use reservation_repository::{ReservationRepository, ReservationStore};
