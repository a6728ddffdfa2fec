pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Promotion, PromotionApplication};
pub use repositories::PromotionRepository;
pub use services::{AppliedBonus, BonusService, RechargeBonusApplier};
