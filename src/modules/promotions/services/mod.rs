pub mod bonus_service;

pub use bonus_service::{AppliedBonus, BonusService, RechargeBonusApplier};
