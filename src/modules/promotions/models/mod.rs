pub mod promotion;

pub use promotion::{Promotion, PromotionApplication, CATEGORY_RECHARGE_BONUS};
