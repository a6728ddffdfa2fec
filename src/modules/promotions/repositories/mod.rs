pub mod promotion_repository;

pub use promotion_repository::PromotionRepository;
