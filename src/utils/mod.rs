pub mod jwt;
pub mod spin_math;
pub mod telegram_auth;

pub use jwt::*;
pub use spin_math::{compute_rotation, pick_by_weight, sector_center_offset};
pub use telegram_auth::{TelegramUser, validate_init_data};
