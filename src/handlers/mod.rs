pub mod auth;
pub mod stars;
pub mod tickets;
pub mod user;
pub mod webhook;
pub mod wheel;

pub use auth::auth_config;
pub use stars::stars_config;
pub use tickets::tickets_config;
pub use user::user_config;
pub use webhook::webhook_config;
pub use wheel::wheel_config;
