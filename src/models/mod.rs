pub mod common;
pub mod settings;
pub mod stars;
pub mod tickets;
pub mod user;
pub mod wheel;

pub use common::*;
pub use settings::*;
pub use stars::*;
pub use tickets::*;
pub use user::*;
pub use wheel::*;
