pub mod settings_service;
pub mod stars_service;
pub mod ticket_service;
pub mod user_locks;
pub mod user_service;
pub mod wheel_service;

pub use stars_service::*;
pub use ticket_service::{TicketService, TicketState};
pub use user_locks::UserLocks;
pub use user_service::*;
pub use wheel_service::{WheelService, resolve_prize};
