pub mod app_settings;
pub mod ticket_ledger;
pub mod users;
pub mod wheel_sectors;
pub mod wheel_spins;

pub use app_settings as app_setting_entity;
pub use ticket_ledger as ticket_ledger_entity;
pub use users as user_entity;
pub use wheel_sectors as wheel_sector_entity;
pub use wheel_spins as wheel_spin_entity;

pub use ticket_ledger::TicketSource;
pub use wheel_sectors::{PrizeType, SectorActionType};
