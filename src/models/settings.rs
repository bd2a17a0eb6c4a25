use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::entities::app_setting_entity as settings_entity;

/// 转盘全局设置值对象
///
/// 每次核心操作（余额评估 / spin）从数据库读出后显式传入，
/// 不做任何全局/进程级缓存，管理端修改立即生效。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelSettings {
    pub ticket_restore_hours: i32,
    pub daily_tickets: i64,
    pub default_daily_tickets: i64,
    pub start_tickets: i64,
    pub always_empty_mode: bool,
    pub stars_per_ticket_purchase: i64,
}

impl WheelSettings {
    pub fn restore_interval(&self) -> Duration {
        Duration::hours(self.ticket_restore_hours as i64)
    }

    pub fn restore_interval_seconds(&self) -> i64 {
        (self.ticket_restore_hours as i64) * 3600
    }
}

impl From<settings_entity::Model> for WheelSettings {
    fn from(m: settings_entity::Model) -> Self {
        WheelSettings {
            ticket_restore_hours: m.ticket_restore_hours,
            daily_tickets: m.daily_tickets,
            default_daily_tickets: m.default_daily_tickets,
            start_tickets: m.start_tickets,
            always_empty_mode: m.always_empty_mode,
            stars_per_ticket_purchase: m.stars_per_ticket_purchase,
        }
    }
}
