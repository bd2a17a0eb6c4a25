use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// 券余额查询响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketBalanceResponse {
    pub tickets_available: i64,
    pub last_spin_at: Option<DateTime<Utc>>,
    pub restore_interval_hours: i32,
    pub restore_interval_seconds: i64,
    /// 恢复计时器到期时间；未上膛（余额为正）时为 NULL
    pub next_ticket_at: Option<DateTime<Utc>>,
    /// 距下一张恢复券的秒数（非负）；未上膛时为 NULL
    pub seconds_until_next_ticket: Option<i64>,
    /// 本枯竭周期内是否应展示"邀请好友"弹窗
    pub should_show_referral_popup: bool,
}
