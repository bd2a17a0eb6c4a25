use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Mini App 用户（余额记录）
/// 约定:
/// - tickets_depleted_at: 余额归零瞬间写入，余额回正瞬间清空
/// - referral_popup_shown_at: 仅在枯竭期内有意义，余额回正后清空
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Telegram 用户ID (唯一)
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// 当前可用抽奖券数量 (非负)
    pub tickets_available: i64,
    /// 券余额首次归零时间（恢复计时锚点）
    pub tickets_depleted_at: Option<DateTime<Utc>>,
    /// 最近一次每日赠券时间，NULL 表示从未发放
    pub last_ticket_received_at: Option<DateTime<Utc>>,
    pub last_spin_at: Option<DateTime<Utc>>,
    /// 邀请好友弹窗在本枯竭周期内是否已展示
    pub referral_popup_shown_at: Option<DateTime<Utc>>,
    pub total_spins: i64,
    pub total_wins: i64,
    /// Telegram Stars 累计余额（旋转不消耗）
    pub stars_balance: i64,
    pub referrer_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
