use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 全局设置单例（id 恒为 1，仅管理端修改）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "app_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 券恢复间隔（小时，1~24）
    pub ticket_restore_hours: i32,
    /// 常规每日赠券数
    pub daily_tickets: i64,
    /// 首次登录（余额为零）的默认每日赠券数
    pub default_daily_tickets: i64,
    /// 注册赠券数
    pub start_tickets: i64,
    /// 强制空奖模式：所有旋转落在 empty 扇区
    pub always_empty_mode: bool,
    /// 购买一张券所需 Stars 数
    pub stars_per_ticket_purchase: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
