use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 赠券来源
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_source")]
#[serde(rename_all = "snake_case")]
pub enum TicketSource {
    /// 新用户注册赠券
    #[sea_orm(string_value = "initial_bonus")]
    InitialBonus,
    /// 首次登录（余额为零时）的默认每日赠券
    #[sea_orm(string_value = "default_daily_bonus")]
    DefaultDailyBonus,
    /// 常规每日赠券
    #[sea_orm(string_value = "daily_bonus")]
    DailyBonus,
    /// Stars 余额兑换
    #[sea_orm(string_value = "star_exchange")]
    StarExchange,
    /// Telegram Stars 支付到账
    #[sea_orm(string_value = "stars_payment")]
    StarsPayment,
    /// 扇区附加动作 / ticket 类奖品入账
    #[sea_orm(string_value = "prize_type_action")]
    PrizeTypeAction,
    /// 枯竭计时器到期恢复
    #[sea_orm(string_value = "timer_restoration")]
    TimerRestoration,
}

impl std::fmt::Display for TicketSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketSource::InitialBonus => write!(f, "initial_bonus"),
            TicketSource::DefaultDailyBonus => write!(f, "default_daily_bonus"),
            TicketSource::DailyBonus => write!(f, "daily_bonus"),
            TicketSource::StarExchange => write!(f, "star_exchange"),
            TicketSource::StarsPayment => write!(f, "stars_payment"),
            TicketSource::PrizeTypeAction => write!(f, "prize_type_action"),
            TicketSource::TimerRestoration => write!(f, "timer_restoration"),
        }
    }
}

/// 赠券审计流水（只追加，覆盖所有余额增加路径）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    /// 入账券数 (正数)
    pub tickets_count: i64,
    pub source: TicketSource,
    /// 计时器恢复时为恢复时间，其余来源为 NULL
    pub restored_at: Option<DateTime<Utc>>,
    /// Telegram Stars 支付的 charge id（唯一，入账去重用；其余来源为 NULL）
    pub payment_charge_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
