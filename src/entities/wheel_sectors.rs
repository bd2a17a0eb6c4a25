use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 奖品类型（封闭枚举，spin 的奖励分支按此穷举）
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "prize_type")]
#[serde(rename_all = "snake_case")]
pub enum PrizeType {
    /// 现金奖：不自动入账，由管理员线下发放
    #[sea_orm(string_value = "money")]
    Money,
    /// 赠券：prize_value 张直接入账
    #[sea_orm(string_value = "ticket")]
    Ticket,
    #[sea_orm(string_value = "secret_box")]
    SecretBox,
    #[sea_orm(string_value = "sponsor_gift")]
    SponsorGift,
    /// 谢谢参与
    #[sea_orm(string_value = "empty")]
    Empty,
}

impl std::fmt::Display for PrizeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrizeType::Money => write!(f, "money"),
            PrizeType::Ticket => write!(f, "ticket"),
            PrizeType::SecretBox => write!(f, "secret_box"),
            PrizeType::SponsorGift => write!(f, "sponsor_gift"),
            PrizeType::Empty => write!(f, "empty"),
        }
    }
}

/// 扇区附加动作（与奖品类型效果叠加，不互斥）
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sector_action_type")]
#[serde(rename_all = "snake_case")]
pub enum SectorActionType {
    #[sea_orm(string_value = "add_ticket")]
    AddTicket,
}

/// 转盘扇区配置实体
/// 概念说明:
/// - sector_number: 1~12，唯一，对应转盘上的物理位置
/// - probability_percent: 概率（百分比，小数），活动扇区之和应为 100
/// - action_type / action_value: 可选附加动作，与 prize_type 效果叠加
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wheel_sectors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 扇区编号 (1~12, 唯一)
    pub sector_number: i32,
    pub prize_type: PrizeType,
    /// 奖品面值：money 为货币单位，ticket 为券数，其余为 0
    pub prize_value: i64,
    /// 中奖概率（百分比）
    #[sea_orm(column_type = "Double")]
    pub probability_percent: f64,
    /// 附加动作类型 (NULL = 无)
    pub action_type: Option<SectorActionType>,
    /// 附加动作数值 (NULL = 无)
    pub action_value: Option<i64>,
    /// 是否启用
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
