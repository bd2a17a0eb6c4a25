use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::wheel_sectors::PrizeType;

/// 抽奖流水（只追加，落盘后不再修改）
/// prize_type/prize_value/sector_number 为抽奖时刻的快照，
/// 扇区配置后续被管理端修改也不影响历史记录。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wheel_spins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub sector_id: i64,
    pub sector_number: i32,
    pub prize_type: PrizeType,
    pub prize_value: i64,
    pub spin_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
