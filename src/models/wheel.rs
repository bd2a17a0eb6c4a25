use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{PrizeType, wheel_sector_entity as sector_entity};

/// 扇区信息（用于前端渲染转盘）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectorResponse {
    pub id: i64,
    /// 扇区编号 (1~12)
    pub sector_number: i32,
    pub prize_type: PrizeType,
    pub prize_value: i64,
    /// 中奖概率（百分比）
    pub probability_percent: f64,
    pub is_active: bool,
}

impl From<sector_entity::Model> for SectorResponse {
    fn from(m: sector_entity::Model) -> Self {
        SectorResponse {
            id: m.id,
            sector_number: m.sector_number,
            prize_type: m.prize_type,
            prize_value: m.prize_value,
            probability_percent: m.probability_percent,
            is_active: m.is_active,
        }
    }
}

/// 抽中的扇区（spin 响应内嵌，隐藏概率等配置字段）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WonSector {
    pub id: i64,
    pub sector_number: i32,
    pub prize_type: PrizeType,
    pub prize_value: i64,
}

impl From<&sector_entity::Model> for WonSector {
    fn from(m: &sector_entity::Model) -> Self {
        WonSector {
            id: m.id,
            sector_number: m.sector_number,
            prize_type: m.prize_type,
            prize_value: m.prize_value,
        }
    }
}

/// 抽奖（Spin）响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinResponse {
    /// 抽奖记录ID
    pub spin_id: i64,
    pub sector: WonSector,
    /// 客户端动画目标角度（度，单调递增）
    pub rotation: f64,
    /// 本次消耗后的剩余券数（含奖励入账）
    pub tickets_available: i64,
    /// 是否抽中实际奖品（empty 为 false）
    pub prize_awarded: bool,
    pub restore_interval_hours: i32,
    pub restore_interval_seconds: i64,
    /// 恢复计时器到期时间（仅余额为零且计时器已上膛时非空）
    pub next_ticket_at: Option<DateTime<Utc>>,
    pub seconds_until_next_ticket: Option<i64>,
}

/// 抽奖历史记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SpinHistoryQuery {
    /// 返回条数上限 (默认 20, 最大 100)
    pub limit: Option<u32>,
}

/// 抽奖历史记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinRecordResponse {
    pub id: i64,
    pub sector_number: i32,
    pub prize_type: PrizeType,
    pub prize_value: i64,
    pub spin_time: DateTime<Utc>,
}

impl From<crate::entities::wheel_spin_entity::Model> for SpinRecordResponse {
    fn from(m: crate::entities::wheel_spin_entity::Model) -> Self {
        SpinRecordResponse {
            id: m.id,
            sector_number: m.sector_number,
            prize_type: m.prize_type,
            prize_value: m.prize_value,
            spin_time: m.spin_time,
        }
    }
}
