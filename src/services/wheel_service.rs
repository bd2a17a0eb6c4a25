use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{
    PrizeType, SectorActionType, TicketSource, user_entity as users,
    wheel_sector_entity as sectors, wheel_spin_entity as spins,
};
use crate::error::{AppError, AppResult};
use crate::models::{SectorResponse, SpinRecordResponse, SpinResponse, WonSector};
use crate::services::settings_service;
use crate::services::ticket_service::{TicketService, TicketState};
use crate::services::user_locks::UserLocks;
use crate::utils::spin_math;

/// 奖励结算结果（纯演算，不触库）
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeOutcome {
    /// 需要入账的赠券批次（类型效果与附加动作各为一笔，叠加生效）
    pub ticket_grants: Vec<i64>,
    /// total_wins 增量
    pub wins_delta: i64,
    /// 是否抽中实际奖品
    pub prize_awarded: bool,
}

/// 按奖品类型结算效果。
///
/// money / secret_box / sponsor_gift 不自动入账（线下发放），只计胜场；
/// ticket 类直接入账；empty 无效果。附加动作 add_ticket 与类型效果
/// 叠加，不互斥。
pub fn resolve_prize(sector: &sectors::Model) -> PrizeOutcome {
    let mut outcome = match sector.prize_type {
        PrizeType::Empty => PrizeOutcome {
            ticket_grants: Vec::new(),
            wins_delta: 0,
            prize_awarded: false,
        },
        PrizeType::Ticket => PrizeOutcome {
            ticket_grants: if sector.prize_value > 0 {
                vec![sector.prize_value]
            } else {
                Vec::new()
            },
            wins_delta: 0,
            prize_awarded: true,
        },
        PrizeType::Money | PrizeType::SecretBox | PrizeType::SponsorGift => PrizeOutcome {
            ticket_grants: Vec::new(),
            wins_delta: 1,
            prize_awarded: true,
        },
    };

    if sector.action_type == Some(SectorActionType::AddTicket)
        && let Some(value) = sector.action_value
        && value > 0
    {
        outcome.ticket_grants.push(value);
    }

    outcome
}

/// 被选中扇区的字段完整性校验（配置错误在这里拦截）
fn validate_sector(sector: &sectors::Model) -> AppResult<()> {
    if sector.sector_number < 1 || sector.sector_number > spin_math::WHEEL_SECTORS {
        return Err(AppError::InvalidSectorData(format!(
            "sector id={} has out-of-range sector_number={}",
            sector.id, sector.sector_number
        )));
    }
    if sector.prize_value < 0 {
        return Err(AppError::InvalidSectorData(format!(
            "sector id={} has negative prize_value={}",
            sector.id, sector.prize_value
        )));
    }
    if sector.action_type.is_some() && sector.action_value.is_none() {
        return Err(AppError::InvalidSectorData(format!(
            "sector id={} has action_type without action_value",
            sector.id
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WheelService {
    pool: DatabaseConnection,
    locks: UserLocks,
    ticket_service: TicketService,
}

impl WheelService {
    pub fn new(pool: DatabaseConnection, locks: UserLocks, ticket_service: TicketService) -> Self {
        Self {
            pool,
            locks,
            ticket_service,
        }
    }

    /// 获取启用的扇区目录（前端渲染转盘用）
    pub async fn list_sectors(&self) -> AppResult<Vec<SectorResponse>> {
        let list = settings_service::load_active_sectors(&self.pool).await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 抽奖历史（倒序）
    pub async fn list_history(
        &self,
        user_id: i64,
        limit: Option<u32>,
    ) -> AppResult<Vec<SpinRecordResponse>> {
        let limit = limit.unwrap_or(20).clamp(1, 100);
        let list = spins::Entity::find()
            .filter(spins::Column::UserId.eq(user_id))
            .order_by_desc(spins::Column::SpinTime)
            .limit(limit as u64)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 抽奖 (Spin)
    ///
    /// 逻辑（单事务，持用户锁）:
    /// 1. 状态机预评估（每日赠券 / 到期恢复先结算）
    /// 2. 余额校验，不足则拒绝
    /// 3. 按概率选择扇区（强制空奖模式在 empty 扇区内均匀选择）
    /// 4. 扣券、写抽奖流水
    /// 5. 按奖品类型结算效果（叠加扇区附加动作）
    /// 6. 计算动画角度并组装响应
    pub async fn spin(&self, user_id: i64) -> AppResult<SpinResponse> {
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let settings = settings_service::load_settings(&txn).await?;
        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 1. 状态机预评估
        let user = self
            .ticket_service
            .run_state_machine(&txn, user, &settings, now)
            .await?;

        // 2. 任何变更前先做余额校验
        if user.tickets_available <= 0 {
            return Err(AppError::NoTicketsAvailable);
        }

        // 3. 选择扇区
        let catalog = settings_service::load_active_sectors(&txn).await?;
        let (selected, extra_turns) =
            select_sector(&catalog, settings.always_empty_mode)?;
        validate_sector(&selected)?;

        // 4. 扣券 + 计数，归零则按状态机规则上膛（并清残留弹窗标记）
        let outcome = resolve_prize(&selected);
        let mut post = TicketState::from_user(&user);
        post.spend_ticket(now);
        let new_total_spins = user.total_spins + 1;

        let mut am = user.clone().into_active_model();
        am.tickets_available = Set(post.tickets_available);
        am.tickets_depleted_at = Set(post.tickets_depleted_at);
        am.referral_popup_shown_at = Set(post.referral_popup_shown_at);
        am.last_spin_at = Set(Some(now));
        am.total_spins = Set(new_total_spins);
        am.total_wins = Set(user.total_wins + outcome.wins_delta);
        am.updated_at = Set(Some(now));
        let mut user = am.update(&txn).await?;

        // 写抽奖流水（扇区数据快照）
        let record = spins::ActiveModel {
            user_id: Set(user.id),
            sector_id: Set(selected.id),
            sector_number: Set(selected.sector_number),
            prize_type: Set(selected.prize_type),
            prize_value: Set(selected.prize_value),
            spin_time: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 5. 赠券入账（类型效果与附加动作各一笔流水）
        for grant in &outcome.ticket_grants {
            user = self
                .ticket_service
                .grant_tickets(&txn, user, *grant, TicketSource::PrizeTypeAction, None, now)
                .await?;
        }

        // 6. 角度以更新后的累计旋转数为基准，保证严格递增
        let rotation =
            spin_math::compute_rotation(selected.sector_number, new_total_spins, extra_turns);

        txn.commit().await?;

        let (next_ticket_at, seconds_until_next_ticket) =
            TicketService::restore_eta(&user, &settings, now);

        Ok(SpinResponse {
            spin_id: record.id,
            sector: WonSector::from(&selected),
            rotation,
            tickets_available: user.tickets_available,
            prize_awarded: outcome.prize_awarded,
            restore_interval_hours: settings.ticket_restore_hours,
            restore_interval_seconds: settings.restore_interval_seconds(),
            next_ticket_at,
            seconds_until_next_ticket,
        })
    }
}

/// 选择中奖扇区，并一并抽取附加整圈数。
///
/// 随机数在这里一次性抽完，后续流程全部是确定性计算。
fn select_sector(
    catalog: &[sectors::Model],
    forced_empty: bool,
) -> AppResult<(sectors::Model, i64)> {
    if catalog.is_empty() {
        return Err(AppError::ConfigError(
            "No active sectors configured".to_string(),
        ));
    }

    let mut rng = rand::thread_rng();
    let extra_turns = rng.gen_range(spin_math::EXTRA_TURNS_MIN..=spin_math::EXTRA_TURNS_MAX);

    if forced_empty {
        // 强制空奖：在 empty 扇区中均匀选择
        let empties: Vec<&sectors::Model> = catalog
            .iter()
            .filter(|s| s.prize_type == PrizeType::Empty)
            .collect();
        if empties.is_empty() {
            return Err(AppError::ConfigError(
                "Forced empty mode is enabled but no empty sectors are configured".to_string(),
            ));
        }
        let idx = rng.gen_range(0..empties.len());
        return Ok((empties[idx].clone(), extra_turns));
    }

    let weights: Vec<f64> = catalog.iter().map(|s| s.probability_percent).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(AppError::ConfigError(
            "Active sector probabilities sum to zero".to_string(),
        ));
    }
    if (total - 100.0).abs() > 0.5 {
        // 管理端应维持 100%，漂移不致命但值得告警
        log::warn!("Active sector probabilities sum to {total:.2}%, expected 100%");
    }

    // draw 在实际总和内抽取，总和漂移时不会越界
    let draw = rng.gen_range(0.0..total);
    let idx = spin_math::pick_by_weight(&weights, draw).ok_or_else(|| {
        AppError::ConfigError("No active sectors configured".to_string())
    })?;
    Ok((catalog[idx].clone(), extra_turns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector(prize_type: PrizeType, prize_value: i64) -> sectors::Model {
        sectors::Model {
            id: 1,
            sector_number: 1,
            prize_type,
            prize_value,
            probability_percent: 10.0,
            action_type: None,
            action_value: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_resolve_empty_is_noop() {
        let outcome = resolve_prize(&sector(PrizeType::Empty, 0));
        assert!(outcome.ticket_grants.is_empty());
        assert_eq!(outcome.wins_delta, 0);
        assert!(!outcome.prize_awarded);
    }

    #[test]
    fn test_resolve_ticket_credits_value() {
        // 余额 1 -> 消耗 1 + 入账 2 = 1（守恒由入账批次保证）
        let outcome = resolve_prize(&sector(PrizeType::Ticket, 2));
        assert_eq!(outcome.ticket_grants, vec![2]);
        assert_eq!(outcome.wins_delta, 0);
        assert!(outcome.prize_awarded);
    }

    #[test]
    fn test_resolve_money_is_manual_payout() {
        let outcome = resolve_prize(&sector(PrizeType::Money, 500));
        assert!(outcome.ticket_grants.is_empty());
        assert_eq!(outcome.wins_delta, 1);
        assert!(outcome.prize_awarded);
    }

    #[test]
    fn test_resolve_gift_counts_win_once() {
        for pt in [PrizeType::SecretBox, PrizeType::SponsorGift] {
            let outcome = resolve_prize(&sector(pt, 0));
            assert!(outcome.ticket_grants.is_empty());
            assert_eq!(outcome.wins_delta, 1);
            assert!(outcome.prize_awarded);
        }
    }

    #[test]
    fn test_resolve_action_is_additive() {
        let mut s = sector(PrizeType::Ticket, 2);
        s.action_type = Some(SectorActionType::AddTicket);
        s.action_value = Some(1);
        let outcome = resolve_prize(&s);
        // 类型效果与附加动作叠加，各一笔入账
        assert_eq!(outcome.ticket_grants, vec![2, 1]);

        let mut empty = sector(PrizeType::Empty, 0);
        empty.action_type = Some(SectorActionType::AddTicket);
        empty.action_value = Some(3);
        let outcome = resolve_prize(&empty);
        assert_eq!(outcome.ticket_grants, vec![3]);
        assert!(!outcome.prize_awarded);
    }

    #[test]
    fn test_validate_sector_rejects_bad_data() {
        let mut s = sector(PrizeType::Ticket, 1);
        s.sector_number = 13;
        assert!(validate_sector(&s).is_err());

        let mut s = sector(PrizeType::Money, -5);
        s.sector_number = 3;
        assert!(validate_sector(&s).is_err());

        let mut s = sector(PrizeType::Empty, 0);
        s.action_type = Some(SectorActionType::AddTicket);
        assert!(validate_sector(&s).is_err());

        assert!(validate_sector(&sector(PrizeType::Ticket, 1)).is_ok());
    }

    #[test]
    fn test_select_sector_forced_empty() {
        let mut catalog = Vec::new();
        for n in 1..=4 {
            let mut s = sector(
                if n % 2 == 0 {
                    PrizeType::Empty
                } else {
                    PrizeType::Money
                },
                0,
            );
            s.id = n as i64;
            s.sector_number = n;
            catalog.push(s);
        }
        for _ in 0..50 {
            let (chosen, _) = select_sector(&catalog, true).unwrap();
            assert_eq!(chosen.prize_type, PrizeType::Empty);
        }
    }

    #[test]
    fn test_select_sector_forced_empty_without_empty_sectors() {
        let catalog = vec![sector(PrizeType::Money, 100)];
        assert!(matches!(
            select_sector(&catalog, true),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_select_sector_empty_catalog() {
        assert!(matches!(
            select_sector(&[], false),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_ticket_conservation_over_spin_sequence() {
        // 余额 B 连续 N 次旋转后应为 B - N + Σ入账，且过程中不会为负
        let mut ticket_two = sector(PrizeType::Ticket, 2);
        ticket_two.sector_number = 2;
        let mut with_action = sector(PrizeType::Ticket, 1);
        with_action.sector_number = 3;
        with_action.action_type = Some(SectorActionType::AddTicket);
        with_action.action_value = Some(1);
        let sequence = vec![
            ticket_two,
            sector(PrizeType::Empty, 0),
            sector(PrizeType::Money, 500),
            with_action,
            sector(PrizeType::Empty, 0),
            sector(PrizeType::SecretBox, 0),
        ];

        let mut balance: i64 = 4;
        let mut credited = 0i64;
        for s in &sequence {
            assert!(balance > 0, "spin attempted with empty balance");
            balance -= 1;
            for grant in resolve_prize(s).ticket_grants {
                balance += grant;
                credited += grant;
            }
            assert!(balance >= 0);
        }
        assert_eq!(credited, 4); // 2 + 1 + 1
        assert_eq!(balance, 4 - sequence.len() as i64 + credited);
    }

    #[test]
    fn test_select_sector_frequency_converges() {
        // 70/30 两扇区，10000 次采样频率应贴近配置概率
        let mut a = sector(PrizeType::Empty, 0);
        a.probability_percent = 70.0;
        let mut b = sector(PrizeType::Money, 100);
        b.id = 2;
        b.sector_number = 2;
        b.probability_percent = 30.0;
        let catalog = vec![a, b];

        let mut hits = 0u32;
        let n = 10_000;
        for _ in 0..n {
            let (chosen, _) = select_sector(&catalog, false).unwrap();
            if chosen.id == 2 {
                hits += 1;
            }
        }
        let freq = hits as f64 / n as f64;
        assert!((freq - 0.30).abs() < 0.03, "observed {freq}");
    }
}
