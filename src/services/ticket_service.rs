use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{
    TicketSource, ticket_ledger_entity as ledger, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{TicketBalanceResponse, WheelSettings};
use crate::services::settings_service;
use crate::services::user_locks::UserLocks;

/// 单次状态机评估产生的赠券事件（每条对应一笔审计流水）
#[derive(Debug, Clone, PartialEq)]
pub struct TicketGrant {
    pub tickets: i64,
    pub source: TicketSource,
    pub restored_at: Option<DateTime<Utc>>,
}

/// 券余额状态机的纯内存状态。
///
/// 过渡规则按固定顺序执行（每日赠券 -> 计时器上膛 -> 到期恢复），
/// 对数据库的落盘由 service 层统一处理，这里只做状态演算，
/// 便于对时间窗口行为做确定性测试。
#[derive(Debug, Clone, PartialEq)]
pub struct TicketState {
    pub tickets_available: i64,
    pub tickets_depleted_at: Option<DateTime<Utc>>,
    pub last_ticket_received_at: Option<DateTime<Utc>>,
    pub referral_popup_shown_at: Option<DateTime<Utc>>,
}

impl TicketState {
    pub fn from_user(user: &users::Model) -> Self {
        TicketState {
            tickets_available: user.tickets_available,
            tickets_depleted_at: user.tickets_depleted_at,
            last_ticket_received_at: user.last_ticket_received_at,
            referral_popup_shown_at: user.referral_popup_shown_at,
        }
    }

    /// 执行一轮状态机评估，返回产生的赠券事件。
    ///
    /// 余额读取与 pre-spin 检查都走这一个入口，保证过渡顺序一致。
    pub fn evaluate(&mut self, settings: &WheelSettings, now: DateTime<Utc>) -> Vec<TicketGrant> {
        let mut grants = Vec::new();

        // 1. 每日赠券
        match self.last_ticket_received_at {
            None => {
                // 从未发放过：仅在余额恰好为零时给默认赠券
                if self.tickets_available == 0 && settings.default_daily_tickets > 0 {
                    self.apply_grant(
                        &mut grants,
                        settings.default_daily_tickets,
                        TicketSource::DefaultDailyBonus,
                        None,
                    );
                    self.last_ticket_received_at = Some(now);
                }
            }
            Some(last) => {
                // 距上次发放满 24 小时，与当前余额无关
                if now - last >= Duration::hours(24) && settings.daily_tickets > 0 {
                    self.apply_grant(
                        &mut grants,
                        settings.daily_tickets,
                        TicketSource::DailyBonus,
                        None,
                    );
                    self.last_ticket_received_at = Some(now);
                }
            }
        }

        // 2. 枯竭计时器上膛
        if self.tickets_available == 0 && self.tickets_depleted_at.is_none() {
            // 弹窗标记残留说明上一周期弹窗展示后余额曾回正又耗尽：
            // 重新上膛并清掉标记，让弹窗在新周期可再次出现
            if self.referral_popup_shown_at.is_some() {
                self.referral_popup_shown_at = None;
            }
            self.tickets_depleted_at = Some(now);
        }

        // 3. 到期恢复
        if self.tickets_available == 0
            && let Some(depleted_at) = self.tickets_depleted_at
        {
            let restore_at = depleted_at + settings.restore_interval();
            if now >= restore_at {
                self.apply_grant(&mut grants, 1, TicketSource::TimerRestoration, Some(now));
                if self.tickets_available == 0 {
                    // 从零 +1 后仍为零只可能是数据被并发改坏，重新上膛等下一轮
                    self.tickets_depleted_at = Some(now);
                }
            }
        }

        grants
    }

    /// 消耗一张券；归零时上膛计时器并清掉上一周期残留的弹窗标记
    pub fn spend_ticket(&mut self, now: DateTime<Utc>) {
        self.tickets_available -= 1;
        if self.tickets_available == 0 {
            self.referral_popup_shown_at = None;
            self.tickets_depleted_at = Some(now);
        }
    }

    pub fn should_show_referral_popup(&self) -> bool {
        self.tickets_available == 0 && self.referral_popup_shown_at.is_none()
    }

    /// 入账并维护枯竭状态：余额回正即解除计时器与弹窗标记
    fn apply_grant(
        &mut self,
        grants: &mut Vec<TicketGrant>,
        tickets: i64,
        source: TicketSource,
        restored_at: Option<DateTime<Utc>>,
    ) {
        self.tickets_available += tickets;
        if self.tickets_available > 0 {
            self.tickets_depleted_at = None;
            self.referral_popup_shown_at = None;
        }
        grants.push(TicketGrant {
            tickets,
            source,
            restored_at,
        });
    }
}

#[derive(Clone)]
pub struct TicketService {
    pool: DatabaseConnection,
    locks: UserLocks,
}

impl TicketService {
    pub fn new(pool: DatabaseConnection, locks: UserLocks) -> Self {
        Self { pool, locks }
    }

    /// 查询券余额（先执行一轮状态机评估，惰性结算赠券/恢复）
    pub async fn get_balance(&self, user_id: i64) -> AppResult<TicketBalanceResponse> {
        let _guard = self.locks.acquire(user_id).await;
        let txn = self.pool.begin().await?;

        let settings = settings_service::load_settings(&txn).await?;
        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = Utc::now();
        let user = self.run_state_machine(&txn, user, &settings, now).await?;
        txn.commit().await?;

        Ok(Self::balance_response(&user, &settings, now))
    }

    /// 在既有事务内执行状态机评估并落盘，返回更新后的用户。
    ///
    /// 调用方必须已持有该用户的 UserLocks 锁。
    pub async fn run_state_machine(
        &self,
        txn: &DatabaseTransaction,
        user: users::Model,
        settings: &WheelSettings,
        now: DateTime<Utc>,
    ) -> AppResult<users::Model> {
        let mut state = TicketState::from_user(&user);

        // 余额为零但计时器未上膛：不应出现的持久化状态，修复并告警
        if user.total_spins > 0
            && state.tickets_available == 0
            && state.tickets_depleted_at.is_none()
            && state.referral_popup_shown_at.is_none()
        {
            log::warn!(
                "User {} has zero balance without an armed depletion timer, self-healing",
                user.id
            );
        }

        let grants = state.evaluate(settings, now);

        for grant in &grants {
            ledger::ActiveModel {
                user_id: Set(user.id),
                tickets_count: Set(grant.tickets),
                source: Set(grant.source),
                restored_at: Set(grant.restored_at),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        let changed = state.tickets_available != user.tickets_available
            || state.tickets_depleted_at != user.tickets_depleted_at
            || state.last_ticket_received_at != user.last_ticket_received_at
            || state.referral_popup_shown_at != user.referral_popup_shown_at;

        if !changed {
            return Ok(user);
        }

        let mut am = user.clone().into_active_model();
        am.tickets_available = Set(state.tickets_available);
        am.tickets_depleted_at = Set(state.tickets_depleted_at);
        am.last_ticket_received_at = Set(state.last_ticket_received_at);
        am.referral_popup_shown_at = Set(state.referral_popup_shown_at);
        am.updated_at = Set(Some(now));
        Ok(am.update(txn).await?)
    }

    /// 入账赠券（事务内）：加余额、写审计流水、余额回正时解除枯竭状态。
    ///
    /// 调用方必须已持有该用户的 UserLocks 锁。
    pub async fn grant_tickets(
        &self,
        txn: &DatabaseTransaction,
        user: users::Model,
        tickets: i64,
        source: TicketSource,
        payment_charge_id: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<users::Model> {
        if tickets <= 0 {
            return Err(AppError::ValidationError(
                "Ticket grant must be positive".to_string(),
            ));
        }

        ledger::ActiveModel {
            user_id: Set(user.id),
            tickets_count: Set(tickets),
            source: Set(source),
            restored_at: Set(None),
            payment_charge_id: Set(payment_charge_id),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let new_balance = user.tickets_available + tickets;
        let mut am = user.into_active_model();
        am.tickets_available = Set(new_balance);
        if new_balance > 0 {
            am.tickets_depleted_at = Set(None);
            am.referral_popup_shown_at = Set(None);
        }
        am.updated_at = Set(Some(now));
        Ok(am.update(txn).await?)
    }

    /// 标记"邀请好友"弹窗已展示（展示责任在前端，落库责任在这里）
    pub async fn mark_referral_popup_shown(&self, user_id: i64) -> AppResult<()> {
        let _guard = self.locks.acquire(user_id).await;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 余额为正说明标记请求与某次入账赛跑输了，弹窗本就不该展示，跳过
        if user.tickets_available > 0 {
            return Ok(());
        }

        let mut am = user.into_active_model();
        am.referral_popup_shown_at = Set(Some(Utc::now()));
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;
        Ok(())
    }

    /// 批量恢复扫描（外部定时任务入口）：
    /// 找出枯竭计时器已到期的用户，逐个走状态机结算。
    pub async fn restore_depleted_batch(&self) -> AppResult<u64> {
        let settings = settings_service::load_settings(&self.pool).await?;
        let cutoff = Utc::now() - settings.restore_interval();

        let due = users::Entity::find()
            .filter(users::Column::TicketsAvailable.eq(0))
            .filter(users::Column::TicketsDepletedAt.is_not_null())
            .filter(users::Column::TicketsDepletedAt.lte(cutoff))
            .all(&self.pool)
            .await?;

        let mut restored = 0u64;
        for user in due {
            let _guard = self.locks.acquire(user.id).await;
            let txn = self.pool.begin().await?;

            // 等锁期间状态可能已变，事务内重读
            let Some(fresh) = users::Entity::find_by_id(user.id).one(&txn).await? else {
                continue;
            };
            let before = fresh.tickets_available;
            let updated = self
                .run_state_machine(&txn, fresh, &settings, Utc::now())
                .await?;
            txn.commit().await?;

            if updated.tickets_available > before {
                restored += 1;
            }
        }
        Ok(restored)
    }

    /// 组装余额响应
    pub fn balance_response(
        user: &users::Model,
        settings: &WheelSettings,
        now: DateTime<Utc>,
    ) -> TicketBalanceResponse {
        let (next_ticket_at, seconds_until_next_ticket) = Self::restore_eta(user, settings, now);
        TicketBalanceResponse {
            tickets_available: user.tickets_available,
            last_spin_at: user.last_spin_at,
            restore_interval_hours: settings.ticket_restore_hours,
            restore_interval_seconds: settings.restore_interval_seconds(),
            next_ticket_at,
            seconds_until_next_ticket,
            should_show_referral_popup: user.tickets_available == 0
                && user.referral_popup_shown_at.is_none(),
        }
    }

    /// 恢复计时器的到期时间与剩余秒数；计时器未上膛时均为 None
    pub fn restore_eta(
        user: &users::Model,
        settings: &WheelSettings,
        now: DateTime<Utc>,
    ) -> (Option<DateTime<Utc>>, Option<i64>) {
        if user.tickets_available == 0
            && let Some(depleted_at) = user.tickets_depleted_at
        {
            let restore_at = depleted_at + settings.restore_interval();
            let seconds = (restore_at - now).num_seconds().max(0);
            (Some(restore_at), Some(seconds))
        } else {
            (None, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> WheelSettings {
        WheelSettings {
            ticket_restore_hours: 4,
            daily_tickets: 2,
            default_daily_tickets: 3,
            start_tickets: 5,
            always_empty_mode: false,
            stars_per_ticket_purchase: 10,
        }
    }

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    fn state(tickets: i64) -> TicketState {
        TicketState {
            tickets_available: tickets,
            tickets_depleted_at: None,
            last_ticket_received_at: None,
            referral_popup_shown_at: None,
        }
    }

    #[test]
    fn test_first_login_grant_only_at_zero_balance() {
        let now = at(1_000_000);

        let mut zero = state(0);
        let grants = zero.evaluate(&settings(), now);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].tickets, 3);
        assert_eq!(grants[0].source, TicketSource::DefaultDailyBonus);
        assert_eq!(zero.tickets_available, 3);
        assert_eq!(zero.last_ticket_received_at, Some(now));
        // 赠券使余额回正，不上膛计时器
        assert_eq!(zero.tickets_depleted_at, None);

        let mut positive = state(5);
        let grants = positive.evaluate(&settings(), now);
        assert!(grants.is_empty());
        assert_eq!(positive.tickets_available, 5);
        assert_eq!(positive.last_ticket_received_at, None);
    }

    #[test]
    fn test_daily_bonus_after_24h_regardless_of_balance() {
        let last = at(1_000_000);
        let now = last + Duration::hours(24);

        let mut s = state(7);
        s.last_ticket_received_at = Some(last);
        let grants = s.evaluate(&settings(), now);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].source, TicketSource::DailyBonus);
        assert_eq!(s.tickets_available, 9);
        assert_eq!(s.last_ticket_received_at, Some(now));
    }

    #[test]
    fn test_daily_bonus_not_before_24h() {
        let last = at(1_000_000);
        let now = last + Duration::hours(24) - Duration::seconds(1);

        let mut s = state(7);
        s.last_ticket_received_at = Some(last);
        assert!(s.evaluate(&settings(), now).is_empty());
        assert_eq!(s.last_ticket_received_at, Some(last));
    }

    #[test]
    fn test_daily_bonus_clears_depletion_cycle() {
        let last = at(1_000_000);
        let now = last + Duration::hours(30);

        let mut s = state(0);
        s.last_ticket_received_at = Some(last);
        s.tickets_depleted_at = Some(last + Duration::hours(1));
        s.referral_popup_shown_at = Some(last + Duration::hours(2));

        let grants = s.evaluate(&settings(), now);
        assert_eq!(grants.len(), 1);
        assert_eq!(s.tickets_available, 2);
        assert_eq!(s.tickets_depleted_at, None);
        assert_eq!(s.referral_popup_shown_at, None);
    }

    #[test]
    fn test_zero_balance_arms_timer_and_self_heals() {
        let now = at(2_000_000);

        // 数据异常：余额为零、计时器未上膛 -> 评估后修复
        let mut s = state(0);
        s.last_ticket_received_at = Some(now); // 屏蔽每日赠券分支
        let grants = s.evaluate(&settings(), now);
        assert!(grants.is_empty());
        assert_eq!(s.tickets_depleted_at, Some(now));
        assert!(s.should_show_referral_popup());
    }

    #[test]
    fn test_rearm_clears_stale_popup_flag() {
        let now = at(2_000_000);

        let mut s = state(0);
        s.last_ticket_received_at = Some(now);
        s.referral_popup_shown_at = Some(at(1_500_000)); // 上一周期的残留标记
        let grants = s.evaluate(&settings(), now);
        assert!(grants.is_empty());
        assert_eq!(s.tickets_depleted_at, Some(now));
        // 标记被清掉，弹窗可在新周期再次出现
        assert_eq!(s.referral_popup_shown_at, None);
        assert!(s.should_show_referral_popup());
    }

    #[test]
    fn test_restoration_round_trip() {
        let depleted = at(3_000_000);
        let cfg = settings(); // 4 小时恢复

        let mut s = state(0);
        s.last_ticket_received_at = Some(depleted);
        s.tickets_depleted_at = Some(depleted);

        // 到期前 1 秒：不恢复
        let before = depleted + Duration::hours(4) - Duration::seconds(1);
        assert!(s.evaluate(&cfg, before).is_empty());
        assert_eq!(s.tickets_available, 0);

        // 到期：恢复 1 张并解除枯竭状态
        let due = depleted + Duration::hours(4);
        let grants = s.evaluate(&cfg, due);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].tickets, 1);
        assert_eq!(grants[0].source, TicketSource::TimerRestoration);
        assert_eq!(grants[0].restored_at, Some(due));
        assert_eq!(s.tickets_available, 1);
        assert_eq!(s.tickets_depleted_at, None);
        assert_eq!(s.referral_popup_shown_at, None);
    }

    #[test]
    fn test_newly_armed_timer_does_not_restore_immediately() {
        let now = at(3_000_000);

        // 本轮刚上膛的计时器以 now 为锚点，恢复要等完整间隔
        let mut s = state(0);
        s.last_ticket_received_at = Some(now);
        assert!(s.evaluate(&settings(), now).is_empty());
        assert_eq!(s.tickets_depleted_at, Some(now));
        assert_eq!(s.tickets_available, 0);
    }

    #[test]
    fn test_popup_single_fire_per_depletion_cycle() {
        let t0 = at(4_000_000);
        let cfg = settings();

        let mut s = state(0);
        s.last_ticket_received_at = Some(t0);
        s.evaluate(&cfg, t0);
        assert!(s.should_show_referral_popup());

        // 前端展示后回写标记（调用方责任）
        s.referral_popup_shown_at = Some(t0 + Duration::minutes(1));
        assert!(!s.should_show_referral_popup());

        // 恢复使余额回正，标记随之清空
        let due = t0 + cfg.restore_interval();
        s.evaluate(&cfg, due);
        assert_eq!(s.tickets_available, 1);
        assert!(!s.should_show_referral_popup());

        // 再次耗尽进入新周期，弹窗可再次出现
        s.tickets_available = 0;
        s.evaluate(&cfg, due + Duration::minutes(5));
        assert!(s.should_show_referral_popup());
    }

    #[test]
    fn test_spend_to_zero_arms_timer_and_clears_stale_flag() {
        let now = at(6_000_000);

        // 标记与入账赛跑可能留下"余额为正但弹窗标记已置位"的残留状态；
        // 最后一张券被消耗时必须连同清掉，否则本周期弹窗永远被压制
        let mut s = state(1);
        s.last_ticket_received_at = Some(now);
        s.referral_popup_shown_at = Some(at(5_000_000));

        s.spend_ticket(now);
        assert_eq!(s.tickets_available, 0);
        assert_eq!(s.tickets_depleted_at, Some(now));
        assert_eq!(s.referral_popup_shown_at, None);
        assert!(s.should_show_referral_popup());
    }

    #[test]
    fn test_spend_with_remaining_balance_keeps_cycle_state() {
        let now = at(6_000_000);

        let mut s = state(3);
        s.referral_popup_shown_at = Some(at(5_000_000));
        s.spend_ticket(now);
        assert_eq!(s.tickets_available, 2);
        assert_eq!(s.tickets_depleted_at, None);
        // 余额未归零时不触碰弹窗标记
        assert_eq!(s.referral_popup_shown_at, Some(at(5_000_000)));
    }

    #[test]
    fn test_evaluation_order_bonus_before_arming() {
        // 每日赠券先于上膛执行：余额被赠券拉正后不再上膛
        let now = at(5_000_000);
        let mut s = state(0);
        let grants = s.evaluate(&settings(), now);
        assert_eq!(grants.len(), 1);
        assert_eq!(s.tickets_depleted_at, None);
    }
}
