use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};

use crate::entities::{TicketSource, ticket_ledger_entity as ledger, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::TelegramService;
use crate::models::{ExchangeStarsRequest, ExchangeStarsResponse, TelegramUpdate};
use crate::services::settings_service;
use crate::services::ticket_service::TicketService;
use crate::services::user_locks::UserLocks;

/// Stars 支付 invoice payload 前缀，格式 "tickets:<count>"
const TICKETS_PAYLOAD_PREFIX: &str = "tickets:";

#[derive(Clone)]
pub struct StarsService {
    pool: DatabaseConnection,
    locks: UserLocks,
    ticket_service: TicketService,
    telegram: TelegramService,
}

impl StarsService {
    pub fn new(
        pool: DatabaseConnection,
        locks: UserLocks,
        ticket_service: TicketService,
        telegram: TelegramService,
    ) -> Self {
        Self {
            pool,
            locks,
            ticket_service,
            telegram,
        }
    }

    /// 处理 Bot webhook 推送的支付相关更新。
    ///
    /// 对 Telegram 永远尽快回 200；业务失败只记日志，
    /// 避免 Telegram 反复重推同一 update。
    pub async fn handle_update(&self, update: TelegramUpdate) -> AppResult<()> {
        if let Some(query) = update.pre_checkout_query {
            // 结账前校验：货币必须是 Stars，payload 必须可解析
            let ok = query.currency == "XTR" && parse_tickets_payload(&query.invoice_payload).is_some();
            if !ok {
                log::warn!(
                    "Rejecting pre-checkout query {}: currency={} payload={}",
                    query.id,
                    query.currency,
                    query.invoice_payload
                );
            }
            self.telegram
                .answer_pre_checkout_query(&query.id, ok)
                .await?;
            return Ok(());
        }

        if let Some(message) = update.message
            && let Some(payment) = message.successful_payment
        {
            let Some(from) = message.from else {
                log::warn!("Successful payment without sender, skipping");
                return Ok(());
            };
            let Some(tickets) = parse_tickets_payload(&payment.invoice_payload) else {
                log::warn!(
                    "Successful payment with unparseable payload: {}",
                    payment.invoice_payload
                );
                return Ok(());
            };
            self.credit_payment(
                from.id,
                payment.total_amount,
                tickets,
                &payment.telegram_payment_charge_id,
            )
            .await?;
        }

        Ok(())
    }

    /// Stars 支付到账：累计 stars_balance 并入账购买的券。
    /// 与 spin 同一把用户锁，避免与抽奖并发改写余额。
    /// Telegram 可能重推同一笔支付，按 charge id 去重保证只入账一次。
    async fn credit_payment(
        &self,
        telegram_id: i64,
        stars_amount: i64,
        tickets: i64,
        charge_id: &str,
    ) -> AppResult<()> {
        let user = users::Entity::find()
            .filter(users::Column::TelegramId.eq(telegram_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No user for telegram_id {telegram_id}"))
            })?;

        let _guard = self.locks.acquire(user.id).await;
        let txn = self.pool.begin().await?;
        let now = Utc::now();

        // 等锁期间余额可能已变，事务内重读
        let user = users::Entity::find_by_id(user.id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let prior = ledger::Entity::find()
            .filter(ledger::Column::UserId.eq(user.id))
            .filter(ledger::Column::Source.eq(TicketSource::StarsPayment))
            .all(&txn)
            .await?;
        if already_credited(&prior, charge_id) {
            log::info!("Stars payment {charge_id} already credited to user {}, skipping", user.id);
            return Ok(());
        }

        let mut am = user.clone().into_active_model();
        am.stars_balance = Set(user.stars_balance + stars_amount);
        am.updated_at = Set(Some(now));
        let user = am.update(&txn).await?;

        let user = self
            .ticket_service
            .grant_tickets(
                &txn,
                user,
                tickets,
                TicketSource::StarsPayment,
                Some(charge_id.to_string()),
                now,
            )
            .await?;

        txn.commit().await?;
        log::info!(
            "Credited {stars_amount} stars / {tickets} tickets to user {} (balance now {})",
            user.id,
            user.tickets_available
        );
        Ok(())
    }

    /// 用累计的 Stars 余额兑换赠券（汇率来自全局设置）
    pub async fn exchange(
        &self,
        user_id: i64,
        request: &ExchangeStarsRequest,
    ) -> AppResult<ExchangeStarsResponse> {
        if request.tickets <= 0 {
            return Err(AppError::ValidationError(
                "Tickets to exchange must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;
        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let settings = settings_service::load_settings(&txn).await?;
        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let cost = exchange_cost(request.tickets, settings.stars_per_ticket_purchase)
            .ok_or_else(|| {
                AppError::ValidationError("Exchange amount is too large".to_string())
            })?;
        if user.stars_balance < cost {
            return Err(AppError::ValidationError(
                "Insufficient stars balance".to_string(),
            ));
        }

        let mut am = user.clone().into_active_model();
        am.stars_balance = Set(user.stars_balance - cost);
        am.updated_at = Set(Some(now));
        let user = am.update(&txn).await?;

        let user = self
            .ticket_service
            .grant_tickets(
                &txn,
                user,
                request.tickets,
                TicketSource::StarExchange,
                None,
                now,
            )
            .await?;

        txn.commit().await?;

        Ok(ExchangeStarsResponse {
            tickets_granted: request.tickets,
            stars_spent: cost,
            tickets_available: user.tickets_available,
            stars_balance: user.stars_balance,
        })
    }
}

/// 解析 "tickets:<count>" payload，非法则 None
fn parse_tickets_payload(payload: &str) -> Option<i64> {
    let count = payload.strip_prefix(TICKETS_PAYLOAD_PREFIX)?.parse().ok()?;
    if count > 0 { Some(count) } else { None }
}

/// 兑换所需 Stars；tickets 为客户端输入，乘法溢出返回 None
fn exchange_cost(tickets: i64, stars_per_ticket: i64) -> Option<i64> {
    tickets.checked_mul(stars_per_ticket)
}

/// 同一笔 Stars 支付是否已入账（按 Telegram charge id 判定）
fn already_credited(prior: &[ledger::Model], charge_id: &str) -> bool {
    prior
        .iter()
        .any(|entry| entry.payment_charge_id.as_deref() == Some(charge_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tickets_payload() {
        assert_eq!(parse_tickets_payload("tickets:3"), Some(3));
        assert_eq!(parse_tickets_payload("tickets:0"), None);
        assert_eq!(parse_tickets_payload("tickets:-1"), None);
        assert_eq!(parse_tickets_payload("tickets:abc"), None);
        assert_eq!(parse_tickets_payload("gift:3"), None);
    }

    #[test]
    fn test_exchange_cost_overflow_rejected() {
        assert_eq!(exchange_cost(3, 10), Some(30));
        // 客户端传入接近 i64::MAX 的张数不得回绕成负的费用
        assert_eq!(exchange_cost(i64::MAX / 2, 3), None);
        assert_eq!(exchange_cost(i64::MAX, i64::MAX), None);
    }

    fn ledger_row(charge_id: Option<&str>) -> ledger::Model {
        ledger::Model {
            id: 1,
            user_id: 1,
            tickets_count: 3,
            source: TicketSource::StarsPayment,
            restored_at: None,
            payment_charge_id: charge_id.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn test_duplicate_payment_is_detected_by_charge_id() {
        let prior = vec![ledger_row(Some("ch_100"))];
        assert!(already_credited(&prior, "ch_100"));
        assert!(!already_credited(&prior, "ch_200"));
        assert!(!already_credited(&[], "ch_100"));
    }
}
