use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{TicketSource, ticket_ledger_entity as ledger, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::UserResponse;
use crate::services::settings_service;
use crate::utils::TelegramUser;

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 按 Telegram 身份查找用户，不存在则注册（发注册赠券）
    pub async fn ensure_user(
        &self,
        telegram_user: &TelegramUser,
        referrer_id: Option<i64>,
    ) -> AppResult<users::Model> {
        if let Some(existing) = users::Entity::find()
            .filter(users::Column::TelegramId.eq(telegram_user.id))
            .one(&self.pool)
            .await?
        {
            return Ok(existing);
        }

        let settings = settings_service::load_settings(&self.pool).await?;
        let txn = self.pool.begin().await?;

        let user = users::ActiveModel {
            telegram_id: Set(telegram_user.id),
            username: Set(telegram_user.username.clone()),
            first_name: Set(telegram_user.first_name.clone()),
            tickets_available: Set(settings.start_tickets),
            referrer_id: Set(referrer_id),
            total_spins: Set(0),
            total_wins: Set(0),
            stars_balance: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if settings.start_tickets > 0 {
            ledger::ActiveModel {
                user_id: Set(user.id),
                tickets_count: Set(settings.start_tickets),
                source: Set(TicketSource::InitialBonus),
                restored_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!(
            "Registered user {} (telegram_id {}) with {} start tickets",
            user.id,
            user.telegram_id,
            settings.start_tickets
        );
        Ok(user)
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.into())
    }

    pub async fn find_by_id(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
