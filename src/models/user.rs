use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::user_entity;

/// Telegram Mini App 登录请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TelegramAuthRequest {
    /// `window.Telegram.WebApp.initData` 原串
    pub init_data: String,
    /// 邀请人用户ID（通过 start_param 传递，可选）
    pub referrer_id: Option<i64>,
}

/// 登录响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// 刷新令牌请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 用户信息响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub tickets_available: i64,
    pub total_spins: i64,
    pub total_wins: i64,
    pub stars_balance: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        UserResponse {
            id: m.id,
            telegram_id: m.telegram_id,
            username: m.username,
            first_name: m.first_name,
            tickets_available: m.tickets_available,
            total_spins: m.total_spins,
            total_wins: m.total_wins,
            stars_balance: m.stars_balance,
            created_at: m.created_at,
        }
    }
}
