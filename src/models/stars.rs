use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stars 余额兑换赠券请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExchangeStarsRequest {
    /// 期望兑换的券数 (正数)
    pub tickets: i64,
}

/// Stars 兑换响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExchangeStarsResponse {
    /// 实际入账券数
    pub tickets_granted: i64,
    /// 消耗的 Stars
    pub stars_spent: i64,
    pub tickets_available: i64,
    pub stars_balance: i64,
}

/// Telegram Bot 推送的更新（仅解析支付相关字段）
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: TelegramFrom,
    /// Stars 支付时恒为 "XTR"
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TelegramMessage {
    pub from: Option<TelegramFrom>,
    pub successful_payment: Option<SuccessfulPayment>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TelegramFrom {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SuccessfulPayment {
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
    pub telegram_payment_charge_id: String,
}
