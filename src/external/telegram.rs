use reqwest::Client;
use serde_json::json;

use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};

/// Telegram Bot API 薄封装（仅支付确认用到的调用）
#[derive(Clone)]
pub struct TelegramService {
    config: TelegramConfig,
    client: Client,
}

impl TelegramService {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// 应答 pre-checkout（Telegram 要求 10 秒内响应）
    pub async fn answer_pre_checkout_query(&self, query_id: &str, ok: bool) -> AppResult<()> {
        let mut body = json!({
            "pre_checkout_query_id": query_id,
            "ok": ok,
        });
        if !ok {
            body["error_message"] = json!("This purchase is currently unavailable");
        }

        let response = self
            .client
            .post(self.api_url("answerPreCheckoutQuery"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "answerPreCheckoutQuery failed: {status} {text}"
            )));
        }
        Ok(())
    }
}
