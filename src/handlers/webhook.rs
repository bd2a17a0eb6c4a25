use crate::models::TelegramUpdate;
use crate::services::StarsService;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

/// Telegram Bot webhook（支付相关更新）。
///
/// 无论业务处理结果如何都回 200：失败只记日志，
/// 避免 Telegram 对同一 update 无限重推。
pub async fn telegram_webhook(
    service: web::Data<StarsService>,
    body: web::Json<TelegramUpdate>,
) -> Result<HttpResponse> {
    let update = body.into_inner();
    let update_id = update.update_id;
    if let Err(e) = service.handle_update(update).await {
        log::error!("Failed to process telegram update {update_id}: {e:?}");
    }
    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

/// 路由配置（挂载在认证范围之外）
pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/telegram", web::post().to(telegram_webhook)));
}
