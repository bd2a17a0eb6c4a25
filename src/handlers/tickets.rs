use crate::models::*;
use crate::services::TicketService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/tickets/balance",
    tag = "tickets",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取券余额成功", body = TicketBalanceResponse),
        (status = 401, description = "未授权")
    )
)]
/// 查询券余额。读取本身会触发一轮状态机结算：
/// 每日赠券、枯竭计时器上膛、到期恢复都在这里惰性发生。
pub async fn get_balance(
    service: web::Data<TicketService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.get_balance(user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/tickets/popup-shown",
    tag = "tickets",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "标记成功"),
        (status = 401, description = "未授权")
    )
)]
/// 标记"邀请好友"弹窗已展示（每个枯竭周期最多展示一次）
pub async fn mark_popup_shown(
    service: web::Data<TicketService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.mark_referral_popup_shown(user_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn tickets_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("/balance", web::get().to(get_balance))
            .route("/popup-shown", web::post().to(mark_popup_shown)),
    );
}
