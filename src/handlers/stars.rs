use crate::models::*;
use crate::services::StarsService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/stars/exchange",
    tag = "stars",
    request_body = ExchangeStarsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑换成功", body = ExchangeStarsResponse),
        (status = 400, description = "Stars 余额不足或参数非法"),
        (status = 401, description = "未授权")
    )
)]
/// 用 Stars 余额兑换抽奖券（汇率取自全局设置）
pub async fn exchange(
    service: web::Data<StarsService>,
    req: HttpRequest,
    body: web::Json<ExchangeStarsRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.exchange(user_id, &body).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn stars_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/stars").route("/exchange", web::post().to(exchange)));
}
