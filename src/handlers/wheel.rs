use crate::models::*;
use crate::services::WheelService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取用户ID（中间件在鉴权后注入）
fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/wheel/sectors",
    tag = "wheel",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取扇区目录成功", body = [SectorResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 获取启用的扇区目录（前端渲染转盘）
pub async fn get_sectors(service: web::Data<WheelService>) -> Result<HttpResponse> {
    match service.list_sectors().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/wheel/spin",
    tag = "wheel",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖成功", body = SpinResponse),
        (status = 400, description = "没有可用抽奖券"),
        (status = 401, description = "未授权")
    )
)]
/// 进行一次抽奖:
/// 1. 结算每日赠券 / 到期恢复
/// 2. 校验余额并扣券
/// 3. 按概率选择扇区并结算奖励
/// 4. 返回扇区、奖励与动画角度
pub async fn spin(service: web::Data<WheelService>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.spin(user_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/wheel/history",
    tag = "wheel",
    params(
        ("limit" = Option<u32>, Query, description = "返回条数 (默认20, 最大100)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取抽奖记录成功", body = [SpinRecordResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 获取用户抽奖记录（倒序）
pub async fn get_history(
    service: web::Data<WheelService>,
    req: HttpRequest,
    query: web::Query<SpinHistoryQuery>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_history(user_id, query.limit).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn wheel_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wheel")
            .route("/sectors", web::get().to(get_sectors))
            .route("/spin", web::post().to(spin))
            .route("/history", web::get().to(get_history)),
    );
}
