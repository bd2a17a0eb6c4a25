use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AuthResponse, RefreshRequest, TelegramAuthRequest};
use crate::services::UserService;
use crate::utils::{JwtService, validate_init_data};

#[utoipa::path(
    post,
    path = "/auth/telegram",
    tag = "auth",
    request_body = TelegramAuthRequest,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 401, description = "initData 校验失败")
    )
)]
/// Mini App 登录：校验 initData 签名，首次登录自动注册（发注册赠券），
/// 返回 JWT 访问/刷新令牌
pub async fn telegram_login(
    config: web::Data<Config>,
    jwt_service: web::Data<JwtService>,
    user_service: web::Data<UserService>,
    body: web::Json<TelegramAuthRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let telegram_user = validate_init_data(
            &body.init_data,
            &config.telegram.bot_token,
            config.telegram.init_data_max_age,
            Utc::now(),
        )?;

        let user = user_service
            .ensure_user(&telegram_user, body.referrer_id)
            .await?;

        let access_token = jwt_service.generate_access_token(user.id, user.telegram_id)?;
        let refresh_token = jwt_service.generate_refresh_token(user.id, user.telegram_id)?;

        Ok::<_, AppError>(AuthResponse {
            access_token,
            refresh_token,
            expires_in: jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
    .await;

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "刷新成功", body = AuthResponse),
        (status = 401, description = "刷新令牌无效")
    )
)]
/// 用刷新令牌换取新的令牌对
pub async fn refresh(
    jwt_service: web::Data<JwtService>,
    user_service: web::Data<UserService>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let claims = jwt_service.verify_refresh_token(&body.refresh_token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        let user = user_service.find_by_id(user_id).await?;

        let access_token = jwt_service.generate_access_token(user.id, user.telegram_id)?;
        let refresh_token = jwt_service.generate_refresh_token(user.id, user.telegram_id)?;

        Ok::<_, AppError>(AuthResponse {
            access_token,
            refresh_token,
            expires_in: jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
    .await;

    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/telegram", web::post().to(telegram_login))
            .route("/refresh", web::post().to(refresh)),
    );
}
