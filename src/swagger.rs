use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{PrizeType, SectorActionType, TicketSource};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::telegram_login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::tickets::get_balance,
        handlers::tickets::mark_popup_shown,
        handlers::wheel::get_sectors,
        handlers::wheel::spin,
        handlers::wheel::get_history,
        handlers::stars::exchange,
    ),
    components(
        schemas(
            TelegramAuthRequest,
            RefreshRequest,
            AuthResponse,
            UserResponse,
            TicketBalanceResponse,
            SectorResponse,
            WonSector,
            SpinResponse,
            SpinHistoryQuery,
            SpinRecordResponse,
            ExchangeStarsRequest,
            ExchangeStarsResponse,
            ApiError,
            PrizeType,
            SectorActionType,
            TicketSource,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Telegram Mini App 登录"),
        (name = "user", description = "用户信息"),
        (name = "tickets", description = "抽奖券余额与恢复"),
        (name = "wheel", description = "幸运转盘"),
        (name = "stars", description = "Telegram Stars"),
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
