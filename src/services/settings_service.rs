use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{app_setting_entity as settings, wheel_sector_entity as sectors};
use crate::error::{AppError, AppResult};
use crate::models::WheelSettings;

/// 设置单例行的固定ID
const SETTINGS_ROW_ID: i64 = 1;

/// 读取全局设置（单例行，id=1）。
///
/// 每次核心操作重新读取，不做进程内缓存，管理端修改立即生效。
pub async fn load_settings<C: ConnectionTrait>(conn: &C) -> AppResult<WheelSettings> {
    let model = settings::Entity::find_by_id(SETTINGS_ROW_ID)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::ConfigError("App settings row is missing".to_string()))?;
    Ok(model.into())
}

/// 读取启用的扇区目录（按扇区编号排序，选择顺序稳定）
pub async fn load_active_sectors<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<sectors::Model>> {
    let list = sectors::Entity::find()
        .filter(sectors::Column::IsActive.eq(true))
        .order_by_asc(sectors::Column::SectorNumber)
        .all(conn)
        .await?;
    Ok(list)
}
