use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    TelegramId,
    Username,
    FirstName,
    TicketsAvailable,
    TicketsDepletedAt,
    LastTicketReceivedAt,
    LastSpinAt,
    TotalSpins,
    TotalWins,
    StarsBalance,
    ReferrerId,
    CreatedAt,
    UpdatedAt,
}

/// Wheel Sectors (转盘扇区配置表)
#[derive(DeriveIden)]
enum WheelSectors {
    Table,
    Id,
    SectorNumber,
    PrizeType,
    PrizeValue,
    ProbabilityPercent,
    ActionType,
    ActionValue,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Wheel Spins (抽奖流水表)
#[derive(DeriveIden)]
enum WheelSpins {
    Table,
    Id,
    UserId,
    SectorId,
    SectorNumber,
    PrizeType,
    PrizeValue,
    SpinTime,
}

/// App Settings (全局设置单例表)
#[derive(DeriveIden)]
enum AppSettings {
    Table,
    Id,
    TicketRestoreHours,
    DailyTickets,
    DefaultDailyTickets,
    StartTickets,
    AlwaysEmptyMode,
    StarsPerTicketPurchase,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 初始扇区配置（12 格，活动扇区概率之和 = 100%）:
/// - 4 个 empty 共 49%
/// - 3 个 ticket 共 32%
/// - 2 个 money (100 / 500) 共 7%
/// - 2 个 secret_box / sponsor_gift 共 9%（12 号扇区附带 add_ticket 安慰券）
/// 概率由管理端维护，引擎按实际总和钳制随机数，不假设恒为 100。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Postgres 枚举类型
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("prize_type"))
                    .values(vec![
                        Alias::new("money"),
                        Alias::new("ticket"),
                        Alias::new("secret_box"),
                        Alias::new("sponsor_gift"),
                        Alias::new("empty"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("sector_action_type"))
                    .values(vec![Alias::new("add_ticket")])
                    .to_owned(),
            )
            .await?;

        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::TelegramId).big_integer().not_null())
                    .col(ColumnDef::new(Users::Username).string_len(255).null())
                    .col(ColumnDef::new(Users::FirstName).string_len(255).null())
                    .col(
                        ColumnDef::new(Users::TicketsAvailable)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::TicketsDepletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::LastTicketReceivedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::LastSpinAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::TotalSpins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::TotalWins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::StarsBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::ReferrerId).big_integer().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // telegram_id 唯一索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_telegram_id_unique")
                    .table(Users::Table)
                    .col(Users::TelegramId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 扇区表
        manager
            .create_table(
                Table::create()
                    .table(WheelSectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WheelSectors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::SectorNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::PrizeType)
                            .custom(Alias::new("prize_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::PrizeValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::ProbabilityPercent)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::ActionType)
                            .custom(Alias::new("sector_action_type"))
                            .null(),
                    )
                    .col(ColumnDef::new(WheelSectors::ActionValue).big_integer().null())
                    .col(
                        ColumnDef::new(WheelSectors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(WheelSectors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 扇区编号唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wheel_sectors_number_unique")
                    .table(WheelSectors::Table)
                    .col(WheelSectors::SectorNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 抽奖流水表
        manager
            .create_table(
                Table::create()
                    .table(WheelSpins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WheelSpins::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WheelSpins::UserId).big_integer().not_null())
                    .col(ColumnDef::new(WheelSpins::SectorId).big_integer().not_null())
                    .col(
                        ColumnDef::new(WheelSpins::SectorNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WheelSpins::PrizeType)
                            .custom(Alias::new("prize_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WheelSpins::PrizeValue)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WheelSpins::SpinTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 用户查询流水索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wheel_spins_user")
                    .table(WheelSpins::Table)
                    .col(WheelSpins::UserId)
                    .to_owned(),
            )
            .await?;

        // 扇区外键（不加 ON DELETE CASCADE，保证历史记录仍然存在）
        manager
            .alter_table(
                Table::alter()
                    .table(WheelSpins::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_wheel_spin_sector")
                            .from_tbl(WheelSpins::Table)
                            .from_col(WheelSpins::SectorId)
                            .to_tbl(WheelSectors::Table)
                            .to_col(WheelSectors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 设置单例表
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSettings::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AppSettings::TicketRestoreHours)
                            .integer()
                            .not_null()
                            .default(6),
                    )
                    .col(
                        ColumnDef::new(AppSettings::DailyTickets)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(AppSettings::DefaultDailyTickets)
                            .big_integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(AppSettings::StartTickets)
                            .big_integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(AppSettings::AlwaysEmptyMode)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AppSettings::StarsPerTicketPurchase)
                            .big_integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(AppSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 初始化设置单例与扇区数据
        let conn = manager.get_connection();
        let seed_settings = r#"
INSERT INTO app_settings (id, ticket_restore_hours, daily_tickets, default_daily_tickets, start_tickets, always_empty_mode, stars_per_ticket_purchase)
VALUES (1, 6, 1, 3, 5, FALSE, 10)
ON CONFLICT (id) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            seed_settings.to_string(),
        ))
        .await?;

        let seed_sectors = r#"
INSERT INTO wheel_sectors (sector_number, prize_type, prize_value, probability_percent, action_type, action_value, is_active)
VALUES
 (1,  'money',        100, 5.0,  NULL, NULL, TRUE),
 (2,  'empty',        0,   15.0, NULL, NULL, TRUE),
 (3,  'ticket',       1,   12.0, NULL, NULL, TRUE),
 (4,  'sponsor_gift', 0,   5.0,  NULL, NULL, TRUE),
 (5,  'empty',        0,   15.0, NULL, NULL, TRUE),
 (6,  'money',        500, 2.0,  NULL, NULL, TRUE),
 (7,  'ticket',       2,   8.0,  NULL, NULL, TRUE),
 (8,  'empty',        0,   14.0, NULL, NULL, TRUE),
 (9,  'secret_box',   0,   4.0,  NULL, NULL, TRUE),
 (10, 'ticket',       1,   12.0, NULL, NULL, TRUE),
 (11, 'empty',        0,   5.0,  NULL, NULL, TRUE),
 (12, 'sponsor_gift', 0,   3.0,  'add_ticket', 1, TRUE)
ON CONFLICT (sector_number) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            seed_sectors.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：流水 -> 扇区 -> 设置 -> 用户 -> 枚举类型
        manager
            .drop_table(Table::drop().if_exists().table(WheelSpins::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(WheelSectors::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(AppSettings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_type(
                Type::drop()
                    .if_exists()
                    .name(Alias::new("sector_action_type"))
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(
                Type::drop()
                    .if_exists()
                    .name(Alias::new("prize_type"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
