use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

/// Ticket Ledger (抽奖券发放流水表)
///
/// 每一次抽奖券入账都记录一行，余额异常时可以按流水对账。
#[derive(DeriveIden)]
enum TicketLedger {
    Table,
    Id,
    UserId,
    TicketsCount,
    Source,
    RestoredAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("ticket_source"))
                    .values(vec![
                        Alias::new("initial_bonus"),
                        Alias::new("default_daily_bonus"),
                        Alias::new("daily_bonus"),
                        Alias::new("star_exchange"),
                        Alias::new("stars_payment"),
                        Alias::new("prize_type_action"),
                        Alias::new("timer_restoration"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketLedger::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketLedger::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketLedger::TicketsCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketLedger::Source)
                            .custom(Alias::new("ticket_source"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketLedger::RestoredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_ledger_user")
                    .table(TicketLedger::Table)
                    .col(TicketLedger::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(TicketLedger::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(
                Type::drop()
                    .if_exists()
                    .name(Alias::new("ticket_source"))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
