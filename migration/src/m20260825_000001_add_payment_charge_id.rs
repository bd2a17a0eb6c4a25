use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum TicketLedger {
    Table,
    PaymentChargeId,
}

/// Telegram 会重推 successful_payment，按 charge id 唯一约束去重。
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(TicketLedger::Table)
                    .add_column_if_not_exists(
                        ColumnDef::new(TicketLedger::PaymentChargeId)
                            .string_len(255)
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_ledger_charge_unique")
                    .table(TicketLedger::Table)
                    .col(TicketLedger::PaymentChargeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_ticket_ledger_charge_unique")
                    .table(TicketLedger::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(TicketLedger::Table)
                    .drop_column(TicketLedger::PaymentChargeId)
                    .to_owned(),
            )
            .await
    }
}
