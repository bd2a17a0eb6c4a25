use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    ReferralPopupShownAt,
}

/// 用户券耗尽后只弹一次邀请弹窗，用该时间戳做一次性标记。
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column_if_not_exists(
                        ColumnDef::new(Users::ReferralPopupShownAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .drop_column(Users::ReferralPopupShownAt)
                    .to_owned(),
            )
            .await
    }
}
