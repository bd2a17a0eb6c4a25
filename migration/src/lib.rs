pub use sea_orm_migration::prelude::*;

mod m20260801_000001_initial;
mod m20260810_000001_add_ticket_ledger;
mod m20260818_000001_add_referral_popup_shown;
mod m20260825_000001_add_payment_charge_id;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_initial::Migration),
            Box::new(m20260810_000001_add_ticket_ledger::Migration),
            Box::new(m20260818_000001_add_referral_popup_shown::Migration),
            Box::new(m20260825_000001_add_payment_charge_id::Migration),
        ]
    }
}
