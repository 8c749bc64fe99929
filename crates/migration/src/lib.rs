pub use sea_orm_migration::prelude::*;

mod m20260512_000001_users;
mod m20260512_000002_groups;
mod m20260518_000001_expenses;
mod m20260524_000001_settlements;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260512_000001_users::Migration),
            Box::new(m20260512_000002_groups::Migration),
            Box::new(m20260518_000001_expenses::Migration),
            Box::new(m20260524_000001_settlements::Migration),
        ]
    }
}
