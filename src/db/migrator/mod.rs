use sea_orm_migration::prelude::*;

mod m20260215_add_users;
mod m20260222_add_password_reset_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260215_add_users::Migration),
            Box::new(m20260222_add_password_reset_tokens::Migration),
        ]
    }
}
