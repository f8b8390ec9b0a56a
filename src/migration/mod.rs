//! SeaORM database migrations.
//!
//! Written with the schema builder so the same migrations run against
//! PostgreSQL in production and SQLite in tests.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_chats;
mod m20261001_000003_create_contest_submissions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_chats::Migration),
            Box::new(m20261001_000003_create_contest_submissions::Migration),
        ]
    }
}
