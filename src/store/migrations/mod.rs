//! `sea-orm` migrations for the matching engine's persisted schema, database
//! agnostic across SQLite/PostgreSQL/MySQL the same way the donor's
//! migrations are, with backend-specific optimisations (the PostgreSQL
//! trigram GIN index) applied only where available.

use sea_orm_migration::prelude::*;

pub mod m20260110_090000_initial_schema;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260110_090000_initial_schema::Migration)]
    }
}
