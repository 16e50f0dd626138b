//! `sea-orm`-backed implementation of the `GazetteerStore` and `InputStore`
//! ports (SPEC_FULL.md §6, §10.4). Every query goes through
//! `repositories::retry_wrapper` so transient DB failures are retried with
//! the donor-derived exponential-backoff policy before surfacing as a typed
//! `StoreError`.

pub mod migrations;
mod seaorm;

pub use migrations::Migrator;
pub use seaorm::SeaOrmStore;
