//! `correction_notes` — append-only audit trail of rewrites and consensus
//! overrides (SPEC_FULL.md §6).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "correction_notes")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "note_id")]
    pub note_id: i64,
    #[sea_orm(indexed)]
    pub input_id: String,
    /// `speller` | `rewriter` | `consensus`.
    pub agent: String,
    pub before_canonical: String,
    pub after_canonical: String,
    pub confidence: f64,
    /// JSON-encoded validation outcome.
    pub validation: String,
    pub ts: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
