//! `match_attempts` — every candidate considered for an input within a run
//! (SPEC_FULL.md §6). Retained for audit; may be pruned by run retention
//! policy outside the core.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "match_attempts")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "attempt_id")]
    pub attempt_id: i64,
    pub run_label: String,
    #[sea_orm(indexed)]
    pub input_id: String,
    pub gazetteer_key: String,
    pub method: String,
    pub score: f64,
    pub tie_rank: i32,
    /// JSON-encoded `HashMap<String, f64>`.
    pub features: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
