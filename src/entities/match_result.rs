//! `match_results` — the final decision for an input within a run
//! (SPEC_FULL.md §6). At most one row per `(input_id, run_label)`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "match_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub input_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub run_label: String,
    /// `autoAccept` | `review` | `reject`.
    pub decision: String,
    pub gazetteer_key: Option<String>,
    pub method: Option<String>,
    pub score: f64,
    pub reason: String,
    pub ts: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
