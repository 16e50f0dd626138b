//! `gazetteer_entries` — the authoritative address catalogue (SPEC_FULL.md §6).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "gazetteer_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "key")]
    pub gazetteer_key: String,
    pub canonical: String,
    /// JSON-encoded `AddressComponents`.
    pub components: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    /// `live` | `provisional` | `historic`.
    pub status: String,
    /// Single-letter property-class family, stored as a 1-char string.
    pub blpu_family: Option<String>,
    pub street_ref: Option<String>,
    pub is_historic: bool,
    pub source_input_id: Option<String>,
    /// JSON-encoded `Vec<f32>`, absent when no embedding has been computed.
    pub embedding: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
