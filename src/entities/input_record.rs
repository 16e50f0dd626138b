//! `input_records` — historic document addresses awaiting a match decision
//! (SPEC_FULL.md §6).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "input_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "input_id")]
    pub input_id: String,
    pub raw_text: String,
    pub family: String,
    pub external_ref: Option<String>,
    pub raw_reference_number: Option<String>,
    pub raw_x: Option<f64>,
    pub raw_y: Option<f64>,
    pub doc_date: Option<Date>,

    pub canonical: Option<String>,
    pub postcode: Option<String>,
    /// JSON-encoded `Vec<String>`.
    pub tokens: String,
    /// JSON-encoded `AddressComponents`.
    pub components: String,
    pub low_quality_canonical: bool,
    /// JSON-encoded `Vec<String>`.
    pub descriptors: String,
    /// JSON-encoded `Vec<String>`.
    pub correction_trail: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
