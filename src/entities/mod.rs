//! `sea-orm` entity models for the five persisted tables in SPEC_FULL.md §6.
//!
//! Structured fields (`components`, `features`, `embedding`, token/descriptor
//! lists) are stored as JSON text columns, matching the donor's convention of
//! keeping denormalised blob columns alongside the indexed scalar columns a
//! query actually filters on.

pub mod correction_note;
pub mod gazetteer_entry;
pub mod input_record;
pub mod match_attempt;
pub mod match_result;

pub mod prelude {
    pub use super::correction_note::Entity as CorrectionNotes;
    pub use super::gazetteer_entry::Entity as GazetteerEntries;
    pub use super::input_record::Entity as InputRecords;
    pub use super::match_attempt::Entity as MatchAttempts;
    pub use super::match_result::Entity as MatchResults;
}
