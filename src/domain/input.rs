use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Best-effort structural split of an address, shared by `InputRecord` and
/// `GazetteerEntry` so the Feature Computer can compare like components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub house_number: Option<String>,
    pub house_alpha: Option<String>,
    pub unit: Option<String>,
    pub road: Option<String>,
    pub locality: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
}

/// A historic document address awaiting a match decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    pub input_id: String,
    pub raw_text: String,
    pub family: String,
    /// Per-document identifier (e.g. planning application number) bundling
    /// multiple inputs referring to the same real-world case; consumed by
    /// the Group Consensus Corrector (C9).
    pub external_ref: Option<String>,
    pub raw_reference_number: Option<String>,
    pub raw_x: Option<f64>,
    pub raw_y: Option<f64>,
    pub doc_date: Option<NaiveDate>,

    // Derived fields, populated by the core before matching.
    pub canonical: Option<String>,
    pub postcode: Option<String>,
    pub tokens: Vec<String>,
    pub components: AddressComponents,
    pub low_quality_canonical: bool,
    /// Descriptor phrases detected by the Canonicaliser (e.g. `LAND AT`,
    /// `REAR OF`) that materially change what the address denotes.
    pub descriptors: Vec<String>,
    /// Token-level corrections applied before matching (speller, rewriter,
    /// or consensus), in application order.
    pub correction_trail: Vec<String>,
}

impl InputRecord {
    pub fn new(input_id: impl Into<String>, raw_text: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            input_id: input_id.into(),
            raw_text: raw_text.into(),
            family: family.into(),
            external_ref: None,
            raw_reference_number: None,
            raw_x: None,
            raw_y: None,
            doc_date: None,
            canonical: None,
            postcode: None,
            tokens: Vec::new(),
            components: AddressComponents::default(),
            low_quality_canonical: false,
            descriptors: Vec::new(),
            correction_trail: Vec::new(),
        }
    }

    pub fn has_raw_coordinates(&self) -> bool {
        self.raw_x.is_some() && self.raw_y.is_some()
    }
}
