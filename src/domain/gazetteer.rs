use serde::{Deserialize, Serialize};

use super::input::AddressComponents;

/// Status of a gazetteer entry's lifecycle in the authoritative catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GazetteerStatus {
    Live,
    Provisional,
    Historic,
}

impl GazetteerStatus {
    /// Ordering used by the Decider's secondary tie-break: live beats
    /// provisional beats historic.
    pub fn rank(self) -> u8 {
        match self {
            Self::Live => 2,
            Self::Provisional => 1,
            Self::Historic => 0,
        }
    }
}

/// An authoritative address in the gazetteer, identified by a stable
/// reference number (`gazetteer_key`, never reused).
///
/// An entry is either authoritative (bulk-loaded) or a sentinel
/// "historic-reference" entry inserted by the Historic-Reference Resolver
/// (C8), in which case `is_historic` is true and `source_input_id` points
/// back to the creating input for provenance only — the matcher never
/// traverses that link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub gazetteer_key: String,
    pub canonical: String,
    pub components: AddressComponents,
    /// Coordinates in the projected CRS (metres), used for spatial search
    /// and `spatialDistance`/`spatialBoost` features.
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Coordinates in the geographic CRS (degrees), retained for display
    /// purposes only; matching uses the projected pair.
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub status: GazetteerStatus,
    /// Single-letter property-class family, used by `blpuCompat`.
    pub blpu_family: Option<char>,
    pub street_ref: Option<String>,
    pub is_historic: bool,
    pub source_input_id: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

impl GazetteerEntry {
    /// Construct a sentinel historic-reference entry as created by C8.
    /// Coordinates are null, canonical form is copied from the input.
    pub fn sentinel(key: impl Into<String>, canonical: impl Into<String>, source_input_id: impl Into<String>) -> Self {
        let canonical = canonical.into();
        Self {
            gazetteer_key: key.into(),
            canonical: canonical.clone(),
            components: AddressComponents::default(),
            x: None,
            y: None,
            lon: None,
            lat: None,
            status: GazetteerStatus::Historic,
            blpu_family: None,
            street_ref: None,
            is_historic: true,
            source_input_id: Some(source_input_id.into()),
            embedding: None,
        }
    }
}
