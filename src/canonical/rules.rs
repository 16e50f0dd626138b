use std::sync::LazyLock;

use regex::Regex;

/// UK postcode pattern, SPEC_FULL.md §4.1 rule 2.
pub const UK_POSTCODE_PATTERN: &str = r"[A-Z]{1,2}\d[\dA-Z]?\s*\d[ABD-HJLNP-UW-Z]{2}";

pub static POSTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UK_POSTCODE_PATTERN).expect("static postcode regex"));

pub static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9 ]").expect("static non-alnum regex"));

pub static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

pub static HOUSE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([A-Z]?)\b").expect("static house number regex"));

pub static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:UNIT|FLAT|APT|PLOT)\s*(\d+[A-Z]?)\b").expect("static unit regex")
});

/// `SAINT` is never expanded by the `ST` abbreviation rule — it's handled as
/// its own literal token so street names like `ST JAMES` survive unchanged.
pub const SAINT_TOKEN: &str = "SAINT";
pub const ST_ABBREVIATION: &str = "ST";
