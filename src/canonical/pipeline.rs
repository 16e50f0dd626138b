use unicode_normalization::UnicodeNormalization;

use crate::config::RulesConfig;
use crate::domain::AddressComponents;

use super::components::extract_components;
use super::rules::{NON_ALNUM_RE, POSTCODE_RE, SAINT_TOKEN, ST_ABBREVIATION, WHITESPACE_RE};

/// Result of canonicalising one raw address string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalOutput {
    pub canonical: String,
    pub postcode: Option<String>,
    pub tokens: Vec<String>,
    pub components: AddressComponents,
    pub low_quality_canonical: bool,
    pub descriptors: Vec<String>,
}

/// Deterministic normalisation pipeline (SPEC_FULL.md §4.1). Each rule is
/// applied in order and the function is pure: `canonicalize` of its own
/// output is a fixed point (P1).
pub fn canonicalize(raw: &str, rules: &RulesConfig) -> CanonicalOutput {
    // 1. Uppercase and strip diacritics (NFKD decompose, drop combining marks).
    let upper = raw.to_uppercase();
    let stripped: String = upper
        .nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    // 2. Extract the first UK postcode match and delete it from the text.
    let (without_postcode, postcode) = match POSTCODE_RE.find(&stripped) {
        Some(m) => {
            let pc = normalise_postcode(m.as_str());
            let mut text = stripped.clone();
            text.replace_range(m.range(), " ");
            (text, Some(pc))
        }
        None => (stripped, None),
    };

    // 3. Replace all characters outside [A-Z0-9 ] with a single space.
    let ascii_only = NON_ALNUM_RE.replace_all(&without_postcode, " ").to_string();

    // 4. Apply the rule table of token expansions.
    let expanded = expand_abbreviations(&ascii_only, rules);

    // 5. Collapse internal whitespace.
    let canonical = WHITESPACE_RE
        .replace_all(expanded.trim(), " ")
        .trim()
        .to_string();

    // 6. Component extraction.
    let (components, tokens) = extract_components(&canonical, postcode.as_deref());

    // 7. Descriptor flags.
    let descriptors = detect_descriptors(&canonical, rules);

    let low_quality_canonical = tokens.len() < 2;

    CanonicalOutput {
        canonical,
        postcode,
        tokens,
        components,
        low_quality_canonical,
        descriptors,
    }
}

fn normalise_postcode(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 5 {
        return compact;
    }
    let split_at = compact.len() - 3;
    format!("{} {}", &compact[..split_at], &compact[split_at..])
}

/// Applies the configured token-expansion table left-to-right over
/// whitespace-delimited tokens, preserving `SAINT` (never folded into the
/// `ST` -> `STREET` rule) and handling the multi-word `IND EST` rule by a
/// substring pass before per-token expansion.
fn expand_abbreviations(text: &str, rules: &RulesConfig) -> String {
    let mut working = text.to_string();
    for (from, to) in rules.abbreviations.iter().filter(|(k, _)| k.contains(' ')) {
        working = working.replace(from.as_str(), to.as_str());
    }

    working
        .split_whitespace()
        .map(|token| {
            if token == SAINT_TOKEN {
                token.to_string()
            } else if token == ST_ABBREVIATION {
                rules
                    .abbreviations
                    .get(ST_ABBREVIATION)
                    .cloned()
                    .unwrap_or_else(|| token.to_string())
            } else {
                rules.abbreviations.get(token).cloned().unwrap_or_else(|| token.to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_descriptors(canonical: &str, rules: &RulesConfig) -> Vec<String> {
    rules
        .descriptor_phrases
        .iter()
        .filter(|phrase| canonical.contains(phrase.as_str()))
        .cloned()
        .collect()
}
