//! C1: deterministic normalisation of raw address text into a canonical
//! form, component fields, and token sets.
//!
//! Grounded on the donor pack's `canonical` crate: a strictly ordered,
//! side-effect-free pipeline (normalise → strip → expand → collapse →
//! extract) so that `canonicalize(canonicalize(r)) == canonicalize(r)` for
//! every input (P1).

mod components;
mod pipeline;
mod rules;

pub use pipeline::{CanonicalOutput, canonicalize};
pub use rules::UK_POSTCODE_PATTERN;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    fn rules() -> RulesConfig {
        RulesConfig::default()
    }

    #[test]
    fn idempotence_holds_for_varied_input() {
        let samples = [
            "12 High Street, Petersfield GU32 2AB",
            "Flat 3, 45a Mill Ln., Alton   HANTS",
            "  168   Station Rd Liss ",
            "Unit 10 Mill Lane Alton GU34 1AA",
            "",
            "!!!###",
        ];
        let rules = rules();
        for raw in samples {
            let once = canonicalize(raw, &rules);
            let twice = canonicalize(&once.canonical, &rules);
            assert_eq!(once.canonical, twice.canonical, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn postcode_is_extracted_and_removed() {
        let out = canonicalize("12 High Street Petersfield GU32 2AB", &rules());
        assert_eq!(out.postcode.as_deref(), Some("GU32 2AB"));
        assert!(!out.canonical.contains("GU32"));
    }

    #[test]
    fn expands_abbreviations() {
        let out = canonicalize("12 HIGH ST", &rules());
        assert!(out.canonical.contains("STREET"));
        assert!(!out.canonical.ends_with(" ST"));
    }

    #[test]
    fn low_quality_flag_set_for_sparse_input() {
        let out = canonicalize("42", &rules());
        assert!(out.low_quality_canonical);
    }

    #[test]
    fn house_number_and_unit_extracted() {
        let out = canonicalize("UNIT 10 MILL LANE ALTON", &rules());
        assert_eq!(out.components.unit.as_deref(), Some("10"));

        let out2 = canonicalize("168A STATION ROAD LISS", &rules());
        assert_eq!(out2.components.house_number.as_deref(), Some("168"));
        assert_eq!(out2.components.house_alpha.as_deref(), Some("A"));
    }

    #[test]
    fn descriptor_flags_detected() {
        let out = canonicalize("LAND AT REAR OF 12 HIGH STREET", &rules());
        assert!(out.descriptors.contains(&"LAND AT".to_string()));
        assert!(out.descriptors.contains(&"REAR OF".to_string()));
    }

    mod properties {
        use proptest::prelude::*;
        use regex::Regex;

        use super::*;
        use crate::canonical::UK_POSTCODE_PATTERN;

        /// Address-shaped text: a house number, 1-4 street-ish words, and an
        /// optional UK-postcode suffix — generalises the fixed literal
        /// samples above to arbitrary instances.
        fn arb_address_like() -> impl Strategy<Value = String> {
            let word = "[A-Za-z]{2,10}";
            prop_oneof![
                (1u32..999, prop::collection::vec(word, 1..4)).prop_map(|(num, words)| format!("{num} {}", words.join(" "))),
                (1u32..999, prop::collection::vec(word, 1..4), "[A-Z]{1,2}[0-9]{1,2} [0-9][A-Z]{2}")
                    .prop_map(|(num, words, postcode)| format!("{num} {} {postcode}", words.join(" "))),
            ]
        }

        proptest! {
            /// P1: canonicalisation is idempotent for any generated address text.
            #[test]
            fn canonicalise_is_idempotent(raw in arb_address_like()) {
                let rules = rules();
                let once = canonicalize(&raw, &rules);
                let twice = canonicalize(&once.canonical, &rules);
                prop_assert_eq!(once.canonical, twice.canonical);
            }

            /// P2: whatever postcode is extracted matches the postcode pattern and
            /// is removed from the canonical form it came from.
            #[test]
            fn extracted_postcode_is_disjoint_from_canonical(raw in arb_address_like()) {
                let rules = rules();
                let out = canonicalize(&raw, &rules);
                if let Some(postcode) = &out.postcode {
                    let re = Regex::new(UK_POSTCODE_PATTERN).unwrap();
                    prop_assert!(re.is_match(postcode), "extracted postcode {:?} does not match the postcode pattern", postcode);
                    prop_assert!(!out.canonical.contains(postcode.as_str()), "canonical retained the extracted postcode {:?}", postcode);
                }
            }
        }
    }
}
