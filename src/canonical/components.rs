use crate::domain::AddressComponents;

use super::rules::{HOUSE_NUMBER_RE, UNIT_RE};

/// Component extraction by regex cascade (SPEC_FULL.md §4.1 rule 6): leading
/// house number (+ alpha suffix), then unit/flat/apt/plot, then a
/// position-heuristic split of what remains into road/locality/town.
///
/// Road/locality/town extraction is necessarily approximate — the source
/// text carries no explicit delimiters after punctuation has been stripped —
/// so the heuristic favours precision over recall: it only ever assigns a
/// `town` when at least three tokens remain after house number/unit removal.
pub fn extract_components(canonical: &str, postcode: Option<&str>) -> (AddressComponents, Vec<String>) {
    let mut components = AddressComponents {
        postcode: postcode.map(str::to_string),
        ..Default::default()
    };

    let mut remainder = canonical.to_string();

    if let Some(captures) = HOUSE_NUMBER_RE.captures(&remainder) {
        let full = captures.get(0).unwrap().as_str().to_string();
        components.house_number = Some(captures[1].to_string());
        let alpha = captures.get(2).map(|m| m.as_str()).unwrap_or("");
        if !alpha.is_empty() {
            components.house_alpha = Some(alpha.to_string());
        }
        remainder = remainder[full.len()..].trim_start().to_string();
    }

    if let Some(captures) = UNIT_RE.captures(&remainder) {
        components.unit = Some(captures[1].to_string());
        let whole = captures.get(0).unwrap().as_str();
        remainder = remainder.replacen(whole, "", 1).trim().to_string();
        remainder = super::rules::WHITESPACE_RE.replace_all(&remainder, " ").trim().to_string();
    }

    let tokens: Vec<&str> = remainder.split_whitespace().collect();
    match tokens.len() {
        0 => {}
        1 => components.road = Some(tokens[0].to_string()),
        2 => {
            components.road = Some(tokens[0].to_string());
            components.locality = Some(tokens[1].to_string());
        }
        _ => {
            components.town = Some(tokens[tokens.len() - 1].to_string());
            components.locality = Some(tokens[tokens.len() - 2].to_string());
            components.road = Some(tokens[..tokens.len() - 2].join(" "));
        }
    }

    let all_tokens = canonical
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();

    (components, all_tokens)
}
