//! C2: token-level phonetic codes for approximate matching of
//! mis-spellings, used by the Trigram Fuzzy strategy (S2) and the
//! `phoneticHits` feature.
//!
//! A Metaphone-style encoder: consonant-skeleton reduction with a handful of
//! digraph rules common to UK place names (`PH`->F, `GH` silent, `KN`/`WR`
//! leading-silent-letter rules). Not a full Double Metaphone implementation —
//! the Feature Computer only needs code *overlap*, not a canonical phonetic
//! dictionary key.

/// Encode a single token into its phonetic code. Empty input yields an empty
/// code. The encoding is deterministic and pure.
pub fn encode(token: &str) -> String {
    let upper = token.to_uppercase();
    let chars: Vec<char> = upper.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if chars.is_empty() {
        return String::new();
    }

    let mut code = String::new();
    let mut i = 0;
    let n = chars.len();

    // Leading silent-letter digraphs.
    if n >= 2 {
        match (chars[0], chars[1]) {
            ('K', 'N') | ('G', 'N') | ('W', 'R') => i = 1,
            ('P', 'S') | ('P', 'N') => i = 1,
            _ => {}
        }
    }

    let mut last_code: Option<char> = None;
    while i < n {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        let mapped = match (c, next) {
            ('P', Some('H')) => {
                i += 1;
                Some('F')
            }
            ('G', Some('H')) => {
                i += 1;
                None // silent
            }
            ('T', Some('H')) => {
                i += 1;
                Some('0')
            }
            ('S', Some('H')) => {
                i += 1;
                Some('X')
            }
            ('C', Some('H')) => {
                i += 1;
                Some('X')
            }
            ('C', Some('I')) | ('C', Some('E')) | ('C', Some('Y')) => Some('S'),
            ('C', _) => Some('K'),
            ('Q', _) => Some('K'),
            ('X', _) => {
                code.push('K');
                Some('S')
            }
            ('Z', _) => Some('S'),
            ('V', _) => Some('F'),
            ('W', _) | ('Y', _) => {
                if i == 0 {
                    Some(c)
                } else {
                    None
                }
            }
            ('A', _) | ('E', _) | ('I', _) | ('O', _) | ('U', _) => {
                if i == 0 { Some(c) } else { None }
            }
            _ => Some(c),
        };

        if let Some(m) = mapped {
            if last_code != Some(m) {
                code.push(m);
                last_code = Some(m);
            }
        } else {
            last_code = None;
        }

        i += 1;
    }

    code.truncate(8);
    code
}

/// Encode every token, preserving order and duplicates removed per the
/// set semantics the Feature Computer needs for overlap counting.
pub fn encode_tokens(tokens: &[String]) -> Vec<String> {
    let mut codes: Vec<String> = tokens.iter().map(|t| encode(t)).filter(|c| !c.is_empty()).collect();
    codes.sort();
    codes.dedup();
    codes
}

/// Count of phonetic codes shared between two token sets, used directly as
/// the `phoneticHits` feature.
pub fn shared_code_count(a: &[String], b: &[String]) -> usize {
    let codes_a = encode_tokens(a);
    let codes_b = encode_tokens(b);
    codes_a.iter().filter(|c| codes_b.contains(c)).count()
}
