//! C3: symmetric-delete ("SymSpell") dictionary built from gazetteer tokens,
//! used to correct individual tokens of a canonical input before candidate
//! generation. Every correction applied is recorded so it can be replayed
//! into a `CorrectionNote` for the audit trail.

use std::collections::HashMap;

/// A dictionary of known-good tokens (drawn from the gazetteer's canonical
/// forms) indexed by their delete-variants, per the symmetric-delete spelling
/// correction algorithm: instead of generating edits of the *query*, the
/// dictionary pre-generates deletes of every *known* word up to
/// `max_edit_distance`, so lookup is a single generate-and-probe pass.
#[derive(Debug, Clone)]
pub struct SpellDictionary {
    /// known token -> corpus frequency (more frequent = preferred on ties).
    words: HashMap<String, u64>,
    /// delete-variant -> known tokens that produce it.
    deletes: HashMap<String, Vec<String>>,
    max_edit_distance: u8,
}

/// One token-level correction applied during spell-correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCorrection {
    pub original: String,
    pub corrected: String,
    pub edit_distance: u8,
}

impl SpellDictionary {
    /// Build a dictionary from the gazetteer's canonical token corpus. Tokens
    /// shorter than 3 characters are excluded — short tokens produce too many
    /// delete-collisions to correct safely.
    pub fn build<I, S>(tokens: I, max_edit_distance: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: HashMap<String, u64> = HashMap::new();
        for token in tokens {
            let token = token.into();
            if token.chars().count() < 3 {
                continue;
            }
            *words.entry(token).or_insert(0) += 1;
        }

        let mut deletes: HashMap<String, Vec<String>> = HashMap::new();
        for word in words.keys() {
            for variant in generate_deletes(word, max_edit_distance) {
                deletes.entry(variant).or_default().push(word.clone());
            }
        }

        Self { words, deletes, max_edit_distance }
    }

    pub fn is_known(&self, token: &str) -> bool {
        self.words.contains_key(token)
    }

    /// Return the best correction for `token`, or `None` if the token is
    /// already known or no candidate within `max_edit_distance` exists.
    pub fn correct(&self, token: &str) -> Option<TokenCorrection> {
        if self.is_known(token) || token.chars().count() < 3 {
            return None;
        }

        let mut best: Option<(String, u8, u64)> = None;

        let mut consider = |candidate: &str| {
            let distance = levenshtein(token, candidate);
            if distance == 0 || distance as u8 > self.max_edit_distance {
                return;
            }
            let freq = *self.words.get(candidate).unwrap_or(&0);
            let better = match &best {
                None => true,
                Some((_, best_dist, best_freq)) => {
                    distance < *best_dist as usize || (distance == *best_dist as usize && freq > *best_freq)
                }
            };
            if better {
                best = Some((candidate.to_string(), distance as u8, freq));
            }
        };

        if let Some(direct) = self.deletes.get(token) {
            for candidate in direct {
                consider(candidate);
            }
        }
        for variant in generate_deletes(token, self.max_edit_distance) {
            if let Some(candidates) = self.deletes.get(&variant) {
                for candidate in candidates {
                    consider(candidate);
                }
            }
            if self.words.contains_key(&variant) {
                consider(&variant);
            }
        }

        best.map(|(corrected, edit_distance, _)| TokenCorrection {
            original: token.to_string(),
            corrected,
            edit_distance,
        })
    }

    /// Correct every token of `tokens`, returning the corrected token list
    /// and the corrections actually applied (empty tokens vacuously uncorrected).
    pub fn correct_tokens(&self, tokens: &[String]) -> (Vec<String>, Vec<TokenCorrection>) {
        let mut corrected = Vec::with_capacity(tokens.len());
        let mut applied = Vec::new();
        for token in tokens {
            match self.correct(token) {
                Some(fix) => {
                    corrected.push(fix.corrected.clone());
                    applied.push(fix);
                }
                None => corrected.push(token.clone()),
            }
        }
        (corrected, applied)
    }
}

fn generate_deletes(word: &str, max_edit_distance: u8) -> Vec<String> {
    let mut results = vec![word.to_string()];
    let mut frontier = vec![word.to_string()];
    for _ in 0..max_edit_distance {
        let mut next_frontier = Vec::new();
        for candidate in &frontier {
            let chars: Vec<char> = candidate.chars().collect();
            for i in 0..chars.len() {
                let mut variant: String = String::with_capacity(chars.len().saturating_sub(1));
                variant.extend(chars[..i].iter());
                variant.extend(chars[i + 1..].iter());
                if !results.contains(&variant) {
                    results.push(variant.clone());
                    next_frontier.push(variant);
                }
            }
        }
        frontier = next_frontier;
        if frontier.is_empty() {
            break;
        }
    }
    results
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> SpellDictionary {
        SpellDictionary::build(
            vec!["STREET", "ROAD", "AVENUE", "PETERSFIELD", "GARDENS"],
            2,
        )
    }

    #[test]
    fn known_token_is_not_corrected() {
        assert_eq!(dict().correct("STREET"), None);
    }

    #[test]
    fn single_edit_typo_is_corrected() {
        let fix = dict().correct("STREEET").expect("should correct");
        assert_eq!(fix.corrected, "STREET");
        assert_eq!(fix.edit_distance, 1);
    }

    #[test]
    fn short_tokens_are_never_corrected() {
        assert_eq!(dict().correct("ST"), None);
    }

    #[test]
    fn correct_tokens_preserves_order_and_uncorrectable_tokens() {
        let tokens = vec!["12".to_string(), "PETERSFEILD".to_string(), "GARDENS".to_string()];
        let (corrected, applied) = dict().correct_tokens(&tokens);
        assert_eq!(corrected, vec!["12", "PETERSFIELD", "GARDENS"]);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].original, "PETERSFEILD");
    }

    #[test]
    fn levenshtein_distance_is_symmetric() {
        assert_eq!(levenshtein("KITTEN", "SITTING"), levenshtein("SITTING", "KITTEN"));
    }
}
