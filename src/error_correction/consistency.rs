//! Document-level spelling consistency.
//!
//! When a word and a near-identical variant both occur in a document, the
//! less frequent spelling is rewritten to the more frequent one.

use std::collections::HashMap;

use super::profile::ProfileTables;
use super::similarity::similarity;
use super::tokens::{match_case, splice, tokenize};

/// Variants score strictly between this and 1.0 against their canonical form.
pub const VARIANT_SIMILARITY: f64 = 0.8;
/// Words shorter than this are not counted.
pub const MIN_CONSISTENCY_CHARS: usize = 3;

/// Counts word keys of at least [`MIN_CONSISTENCY_CHARS`] characters.
pub fn word_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for token in tokenize(text) {
        let key = token.key();
        if key.chars().count() >= MIN_CONSISTENCY_CHARS {
            *frequencies.entry(key).or_insert(0) += 1;
        }
    }
    frequencies
}

/// Maps each variant to its canonical spelling.
///
/// Words are visited from most to least frequent (ties alphabetical). A word
/// that has not itself been claimed as a variant claims every less frequent,
/// unclaimed, non-lexicon word whose similarity lies in the open interval
/// ([`VARIANT_SIMILARITY`], 1.0).
/// Canonical forms are never remapped, so the map has no chains.
pub fn variant_map(
    frequencies: &HashMap<String, usize>,
    tables: &ProfileTables,
) -> HashMap<String, String> {
    let mut words: Vec<(&str, usize)> = frequencies
        .iter()
        .map(|(word, &count)| (word.as_str(), count))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut variants: HashMap<String, String> = HashMap::new();
    for (i, &(canonical, count)) in words.iter().enumerate() {
        if variants.contains_key(canonical) {
            continue;
        }
        for &(candidate, candidate_count) in &words[i + 1..] {
            if candidate_count >= count
                || variants.contains_key(candidate)
                || tables.is_known(candidate)
            {
                continue;
            }
            if is_variant(similarity(canonical, candidate)) {
                variants.insert(candidate.to_string(), canonical.to_string());
            }
        }
    }
    variants
}

fn is_variant(score: f64) -> bool {
    score > VARIANT_SIMILARITY && score < 1.0
}

/// Rewrites variant spellings to their canonical form.
///
/// Returns the new text and the `(from, to)` pairs actually replaced, in
/// document order.
pub fn enforce_consistency(text: &str, tables: &ProfileTables) -> (String, Vec<(String, String)>) {
    let variants = variant_map(&word_frequencies(text), tables);
    if variants.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let tokens = tokenize(text);
    let mut changes = Vec::new();
    let replacements: Vec<Option<String>> = tokens
        .iter()
        .map(|token| {
            let canonical = variants.get(&token.key())?;
            let replacement = match_case(&token.core, canonical);
            changes.push((token.core.clone(), replacement.clone()));
            Some(replacement)
        })
        .collect();

    (splice(text, &tokens, &replacements), changes)
}
