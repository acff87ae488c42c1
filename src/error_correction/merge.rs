//! Reconciliation of the forward and backward passes.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::similarity::similarity;

/// How often OCR drops or confuses a character that a correction restores.
/// A heuristic table; unlisted characters weigh 0.
const COMMON_CORRECTIONS: &[(char, f64)] = &[
    ('\u{09BE}', 0.9), // aa sign
    ('\u{09BF}', 0.8), // i sign
    ('\u{09C0}', 0.7), // ii sign
    ('\u{09C1}', 0.7), // u sign
    ('\u{09C2}', 0.6), // uu sign
    ('\u{09C7}', 0.8), // e sign
    ('\u{09CB}', 0.7), // o sign
    ('\u{09CD}', 0.8), // virama
    ('\u{0982}', 0.6), // anusvara
    ('\u{0981}', 0.6), // candrabindu
    ('\u{09BC}', 0.5), // nukta
    ('\u{09A3}', 0.6), // retroflex na
    ('\u{09B0}', 0.5), // ra
    ('\u{09B7}', 0.5), // ssa
    ('\u{09B6}', 0.5), // sha
    ('h', 0.6),
    ('l', 0.5),
    ('i', 0.5),
    ('m', 0.5),
    ('e', 0.4),
    ('r', 0.4),
];

lazy_static! {
    static ref CORRECTION_WEIGHTS: HashMap<char, f64> = COMMON_CORRECTIONS.iter().copied().collect();
}

/// Confidence that `replacement` is a genuine repair of `original`:
/// their similarity plus the mean weight of the characters the replacement
/// changes or adds.
pub fn correction_confidence(original: &str, replacement: &str) -> f64 {
    let original_chars: Vec<char> = original.chars().collect();
    let changed: Vec<f64> = replacement
        .chars()
        .enumerate()
        .filter(|&(i, c)| original_chars.get(i) != Some(&c))
        .map(|(_, c)| CORRECTION_WEIGHTS.get(&c).copied().unwrap_or(0.0))
        .collect();

    let mean_weight = if changed.is_empty() {
        0.0
    } else {
        changed.iter().sum::<f64>() / changed.len() as f64
    };
    similarity(original, replacement) + mean_weight
}

/// Merges one token's pass results.
///
/// Agreement keeps the shared value, a single change wins over no change,
/// and a conflict goes to the replacement with the higher
/// [`correction_confidence`] (forward on ties).
pub fn merge_token(
    original: &str,
    forward: Option<&str>,
    backward: Option<&str>,
) -> Option<String> {
    match (forward, backward) {
        (None, None) => None,
        (Some(word), None) | (None, Some(word)) => Some(word.to_string()),
        (Some(f), Some(b)) if f == b => Some(f.to_string()),
        (Some(f), Some(b)) => {
            let original = original.to_lowercase();
            let forward_confidence = correction_confidence(&original, &f.to_lowercase());
            let backward_confidence = correction_confidence(&original, &b.to_lowercase());
            if forward_confidence >= backward_confidence {
                Some(f.to_string())
            } else {
                Some(b.to_string())
            }
        }
    }
}

/// Merges both passes position by position.
pub fn merge_passes(
    originals: &[&str],
    forward: &[Option<String>],
    backward: &[Option<String>],
) -> Vec<Option<String>> {
    originals
        .iter()
        .zip(forward.iter().zip(backward))
        .map(|(original, (f, b))| merge_token(original, f.as_deref(), b.as_deref()))
        .collect()
}
