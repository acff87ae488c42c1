//! String similarity used by every correction stage.
//!
//! `similarity = min(1, edit + 0.3 * phonetic_overlap)` where `edit` is the
//! normalized Levenshtein similarity over characters and `phonetic_overlap`
//! is the positional share of characters that are equal or belong to the
//! same articulatory group. Identical strings score exactly 1.0; distinct
//! strings are capped half an edit short of it, so they always score below 1.0.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Weight of the phonetic overlap term.
pub const PHONETIC_WEIGHT: f64 = 0.3;

/// Closed table of sound-alike classes. Each string is one group.
const PHONETIC_GROUPS: &[&str] = &[
    // Bengali consonants by place of articulation
    "কখগঘঙ",                    // velar
    "চছজঝঞয\u{09DF}",            // palatal
    "টঠডঢণ",                    // retroflex
    "তথদধনৎ",                   // dental
    "পফবভম",                    // labial
    "শষসহ",                     // sibilant and aspirate
    "রল\u{09DC}\u{09DD}",        // liquid and flap
    // Bengali independent vowels
    "অআ",
    "ইঈ",
    "উঊ",
    "এঐ",
    "ওঔ",
    // Bengali vowel signs
    "\u{09BE}",                 // aa
    "\u{09BF}\u{09C0}",         // i, ii
    "\u{09C1}\u{09C2}",         // u, uu
    "\u{09C7}\u{09C8}",         // e, ai
    "\u{09CB}\u{09CC}",         // o, au
    "\u{0982}\u{0981}\u{0983}", // anusvara, candrabindu, visarga
    // Latin
    "bp",
    "ckq",
    "dt",
    "fvw",
    "gj",
    "mn",
    "sxz",
    "ae",
    "iy",
    "ou",
    "lr",
];

lazy_static! {
    static ref GROUP_OF: HashMap<char, usize> = {
        let mut map = HashMap::new();
        for (group, members) in PHONETIC_GROUPS.iter().enumerate() {
            for c in members.chars() {
                map.insert(c, group);
                for upper in c.to_uppercase() {
                    map.entry(upper).or_insert(group);
                }
            }
        }
        map
    };
}

/// Phonetic group of a character, if it belongs to one.
pub fn phonetic_group(c: char) -> Option<usize> {
    GROUP_OF.get(&c).copied()
}

/// Whether two characters are equal or sound alike.
pub fn sounds_alike(a: char, b: char) -> bool {
    a == b
        || matches!((phonetic_group(a), phonetic_group(b)), (Some(x), Some(y)) if x == y)
}

/// Levenshtein distance counted in characters.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let mut previous: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut current = vec![0; s2_chars.len() + 1];

    for (i, &c1) in s1_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, &c2) in s2_chars.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2_chars.len()]
}

/// Positional share of sound-alike characters, over the longer length.
pub fn phonetic_overlap(s1: &str, s2: &str) -> f64 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let matching = s1
        .chars()
        .zip(s2.chars())
        .filter(|&(a, b)| sounds_alike(a, b))
        .count();
    matching as f64 / max_len as f64
}

/// Combined similarity in `0.0..=1.0`, reaching 1.0 only for identical
/// strings.
///
/// # Examples
///
/// ```
/// use docnorm::error_correction::similarity;
///
/// assert_eq!(similarity("কখগ", "কখগ"), 1.0);
/// assert!(similarity("কখগ", "কখগা") > 0.85);
/// assert!(similarity("widget", "widgel") < 1.0);
/// assert!(similarity("paper", "zebra") < 0.6);
/// ```
pub fn similarity(s1: &str, s2: &str) -> f64 {
    if s1 == s2 {
        return 1.0;
    }
    let max_len = s1.chars().count().max(s2.chars().count());
    let edit = 1.0 - levenshtein_distance(s1, s2) as f64 / max_len as f64;
    (edit + phonetic_overlap(s1, s2) * PHONETIC_WEIGHT).min(distinct_ceiling(max_len))
}

/// Highest score for two different strings whose longer one has `max_len`
/// characters: the edit similarity of half an edit.
fn distinct_ceiling(max_len: usize) -> f64 {
    1.0 - 0.5 / max_len as f64
}
