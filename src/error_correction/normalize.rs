//! Glyph canonicalization applied before any word-level correction.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Ordered `(canonical, variants)` pairs. At each position the first entry
/// with a matching variant wins, so multi-character sequences that share a
/// prefix with a later entry must come first.
///
/// The nukta letters are listed as their decomposed forms because NFC
/// decomposes the precomposed code points; this table recomposes them.
pub const GLYPH_TABLE: &[(&str, &[&str])] = &[
    ("\u{09DC}", &["\u{09A1}\u{09BC}"]),         // ড়
    ("\u{09DD}", &["\u{09A2}\u{09BC}"]),         // ঢ়
    ("\u{09DF}", &["\u{09AF}\u{09BC}"]),         // য়
    ("\u{09CE}", &["\u{09A4}\u{09CD}\u{200D}"]), // khanda ta
    ("", &["\u{200B}", "\u{200C}", "\u{200D}", "\u{2060}", "\u{FEFF}"]),
    ("ffi", &["\u{FB03}"]),
    ("ffl", &["\u{FB04}"]),
    ("ff", &["\u{FB00}"]),
    ("fi", &["\u{FB01}"]),
    ("fl", &["\u{FB02}"]),
    (" ", &["\u{00A0}", "\u{202F}"]),
];

/// Precomposed letters that NFC decomposes and the glyph table composes
/// again. Passing through that round trip unchanged is not a rewrite.
const NFC_EXCLUDED: &[char] = &['\u{09DC}', '\u{09DD}', '\u{09DF}'];

lazy_static! {
    /// ASCII pipe read in place of a danda after a Bengali character.
    static ref PIPE_AS_DANDA: Regex =
        Regex::new(r"([\x{0980}-\x{09FF}])\|").expect("Invalid danda regex pattern");
}

/// NFC, then the glyph table in a single left-to-right pass, then danda
/// repair. Returns the normalized text and the number of rewrites that
/// changed the input; clean text always reports zero.
///
/// # Examples
///
/// ```
/// use docnorm::error_correction::normalize_text;
///
/// let (text, changes) = normalize_text("\u{FB01}le\u{00A0}আমি|");
/// assert_eq!(text, "file আমি।");
/// assert_eq!(changes, 3);
/// ```
pub fn normalize_text(text: &str) -> (String, usize) {
    let composed: String = text.nfc().collect();
    let (canonical, rewrites) = canonicalize_glyphs(&composed);
    let round_trips = text.chars().filter(|c| NFC_EXCLUDED.contains(c)).count();
    let glyph_changes = rewrites.saturating_sub(round_trips);

    let danda_changes = PIPE_AS_DANDA.find_iter(&canonical).count();
    let repaired = if danda_changes > 0 {
        PIPE_AS_DANDA.replace_all(&canonical, "${1}।").into_owned()
    } else {
        canonical
    };

    (repaired, glyph_changes + danda_changes)
}

/// Normalization for dictionary entries: NFC plus the glyph table, so words
/// written in either form compare equal to normalized document text.
pub fn normalize_word(word: &str) -> String {
    let composed: String = word.nfc().collect();
    canonicalize_glyphs(&composed).0
}

fn canonicalize_glyphs(text: &str) -> (String, usize) {
    let mut output = String::with_capacity(text.len());
    let mut changes = 0;
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        for (canonical, variants) in GLYPH_TABLE {
            for variant in variants.iter() {
                if let Some(after) = rest.strip_prefix(variant) {
                    output.push_str(canonical);
                    changes += 1;
                    rest = after;
                    continue 'scan;
                }
            }
        }
        output.push(c);
        rest = &rest[c.len_utf8()..];
    }

    (output, changes)
}
