//! Whitespace tokenization with byte spans, so corrected words can be spliced
//! back into the source without disturbing whitespace or punctuation.

use std::ops::Range;

/// Characters that end a sentence when they close a token.
pub const SENTENCE_TERMINATORS: &[char] = &['।', '॥', '.', '?', '!'];

/// A contiguous run of non-whitespace characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Position in the document's token sequence
    pub index: usize,
    /// Sentence the token belongs to
    pub sentence: usize,
    /// Byte range of the whole token in the source text
    pub span: Range<usize>,
    /// Byte range of the word core (token minus leading/trailing punctuation)
    pub core_span: Range<usize>,
    /// The word core as written
    pub core: String,
}

impl Token {
    /// Lookup key: the core, lowercased.
    pub fn key(&self) -> String {
        self.core.to_lowercase()
    }

    pub fn has_core(&self) -> bool {
        !self.core.is_empty()
    }
}

/// Letters, digits, and anything in the Bengali block (vowel signs, virama
/// and nukta are not alphabetic in Unicode but belong to the word).
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || ('\u{0980}'..='\u{09FF}').contains(&c)
}

/// Splits `text` into tokens and assigns sentence numbers.
///
/// A token whose last character is a sentence terminator closes its
/// sentence; the next token starts a new one.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut sentence = 0;
    let mut start: Option<usize> = None;

    let push_token = |tokens: &mut Vec<Token>, begin: usize, end: usize, sentence: &mut usize| {
        let raw = &text[begin..end];
        let core_start = raw
            .char_indices()
            .find(|&(_, c)| is_word_char(c))
            .map(|(i, _)| i);
        let core_span = match core_start {
            Some(first) => {
                let last = raw
                    .char_indices()
                    .rev()
                    .find(|&(_, c)| is_word_char(c))
                    .map(|(i, c)| i + c.len_utf8())
                    .unwrap_or(raw.len());
                begin + first..begin + last
            }
            None => begin..begin,
        };

        tokens.push(Token {
            index: tokens.len(),
            sentence: *sentence,
            span: begin..end,
            core: text[core_span.clone()].to_string(),
            core_span,
        });

        if raw.ends_with(SENTENCE_TERMINATORS) {
            *sentence += 1;
        }
    };

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(begin)) => {
                push_token(&mut tokens, begin, i, &mut sentence);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(begin) = start {
        push_token(&mut tokens, begin, text.len(), &mut sentence);
    }

    tokens
}

/// Rebuilds `text` with the cores of some tokens replaced.
///
/// `replacements[i]` applies to `tokens[i]`; everything outside replaced
/// cores is copied byte for byte.
pub fn splice(text: &str, tokens: &[Token], replacements: &[Option<String>]) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for (token, replacement) in tokens.iter().zip(replacements) {
        if let Some(word) = replacement {
            output.push_str(&text[cursor..token.core_span.start]);
            output.push_str(word);
            cursor = token.core_span.end;
        }
    }
    output.push_str(&text[cursor..]);
    output
}

/// Applies the capitalization of `original` to `replacement`: a capitalized
/// original yields a capitalized replacement.
pub fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
