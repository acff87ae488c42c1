//! Context-weighted candidate scoring. The same scorer runs with a
//! two-sided window and with left-only and right-only windows.

use super::profile::ProfileTables;
use super::similarity::{levenshtein_distance, similarity};
use super::tokens::{match_case, Token};

/// Score bonus for a hit in the profile's misread table.
pub const TABLE_HIT_BONUS: f64 = 1.0;
/// Decay of a context word's influence per token of distance.
pub const DISTANCE_DECAY: f64 = 0.5;
/// Tokens shorter than this are never corrected.
pub const MIN_TOKEN_CHARS: usize = 2;
/// Characters per allowed lexicon edit: tokens of up to five characters get
/// no lexicon candidates, six to ten get one edit, and so on.
pub const CHARS_PER_EDIT: usize = 5;
/// How far a replacement must outscore keeping the token as written.
pub const REPLACE_MARGIN: f64 = 0.1;

/// Which side of a token supplies its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDirection {
    /// Both sides, `window` tokens each
    Both,
    /// Left context only
    Forward,
    /// Right context only
    Backward,
}

/// A possible replacement for one token.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionCandidate {
    pub text: String,
    pub score: f64,
    /// Similarity between the token and the candidate alone
    pub base_similarity: f64,
    /// Whether the candidate came from the misread table
    pub from_table: bool,
}

/// Scores candidates for unknown tokens against their sentence context.
#[derive(Debug, Clone, Copy)]
pub struct ContextScorer<'a> {
    pub tables: &'a ProfileTables,
    pub max_edit_distance: usize,
    /// Minimum base similarity for a lexicon correction, and the prior of
    /// keeping an unknown token as written
    pub min_confidence: f64,
    pub window: usize,
}

impl ContextScorer<'_> {
    /// Runs one pass over a token sequence.
    ///
    /// Returns one entry per token: `Some(word)` when the pass would replace
    /// the token's core, `None` otherwise. Every token is scored against the
    /// sequence as given, never against this pass's own replacements.
    pub fn run_pass(&self, tokens: &[Token], direction: PassDirection) -> Vec<Option<String>> {
        let keys: Vec<String> = tokens.iter().map(Token::key).collect();
        (0..tokens.len())
            .map(|i| self.correct_token(tokens, &keys, i, direction))
            .collect()
    }

    fn correct_token(
        &self,
        tokens: &[Token],
        keys: &[String],
        index: usize,
        direction: PassDirection,
    ) -> Option<String> {
        let key = &keys[index];
        if !self.is_correctable(key) {
            return None;
        }

        let context = self.context(tokens, keys, index, direction);
        let keep = self.keep_candidate(key, &context);
        let best = self
            .candidates(key)
            .into_iter()
            .map(|mut candidate| {
                candidate.score += context_score(key, &candidate.text, &context);
                candidate
            })
            .fold(None::<CorrectionCandidate>, |best, candidate| match best {
                Some(current) if current.score >= candidate.score => Some(current),
                _ => Some(candidate),
            })?;

        let confident = best.from_table || best.base_similarity >= self.min_confidence;
        if confident && best.score >= keep.score + REPLACE_MARGIN {
            tracing::trace!(
                target: "text_correction",
                "{:?} pass: '{}' -> '{}' (score={:.3}, keep={:.3}, base={:.3}, table={})",
                direction,
                tokens[index].core,
                best.text,
                best.score,
                keep.score,
                best.base_similarity,
                best.from_table
            );
            Some(match_case(&tokens[index].core, &best.text))
        } else {
            None
        }
    }

    fn is_correctable(&self, key: &str) -> bool {
        key.chars().count() >= MIN_TOKEN_CHARS
            && !key.chars().all(|c| c.is_numeric())
            && !self.tables.is_known(key)
    }

    /// The token itself, scored against the same context as its candidates.
    pub fn keep_candidate(&self, key: &str, context: &[(&str, usize)]) -> CorrectionCandidate {
        CorrectionCandidate {
            text: key.to_string(),
            score: self.min_confidence + context_score(key, key, context),
            base_similarity: 1.0,
            from_table: false,
        }
    }

    /// Lexicon edits allowed for a token of `chars` characters.
    pub fn edit_budget(&self, chars: usize) -> usize {
        (chars.saturating_sub(1) / CHARS_PER_EDIT).min(self.max_edit_distance)
    }

    /// Context words with their token distance, same sentence only.
    fn context<'k>(
        &self,
        tokens: &[Token],
        keys: &'k [String],
        index: usize,
        direction: PassDirection,
    ) -> Vec<(&'k str, usize)> {
        let sentence = tokens[index].sentence;
        let left = index.saturating_sub(self.window)..index;
        let right = index + 1..(index + 1 + self.window).min(tokens.len());
        let range: Vec<usize> = match direction {
            PassDirection::Both => left.chain(right).collect(),
            PassDirection::Forward => left.collect(),
            PassDirection::Backward => right.collect(),
        };
        range
            .into_iter()
            .filter(|&j| tokens[j].sentence == sentence && tokens[j].has_core())
            .map(|j| (keys[j].as_str(), index.abs_diff(j)))
            .collect()
    }

    /// Misread-table hit first, then lexicon words within the token's edit
    /// budget, in sorted order.
    pub fn candidates(&self, key: &str) -> Vec<CorrectionCandidate> {
        let mut candidates = Vec::new();
        let table_hit = self.tables.corrections.get(key);

        if let Some(target) = table_hit {
            candidates.push(CorrectionCandidate {
                text: target.clone(),
                score: similarity(key, target) + TABLE_HIT_BONUS,
                base_similarity: similarity(key, target),
                from_table: true,
            });
        }

        let budget = self.edit_budget(key.chars().count());
        if budget == 0 {
            return candidates;
        }
        for word in &self.tables.lexicon {
            if word == key || Some(word) == table_hit {
                continue;
            }
            if levenshtein_distance(key, word) <= budget {
                let base = similarity(key, word);
                candidates.push(CorrectionCandidate {
                    text: word.clone(),
                    score: base,
                    base_similarity: base,
                    from_table: false,
                });
            }
        }

        candidates
    }
}

/// `Σ similarity(token, c) · exp(-0.5·|d|) · similarity(candidate, c)`.
fn context_score(token: &str, candidate: &str, context: &[(&str, usize)]) -> f64 {
    context
        .iter()
        .map(|&(word, distance)| {
            let weight = similarity(token, word) * (-DISTANCE_DECAY * distance as f64).exp();
            weight * similarity(candidate, word)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_correction::profile::DocumentProfile;
    use crate::error_correction::tokens::tokenize;
    use std::collections::{BTreeSet, HashMap};

    fn scorer() -> ContextScorer<'static> {
        ContextScorer {
            tables: DocumentProfile::General.tables(),
            max_edit_distance: 2,
            min_confidence: 0.6,
            window: 5,
        }
    }

    #[test]
    fn test_table_hit_is_accepted() {
        let tokens = tokenize("tlie page");
        let forward = scorer().run_pass(&tokens, PassDirection::Forward);
        assert_eq!(forward, vec![Some("the".to_string()), None]);
    }

    #[test]
    fn test_capitalization_is_kept() {
        let tokens = tokenize("Tlie report");
        let backward = scorer().run_pass(&tokens, PassDirection::Backward);
        assert_eq!(backward[0].as_deref(), Some("The"));
    }

    #[test]
    fn test_known_words_have_no_candidates() {
        let tokens = tokenize("the report is on the page.");
        let forward = scorer().run_pass(&tokens, PassDirection::Forward);
        assert!(forward.iter().all(Option::is_none));
    }

    #[test]
    fn test_lexicon_neighbor_corrects_misspelling() {
        let tokens = tokenize("documnt");
        let forward = scorer().run_pass(&tokens, PassDirection::Forward);
        assert_eq!(forward[0].as_deref(), Some("document"));
    }

    #[test]
    fn test_short_unknown_words_have_no_lexicon_candidates() {
        let scorer = scorer();
        assert_eq!(scorer.edit_budget(3), 0);
        assert_eq!(scorer.edit_budget(5), 0);
        assert_eq!(scorer.edit_budget(6), 1);
        assert_eq!(scorer.edit_budget(11), 2);
        assert_eq!(scorer.edit_budget(40), 2);

        // "can", "at", "may", "with" and "a" are all one or two edits away
        let tokens = tokenize("The cat sat on the mat. Dhaka is a city. ab");
        for direction in [PassDirection::Both, PassDirection::Forward, PassDirection::Backward] {
            let changes = scorer.run_pass(&tokens, direction);
            assert!(changes.iter().all(Option::is_none), "{:?}: {:?}", direction, changes);
        }
    }

    #[test]
    fn test_keep_candidate_scores_its_own_context() {
        let scorer = scorer();
        let lone = scorer.keep_candidate("widgel", &[]);
        assert_eq!(lone.score, scorer.min_confidence);
        assert_eq!(lone.text, "widgel");

        let repeated = scorer.keep_candidate("widgel", &[("widgel", 1)]);
        let expected = scorer.min_confidence + (-DISTANCE_DECAY).exp();
        assert!((repeated.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_two_sided_context_decides_close_call() {
        // "widget" on one side leaves the replacement short of the margin;
        // on both sides it clears it.
        let tables = ProfileTables {
            lexicon: BTreeSet::from(["widget".to_string()]),
            corrections: HashMap::new(),
        };
        let scorer = ContextScorer {
            tables: &tables,
            max_edit_distance: 2,
            min_confidence: 0.87,
            window: 5,
        };
        let tokens = tokenize("widget widgel widget");

        let forward = scorer.run_pass(&tokens, PassDirection::Forward);
        let backward = scorer.run_pass(&tokens, PassDirection::Backward);
        let both = scorer.run_pass(&tokens, PassDirection::Both);

        assert_eq!(forward[1], None);
        assert_eq!(backward[1], None);
        assert_eq!(both[1].as_deref(), Some("widget"));
    }

    #[test]
    fn test_two_sided_context_spans_both_neighbors() {
        let tokens = tokenize("a b c d e f g h");
        let keys: Vec<String> = tokens.iter().map(Token::key).collect();
        let mut narrow = scorer();
        narrow.window = 2;
        let both = narrow.context(&tokens, &keys, 3, PassDirection::Both);
        assert_eq!(both, vec![("b", 2), ("c", 1), ("e", 1), ("f", 2)]);

        let tokens = tokenize("one two. three four");
        let keys: Vec<String> = tokens.iter().map(Token::key).collect();
        let both = narrow.context(&tokens, &keys, 1, PassDirection::Both);
        assert_eq!(both, vec![("one", 1)]);
    }

    #[test]
    fn test_far_token_left_alone() {
        let tokens = tokenize("xqzvbn");
        let forward = scorer().run_pass(&tokens, PassDirection::Forward);
        assert_eq!(forward[0], None);
    }

    #[test]
    fn test_numbers_and_single_letters_skipped() {
        let tokens = tokenize("2024 ১২৩ x");
        let forward = scorer().run_pass(&tokens, PassDirection::Forward);
        assert!(forward.iter().all(Option::is_none));
    }

    #[test]
    fn test_context_stays_inside_sentence() {
        let tokens = tokenize("one. two three");
        let keys: Vec<String> = tokens.iter().map(Token::key).collect();
        let forward = scorer().context(&tokens, &keys, 1, PassDirection::Forward);
        assert!(forward.is_empty());
    }

    #[test]
    fn test_context_window_and_distances() {
        let tokens = tokenize("a b c d e f g h");
        let keys: Vec<String> = tokens.iter().map(Token::key).collect();
        let mut narrow = scorer();
        narrow.window = 2;
        let backward = narrow.context(&tokens, &keys, 3, PassDirection::Backward);
        assert_eq!(backward, vec![("e", 1), ("f", 2)]);
        let forward = narrow.context(&tokens, &keys, 3, PassDirection::Forward);
        assert_eq!(forward, vec![("b", 2), ("c", 1)]);
    }

    #[test]
    fn test_context_score_decays_with_distance() {
        let near = context_score("documnt", "document", &[("document", 1)]);
        let far = context_score("documnt", "document", &[("document", 4)]);
        assert!(near > far);
        assert!(far > 0.0);
    }
}
