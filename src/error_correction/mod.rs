//! # OCR Text Correction Module
//!
//! Repairs raw recognized Bengali and Latin text in four stages, reporting
//! progress before each one:
//!
//! 1. Glyph normalization (NFC, nukta and khanda ta forms, zero-width marks,
//!    ligatures, pipe-for-danda)
//! 2. Contextual scoring with a two-sided window
//! 3. Independent left-context and right-context passes over the result of
//!    step 2, merged token by token
//! 4. Document-wide spelling consistency
//!
//! Correction never fails: a token without an acceptable candidate is kept
//! as written, and everything between word cores (whitespace, punctuation,
//! line breaks) is copied through unchanged.

pub mod consistency;
pub mod contextual;
pub mod merge;
pub mod normalize;
pub mod profile;
pub mod similarity;
pub mod tokens;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use consistency::enforce_consistency;
pub use contextual::{ContextScorer, CorrectionCandidate, PassDirection};
pub use merge::{correction_confidence, merge_passes};
pub use normalize::{normalize_text, normalize_word};
pub use profile::{DocumentProfile, ProfileTables, UnknownProfileError};
pub use similarity::{levenshtein_distance, similarity};
pub use tokens::{splice, tokenize, Token};

use crate::observability::record_correction_metrics;

/// Configuration for OCR text correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Document type whose lexicon and misread table are used
    pub profile: DocumentProfile,
    /// Maximum edit distance for lexicon candidates (1-3 recommended)
    pub max_edit_distance: usize,
    /// Minimum similarity for a non-table correction (0.0-1.0)
    pub min_correction_confidence: f64,
    /// Context tokens considered on each side
    pub context_window: usize,
    /// Whether to run the contextual pass, the one-sided passes and merge
    pub enable_contextual_correction: bool,
    /// Whether to unify spelling variants across the document
    pub enable_consistency: bool,
    /// Run the forward and backward passes concurrently
    pub parallel: bool,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            profile: DocumentProfile::General,
            max_edit_distance: 2,
            min_correction_confidence: 0.6,
            context_window: 5,
            enable_contextual_correction: true,
            enable_consistency: true,
            parallel: true,
        }
    }
}

/// The four correction stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStage {
    Normalize,
    Contextual,
    Merge,
    Consistency,
}

impl CorrectionStage {
    pub const ALL: [CorrectionStage; 4] = [
        CorrectionStage::Normalize,
        CorrectionStage::Contextual,
        CorrectionStage::Merge,
        CorrectionStage::Consistency,
    ];

    /// Human-readable label passed to the progress callback.
    pub fn label(self) -> &'static str {
        match self {
            CorrectionStage::Normalize => "Normalizing glyphs",
            CorrectionStage::Contextual => "Scoring candidates in context",
            CorrectionStage::Merge => "Merging forward and backward passes",
            CorrectionStage::Consistency => "Enforcing document consistency",
        }
    }

    /// Short name used as a metric label.
    pub fn name(self) -> &'static str {
        match self {
            CorrectionStage::Normalize => "normalize",
            CorrectionStage::Contextual => "contextual",
            CorrectionStage::Merge => "merge",
            CorrectionStage::Consistency => "consistency",
        }
    }
}

/// One word-level rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
    pub stage: CorrectionStage,
}

/// What happened during one correction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    /// Glyph rewrites made by normalization
    pub normalized_glyphs: usize,
    /// Tokens changed by the two-sided contextual pass
    pub contextual_changes: usize,
    /// Tokens the forward pass would change
    pub forward_changes: usize,
    /// Tokens the backward pass would change
    pub backward_changes: usize,
    /// Tokens changed after merging
    pub merged_changes: usize,
    /// Tokens rewritten to a more frequent spelling
    pub consistency_changes: usize,
    /// Word-level rewrites in the order they were applied
    pub replacements: Vec<Replacement>,
    pub processing_time_ms: u32,
}

impl CorrectionReport {
    /// Glyph and word changes actually applied to the text.
    pub fn total_changes(&self) -> usize {
        self.normalized_glyphs
            + self.contextual_changes
            + self.merged_changes
            + self.consistency_changes
    }
}

/// Main text correction engine
#[derive(Debug, Clone)]
pub struct TextCorrector {
    config: CorrectionConfig,
    tables: &'static ProfileTables,
}

impl Default for TextCorrector {
    fn default() -> Self {
        Self::new(CorrectionConfig::default())
    }
}

impl TextCorrector {
    pub fn new(config: CorrectionConfig) -> Self {
        let tables = config.profile.tables();
        Self { config, tables }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Corrects `text` and returns only the corrected string.
    ///
    /// # Examples
    ///
    /// ```
    /// use docnorm::error_correction::TextCorrector;
    ///
    /// let corrector = TextCorrector::default();
    /// assert_eq!(corrector.correct("Tlie report arid the page."), "The report and the page.");
    /// ```
    pub fn correct(&self, text: &str) -> String {
        self.correct_with_progress(text, |_| {}).0
    }

    /// Corrects `text` and returns a [`CorrectionReport`] alongside it.
    pub fn correct_with_report(&self, text: &str) -> (String, CorrectionReport) {
        self.correct_with_progress(text, |_| {})
    }

    /// Corrects `text`, calling `progress` with each stage's label before the
    /// stage runs, four times per call. Disabled stages still report and
    /// leave the text as it is.
    pub fn correct_with_progress<F>(&self, text: &str, mut progress: F) -> (String, CorrectionReport)
    where
        F: FnMut(&str),
    {
        let start_time = Instant::now();
        let mut report = CorrectionReport::default();

        progress(CorrectionStage::Normalize.label());
        let (normalized, glyph_changes) = normalize_text(text);
        report.normalized_glyphs = glyph_changes;
        record_correction_metrics(CorrectionStage::Normalize.name(), glyph_changes);

        progress(CorrectionStage::Contextual.label());
        let tokens = tokenize(&normalized);
        let contextual = if self.config.enable_contextual_correction {
            self.scorer().run_pass(&tokens, PassDirection::Both)
        } else {
            vec![None; tokens.len()]
        };
        report
            .replacements
            .extend(replacements(&tokens, &contextual, CorrectionStage::Contextual));
        report.contextual_changes = contextual.iter().flatten().count();
        record_correction_metrics(CorrectionStage::Contextual.name(), report.contextual_changes);
        let contextual_text = splice(&normalized, &tokens, &contextual);

        progress(CorrectionStage::Merge.label());
        let tokens = tokenize(&contextual_text);
        let (forward, backward) = if self.config.enable_contextual_correction {
            self.run_passes(&tokens)
        } else {
            (vec![None; tokens.len()], vec![None; tokens.len()])
        };
        report.forward_changes = forward.iter().flatten().count();
        report.backward_changes = backward.iter().flatten().count();

        let originals: Vec<&str> = tokens.iter().map(|token| token.core.as_str()).collect();
        let merged = merge_passes(&originals, &forward, &backward);
        report
            .replacements
            .extend(replacements(&tokens, &merged, CorrectionStage::Merge));
        report.merged_changes = merged.iter().flatten().count();
        record_correction_metrics(CorrectionStage::Merge.name(), report.merged_changes);
        let merged_text = splice(&contextual_text, &tokens, &merged);

        progress(CorrectionStage::Consistency.label());
        let corrected = if self.config.enable_consistency {
            let (unified, changes) = enforce_consistency(&merged_text, self.tables);
            report.consistency_changes = changes.len();
            report
                .replacements
                .extend(changes.into_iter().map(|(from, to)| Replacement {
                    from,
                    to,
                    stage: CorrectionStage::Consistency,
                }));
            unified
        } else {
            merged_text
        };
        record_correction_metrics(
            CorrectionStage::Consistency.name(),
            report.consistency_changes,
        );

        let processing_time = start_time.elapsed();
        report.processing_time_ms = processing_time.as_millis() as u32;

        debug!(
            target: "text_correction",
            "Text correction completed in {:.2}ms: profile={}, tokens={}, glyphs={}, contextual={}, forward={}, backward={}, merged={}, consistency={}",
            processing_time.as_millis(),
            self.config.profile,
            tokens.len(),
            report.normalized_glyphs,
            report.contextual_changes,
            report.forward_changes,
            report.backward_changes,
            report.merged_changes,
            report.consistency_changes
        );

        (corrected, report)
    }

    fn scorer(&self) -> ContextScorer<'static> {
        ContextScorer {
            tables: self.tables,
            max_edit_distance: self.config.max_edit_distance,
            min_confidence: self.config.min_correction_confidence,
            window: self.config.context_window,
        }
    }

    /// Forward and backward passes over the same token sequence. Each reads
    /// only that sequence and writes its own output.
    fn run_passes(&self, tokens: &[Token]) -> (Vec<Option<String>>, Vec<Option<String>>) {
        let scorer = self.scorer();
        if self.config.parallel {
            rayon::join(
                || scorer.run_pass(tokens, PassDirection::Forward),
                || scorer.run_pass(tokens, PassDirection::Backward),
            )
        } else {
            (
                scorer.run_pass(tokens, PassDirection::Forward),
                scorer.run_pass(tokens, PassDirection::Backward),
            )
        }
    }
}

fn replacements(
    tokens: &[Token],
    changes: &[Option<String>],
    stage: CorrectionStage,
) -> Vec<Replacement> {
    tokens
        .iter()
        .zip(changes)
        .filter_map(|(token, change)| {
            change.as_ref().map(|word| Replacement {
                from: token.core.clone(),
                to: word.clone(),
                stage,
            })
        })
        .collect()
}
