//! Per-text comparison metrics.
//!
//! [`score_text`] is the engine's central entry point: it takes the raw
//! expert payload and one model's analysis record, normalizes both,
//! matches regions, and folds the result into a [`ComparisonMetric`]. It
//! is a pure function — identical inputs produce bit-identical output —
//! and it never fails: malformed payloads degrade to empty sets, and
//! failed analyses are excluded (`None`) rather than scored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agreement::position_accuracy;
use crate::matching::match_regions;
use crate::normalize::{expert_annotation_set, legacy_error, model_annotation_set};
use crate::span::AnnotationSet;
use crate::taxonomy::CategoryMapper;

/// Upstream status of one model analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Model call finished and produced annotations.
    Completed,
    /// Model call failed; no scorable output.
    Failed,
    /// Model call has not finished yet.
    Pending,
}

/// One model's analysis of one text, as recorded by the caller.
///
/// Carries everything the engine needs to score or exclude the record:
/// the raw annotation payload, the structured status, and the timing. The
/// legacy error-string form (a non-empty `<model>_error` field inside the
/// payload) is detected uniformly with the structured status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAnalysis {
    /// Job this analysis belongs to.
    pub job_id: u64,
    /// Text this analysis covers.
    pub text_id: u64,
    /// Model key, e.g. `"claude"`, `"gpt"`, `"gemini"`.
    pub model: String,
    /// Raw annotation payload as stored.
    pub annotations: Value,
    /// Structured status.
    pub status: AnalysisStatus,
    /// Structured error message, if the caller recorded one.
    pub error: Option<String>,
    /// Wall-clock duration of the model call.
    pub execution_time_ms: u64,
    /// When the analysis finished.
    pub completed_at: DateTime<Utc>,
}

impl ModelAnalysis {
    /// Create a completed analysis record.
    #[must_use]
    pub fn new(
        job_id: u64,
        text_id: u64,
        model: impl Into<String>,
        annotations: Value,
        execution_time_ms: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            text_id,
            model: model.into(),
            annotations,
            status: AnalysisStatus::Completed,
            error: None,
            execution_time_ms,
            completed_at,
        }
    }

    /// Mark this analysis failed with an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.status = AnalysisStatus::Failed;
        self.error = Some(error.into());
        self
    }

    /// Whether this analysis failed, in either encoding.
    ///
    /// Detects the structured `Failed` status, a recorded error message,
    /// and the legacy `<model>_error` string embedded in the payload.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        if self.status == AnalysisStatus::Failed {
            return true;
        }
        if self.error.as_deref().is_some_and(|e| !e.trim().is_empty()) {
            return true;
        }
        legacy_error(&self.annotations, &self.model).is_some()
    }

    /// Whether this analysis contributes to metrics.
    #[must_use]
    pub fn is_scorable(&self) -> bool {
        self.status == AnalysisStatus::Completed && !self.is_failed()
    }

    /// The model's annotation set, normalized from the raw payload.
    #[must_use]
    pub fn annotation_set(&self) -> AnnotationSet {
        model_annotation_set(&self.annotations, &self.model)
    }
}

/// Span-level comparison result for one (job, text, model) triple.
///
/// Append-only fact: created once per successful analysis, never mutated,
/// never created for a failed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetric {
    /// Job this metric belongs to.
    pub job_id: u64,
    /// Text this metric covers.
    pub text_id: u64,
    /// Model that produced the annotations.
    pub model: String,
    /// Expert spans satisfied by the model.
    pub true_positives: usize,
    /// Model spans charged as excess or over-segmentation.
    pub false_positives: usize,
    /// Expert spans the model missed.
    pub false_negatives: usize,
    /// `TP / (TP + FP)`, 0 when undefined.
    pub precision: f64,
    /// `TP / (TP + FN)`, 0 when undefined.
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0 when undefined.
    pub f1_score: f64,
    /// Character-overlap agreement, see [`position_accuracy`].
    pub position_accuracy: f64,
    /// Duration of the underlying model call.
    pub execution_time_ms: u64,
}

impl ComparisonMetric {
    /// Whether the expert annotated anything in this text.
    #[must_use]
    pub fn expert_flagged(&self) -> bool {
        self.true_positives + self.false_negatives > 0
    }

    /// Whether the model annotated anything in this text.
    ///
    /// A non-empty model set always surfaces as at least one TP or FP.
    #[must_use]
    pub fn model_flagged(&self) -> bool {
        self.true_positives > 0 || self.false_positives > 0
    }
}

/// `numerator / denominator`, 0.0 when the denominator is 0.
#[must_use]
pub fn safe_ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Harmonic mean of precision and recall, 0.0 when both are 0.
#[must_use]
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Score one model analysis against the expert ground truth.
///
/// Returns `None` when the analysis is failed or pending — excluded
/// records contribute to no aggregate. Never errors: unparseable payloads
/// on either side degrade to empty annotation sets, which is a valid
/// comparison state.
#[must_use]
pub fn score_text(
    expert_payload: &Value,
    analysis: &ModelAnalysis,
    mapper: &CategoryMapper,
) -> Option<ComparisonMetric> {
    if !analysis.is_scorable() {
        return None;
    }

    let expert = expert_annotation_set(expert_payload);
    let model = analysis.annotation_set();

    let regions = match_regions(&expert, &model, mapper);
    let precision = safe_ratio(
        regions.true_positives,
        regions.true_positives + regions.false_positives,
    );
    let recall = safe_ratio(
        regions.true_positives,
        regions.true_positives + regions.false_negatives,
    );

    Some(ComparisonMetric {
        job_id: analysis.job_id,
        text_id: analysis.text_id,
        model: analysis.model.clone(),
        true_positives: regions.true_positives,
        false_positives: regions.false_positives,
        false_negatives: regions.false_negatives,
        precision,
        recall,
        f1_score: f1_score(precision, recall),
        position_accuracy: position_accuracy(&expert, &model),
        execution_time_ms: analysis.execution_time_ms,
    })
}
