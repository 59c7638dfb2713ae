//! # propeval
//!
//! Span-level scoring of LLM propaganda-technique annotations against
//! expert ground truth.
//!
//! Texts are annotated twice: once by expert annotators (ground truth)
//! and once per LLM (Claude, GPT, Gemini, ...). This crate compares the
//! two sets of labeled character spans and derives the numbers a review
//! dashboard runs on — confusion counts, precision/recall/F1, Cohen's
//! kappa, a position-accuracy agreement score, and per-job and global
//! rollups.
//!
//! ## Pipeline
//!
//! | Stage | Module | What it does |
//! |-------|--------|--------------|
//! | Normalize | [`normalize`] | Sniff and parse the stored JSON shapes into [`AnnotationSet`]s |
//! | Map labels | [`taxonomy`] | Translate both label vocabularies to canonical categories |
//! | Match | [`matching`] | Pair expert and model regions, classify TP/FP/FN |
//! | Agree | [`agreement`] | Position accuracy and Cohen's kappa |
//! | Score | [`metrics`] | Fold one (text, model) comparison into a [`ComparisonMetric`] |
//! | Roll up | [`stats`] | Per-job and global aggregates |
//!
//! ## Quick start
//!
//! ```rust
//! use propeval::{score_text, CategoryMapper, ModelAnalysis};
//! use serde_json::json;
//!
//! let expert = json!([{"result": [
//!     {"type": "labels", "value": {"start": 0, "end": 12, "text": "pure hysteria", "labels": ["emotionalExpression"]}},
//! ]}]);
//!
//! let analysis = ModelAnalysis::new(1, 42, "claude", json!({"annotations": [
//!     {"type": "labels", "value": {"start": 0, "end": 12, "text": "pure hysteria", "labels": ["loadedLanguage"]}},
//! ]}), 850, chrono::Utc::now());
//!
//! let metric = score_text(&expert, &analysis, &CategoryMapper::propaganda()).unwrap();
//! assert_eq!(metric.true_positives, 1);
//! assert!((metric.f1_score - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Design
//!
//! - **Pure**: the engine owns no state and does no I/O; every entry
//!   point is a function of its inputs. Safe to call concurrently.
//! - **Never throws on bad data**: malformed payloads become empty
//!   annotation sets; every ratio is division-guarded; one bad record
//!   never poisons a batch.
//! - **Failure exclusion**: analyses flagged failed — structured status
//!   or legacy error string — contribute to no aggregate.
//! - **Injected taxonomy**: the synonym table is a value passed to the
//!   matcher, never a global, so vocabularies can evolve and tests can
//!   swap their own.

#![warn(missing_docs)]

mod error;
pub mod agreement;
pub mod matching;
pub mod metrics;
pub mod normalize;
pub mod span;
pub mod stats;
pub mod taxonomy;

pub use agreement::{cohens_kappa, kappa_interpretation, position_accuracy, BinaryConfusion};
pub use error::{Error, Result};
pub use matching::{match_regions, RegionMatch};
pub use metrics::{
    f1_score, safe_ratio, score_text, AnalysisStatus, ComparisonMetric, ModelAnalysis,
};
pub use normalize::{
    detect_model_shape, expert_annotation_set, legacy_error, legacy_execution_time_ms,
    model_annotation_set, ModelPayloadShape,
};
pub use span::{AnnotationSet, LabeledSpan};
pub use stats::{
    aggregate_all, aggregate_job, global_statistics, global_statistics_now, DailyCount,
    ModelPerformance, StatisticsSummary, TechniqueCount,
};
pub use taxonomy::{default_mapper, CategoryMapper};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use propeval::prelude::*;
    //!
    //! let mapper = CategoryMapper::propaganda();
    //! assert!(mapper.compatible("labelling", "nameCalling"));
    //! ```
    pub use crate::agreement::{cohens_kappa, position_accuracy, BinaryConfusion};
    pub use crate::error::{Error, Result};
    pub use crate::matching::{match_regions, RegionMatch};
    pub use crate::metrics::{score_text, AnalysisStatus, ComparisonMetric, ModelAnalysis};
    pub use crate::normalize::{expert_annotation_set, model_annotation_set};
    pub use crate::span::{AnnotationSet, LabeledSpan};
    pub use crate::stats::{aggregate_job, global_statistics, ModelPerformance, StatisticsSummary};
    pub use crate::taxonomy::CategoryMapper;
}
