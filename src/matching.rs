//! Region matching between expert and model annotation sets.
//!
//! The matcher pairs expert spans with label-compatible, overlapping model
//! spans and classifies everything into true positives, false negatives,
//! and false positives. Two deliberate policies shape the counts:
//!
//! - **Coverage**: one large model span satisfies every expert span it
//!   overlaps. A detection spanning two adjacent expert regions is not a
//!   recall failure.
//! - **Over-segmentation penalty**: when several model spans pile onto one
//!   expert span, only one of them earns the match; each extra span is
//!   charged as a false positive.
//!
//! Any non-zero character overlap qualifies; containment is just a special
//! case of overlap.

use serde::{Deserialize, Serialize};

use crate::span::AnnotationSet;
use crate::taxonomy::CategoryMapper;

/// Result of matching one expert annotation set against one model set.
///
/// Index vectors refer into the input sets. Every expert index lands in
/// exactly one of `matched_expert` / `unmatched_expert`; every model index
/// is either used by at least one match or listed in `excess_model`.
/// `false_positives` also includes the over-segmentation charge, so it can
/// exceed `excess_model.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMatch {
    /// Expert span indices satisfied by at least one model span (TP).
    pub matched_expert: Vec<usize>,
    /// Expert span indices no model span reached (FN).
    pub unmatched_expert: Vec<usize>,
    /// Model span indices that overlap no compatible expert span.
    pub excess_model: Vec<usize>,
    /// True positive count (`matched_expert.len()`).
    pub true_positives: usize,
    /// False positives: unused model spans plus over-segmentation extras.
    pub false_positives: usize,
    /// False negative count (`unmatched_expert.len()`).
    pub false_negatives: usize,
}

/// Match expert regions against model regions.
///
/// For each expert span, the set of model spans that are label-compatible
/// (per `mapper`) and overlap it is computed exhaustively; span order in
/// the inputs does not influence the outcome.
///
/// Empty inputs degrade cleanly: both empty gives all-zero counts; an
/// empty expert set makes every model span a false positive; an empty
/// model set makes every expert span a false negative.
#[must_use]
pub fn match_regions(
    expert: &AnnotationSet,
    model: &AnnotationSet,
    mapper: &CategoryMapper,
) -> RegionMatch {
    let mut used_model = vec![false; model.len()];
    let mut matched_expert = Vec::new();
    let mut unmatched_expert = Vec::new();
    let mut oversegmentation = 0usize;

    for (ei, e) in expert.iter().enumerate() {
        let mut hits = 0usize;
        for (mi, m) in model.iter().enumerate() {
            if e.overlaps(m) && mapper.compatible_spans(e, m) {
                used_model[mi] = true;
                hits += 1;
            }
        }

        if hits > 0 {
            matched_expert.push(ei);
            // One model span earns the match; the rest split a region the
            // expert annotated once.
            oversegmentation += hits - 1;
        } else {
            unmatched_expert.push(ei);
        }
    }

    let excess_model: Vec<usize> = used_model
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(mi, _)| mi)
        .collect();

    let true_positives = matched_expert.len();
    let false_negatives = unmatched_expert.len();
    let false_positives = excess_model.len() + oversegmentation;

    RegionMatch {
        matched_expert,
        unmatched_expert,
        excess_model,
        true_positives,
        false_positives,
        false_negatives,
    }
}
