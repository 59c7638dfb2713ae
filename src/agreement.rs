//! Agreement scores: position accuracy and Cohen's kappa.
//!
//! Position accuracy is an inter-annotator-agreement style overlap ratio
//! between two annotation sets for the same text. Cohen's kappa measures
//! chance-corrected agreement on the binary "does this text contain
//! propaganda" decision, aggregated across texts.

use serde::{Deserialize, Serialize};

use crate::span::AnnotationSet;

/// Character-overlap agreement between two annotation sets.
///
/// `intersection / min(total expert length, total model length)`, where
/// the intersection is summed over ALL span pairs. Overlapping regions hit
/// by several pairs are counted per pair, not per character — normalizing
/// on the smaller total keeps a model that over-detects from being
/// penalized below what it got right.
///
/// Both sets empty is vacuous perfect agreement (1.0); exactly one empty
/// set scores 0.0.
#[must_use]
pub fn position_accuracy(expert: &AnnotationSet, model: &AnnotationSet) -> f64 {
    if expert.is_empty() && model.is_empty() {
        return 1.0;
    }
    if expert.is_empty() || model.is_empty() {
        return 0.0;
    }

    let intersection: usize = expert
        .iter()
        .map(|e| model.iter().map(|m| e.intersection_len(m)).sum::<usize>())
        .sum();

    let floor = expert.total_len().min(model.total_len());
    if floor == 0 {
        return 0.0;
    }

    intersection as f64 / floor as f64
}

/// Binary confusion matrix for the text-level propaganda decision.
///
/// "Positive" means the source produced at least one annotation for the
/// text. Independent of span-level counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryConfusion {
    /// Both expert and model flagged the text.
    pub true_positives: usize,
    /// Model flagged a text the expert left clean.
    pub false_positives: usize,
    /// Neither flagged the text.
    pub true_negatives: usize,
    /// Expert flagged a text the model left clean.
    pub false_negatives: usize,
}

impl BinaryConfusion {
    /// Create an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one text-level observation.
    pub fn record(&mut self, expert_positive: bool, model_positive: bool) {
        match (expert_positive, model_positive) {
            (true, true) => self.true_positives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_negatives += 1,
        }
    }

    /// Total observations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// Fraction of observations where both sources agreed.
    #[must_use]
    pub fn observed_agreement(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f64 / total as f64
    }

    /// Agreement expected from the marginal distributions alone.
    #[must_use]
    pub fn expected_agreement(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        let expert_pos = (self.true_positives + self.false_negatives) as f64 / n;
        let model_pos = (self.true_positives + self.false_positives) as f64 / n;
        expert_pos * model_pos + (1.0 - expert_pos) * (1.0 - model_pos)
    }

    /// Merge counts from another matrix.
    pub fn merge(&mut self, other: &BinaryConfusion) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.true_negatives += other.true_negatives;
        self.false_negatives += other.false_negatives;
    }
}

/// Cohen's kappa from a binary confusion matrix.
///
/// `(po - pe) / (1 - pe)`. An empty matrix, or one where expected
/// agreement is already 1, scores 0.0 — never NaN.
#[must_use]
pub fn cohens_kappa(confusion: &BinaryConfusion) -> f64 {
    if confusion.total() == 0 {
        return 0.0;
    }
    let po = confusion.observed_agreement();
    let pe = confusion.expected_agreement();
    if (1.0 - pe).abs() < f64::EPSILON {
        return 0.0;
    }
    (po - pe) / (1.0 - pe)
}

/// Landis-Koch banding for a kappa score.
#[must_use]
pub fn kappa_interpretation(kappa: f64) -> &'static str {
    if kappa < 0.0 {
        "Poor"
    } else if kappa < 0.20 {
        "Slight"
    } else if kappa < 0.40 {
        "Fair"
    } else if kappa < 0.60 {
        "Moderate"
    } else if kappa < 0.80 {
        "Substantial"
    } else {
        "Almost perfect"
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::span::{AnnotationSet, LabeledSpan};
    use proptest::prelude::*;

    fn arb_disjoint_set() -> impl Strategy<Value = AnnotationSet> {
        // Gapped spans so the pair-sum stays within [0,1] bounds.
        prop::collection::vec((0usize..20, 1usize..30), 0..6).prop_map(|raw| {
            let mut spans = Vec::new();
            let mut cursor = 0usize;
            for (gap, len) in raw {
                let start = cursor + gap;
                spans.push(LabeledSpan::new(start, start + len, "t", vec!["l".into()]).unwrap());
                cursor = start + len;
            }
            AnnotationSet::from_spans(spans)
        })
    }

    proptest! {
        #[test]
        fn bounded_for_disjoint_sets(expert in arb_disjoint_set(), model in arb_disjoint_set()) {
            let acc = position_accuracy(&expert, &model);
            prop_assert!(acc >= 0.0);
            prop_assert!(acc <= 1.0 + 1e-9);
        }

        #[test]
        fn symmetric(expert in arb_disjoint_set(), model in arb_disjoint_set()) {
            let a = position_accuracy(&expert, &model);
            let b = position_accuracy(&model, &expert);
            prop_assert!((a - b).abs() < 1e-12);
        }

        #[test]
        fn kappa_bounded(
            tp in 0usize..50, fp in 0usize..50,
            tn in 0usize..50, fn_count in 0usize..50,
        ) {
            let c = BinaryConfusion {
                true_positives: tp,
                false_positives: fp,
                true_negatives: tn,
                false_negatives: fn_count,
            };
            let k = cohens_kappa(&c);
            prop_assert!(k <= 1.0 + 1e-9);
            prop_assert!(k >= -1.0 - 1e-9);
            prop_assert!(k.is_finite());
        }
    }
}
