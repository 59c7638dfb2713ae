//! Property tests over the full scoring pipeline.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use propeval::{score_text, CategoryMapper, ModelAnalysis};
use serde_json::{json, Value};

const LABELS: &[&str] = &[
    "doubt",
    "slogans",
    "loadedLanguage",
    "emotionalExpression",
    "appealToFear",
    "fearmongering",
];

fn arb_spans() -> impl Strategy<Value = Vec<(u64, u64, &'static str)>> {
    prop::collection::vec(
        ((0u64..400, 1u64..80), prop::sample::select(LABELS)),
        0..8,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|((start, len), label)| (start, start + len, label))
            .collect()
    })
}

fn expert_payload(spans: &[(u64, u64, &str)]) -> Value {
    let entries: Vec<Value> = spans
        .iter()
        .map(|(start, end, label)| {
            json!({"type": "labels", "value": {
                "start": start, "end": end, "text": "t", "labels": [label],
            }})
        })
        .collect();
    json!([{"result": entries}])
}

fn model_payload(spans: &[(u64, u64, &str)]) -> Value {
    let entries: Vec<Value> = spans
        .iter()
        .map(|(start, end, label)| {
            json!({"type": "labels", "value": {
                "start": start, "end": end, "text": "t", "labels": [label],
            }})
        })
        .collect();
    json!({"annotations": entries})
}

fn analysis(payload: Value) -> ModelAnalysis {
    ModelAnalysis::new(
        1,
        1,
        "claude",
        payload,
        100,
        Utc.with_ymd_and_hms(2025, 5, 5, 5, 0, 0).unwrap(),
    )
}

proptest! {
    #[test]
    fn ratio_metrics_always_in_unit_interval(e in arb_spans(), m in arb_spans()) {
        let metric = score_text(
            &expert_payload(&e),
            &analysis(model_payload(&m)),
            &CategoryMapper::propaganda(),
        ).unwrap();

        for value in [metric.precision, metric.recall, metric.f1_score] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        prop_assert!(metric.position_accuracy >= 0.0);
        prop_assert!(metric.position_accuracy.is_finite());
    }

    #[test]
    fn counts_partition_the_expert_set(e in arb_spans(), m in arb_spans()) {
        let metric = score_text(
            &expert_payload(&e),
            &analysis(model_payload(&m)),
            &CategoryMapper::propaganda(),
        ).unwrap();

        prop_assert_eq!(metric.true_positives + metric.false_negatives, e.len());
    }

    #[test]
    fn empty_model_set_never_charges_false_positives(e in arb_spans()) {
        let metric = score_text(
            &expert_payload(&e),
            &analysis(model_payload(&[])),
            &CategoryMapper::propaganda(),
        ).unwrap();

        prop_assert_eq!(metric.false_positives, 0);
        prop_assert_eq!(metric.false_negatives, e.len());
    }

    #[test]
    fn empty_expert_set_marks_every_model_span_excess(m in arb_spans()) {
        let metric = score_text(
            &expert_payload(&[]),
            &analysis(model_payload(&m)),
            &CategoryMapper::propaganda(),
        ).unwrap();

        prop_assert_eq!(metric.false_positives, m.len());
        prop_assert_eq!(metric.true_positives, 0);
    }

    #[test]
    fn scoring_is_deterministic(e in arb_spans(), m in arb_spans()) {
        let mapper = CategoryMapper::propaganda();
        let e_payload = expert_payload(&e);
        let a = analysis(model_payload(&m));

        let first = score_text(&e_payload, &a, &mapper).unwrap();
        let second = score_text(&e_payload, &a, &mapper).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn identity_comparison_is_perfect(e in arb_spans()) {
        prop_assume!(!e.is_empty());

        let metric = score_text(
            &expert_payload(&e),
            &analysis(model_payload(&e)),
            &CategoryMapper::propaganda(),
        ).unwrap();

        prop_assert_eq!(metric.true_positives, e.len());
        prop_assert_eq!(metric.false_negatives, 0);
        prop_assert!((metric.recall - 1.0).abs() < 1e-12);
    }
}
