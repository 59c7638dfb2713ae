//! Annotation payload normalization.
//!
//! The surrounding system stores annotations as JSON blobs in several
//! historical shapes. Everything shape-specific lives here: payloads are
//! sniffed, parsed, and reduced to a uniform [`AnnotationSet`] before any
//! matching logic runs.
//!
//! Recognized shapes:
//!
//! | Shape | Layout |
//! |-------|--------|
//! | Expert rounds | `[{"result": [{"type": "labels", "value": {...}}, ...]}, ...]` |
//! | Structured model | `{"primaryChoice": {...}, "annotations": [{"type": "labels", "value": {...}}]}` |
//! | Legacy flat | `{"<model>_annotations": [...], "<model>_error": "...", "<model>_execution_time_ms": N}` |
//!
//! Malformed input never errors: unparseable payloads yield an empty set,
//! and invalid entries (empty text, empty labels, non-numeric or inverted
//! bounds) are discarded individually. "No annotations" is a valid state.

use serde_json::Value;

use crate::span::{AnnotationSet, LabeledSpan};

/// Detected layout of a model annotation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPayloadShape {
    /// `primaryChoice` / `annotations` wrapper.
    Structured,
    /// Per-provider flat fields (`<model>_annotations` etc.).
    LegacyFlat,
    /// Neither shape found.
    Unrecognized,
}

/// Sniff the layout of a model annotation payload.
#[must_use]
pub fn detect_model_shape(raw: &Value, model: &str) -> ModelPayloadShape {
    if raw.get("annotations").map_or(false, Value::is_array) {
        return ModelPayloadShape::Structured;
    }
    if raw.get(format!("{model}_annotations")).is_some() {
        return ModelPayloadShape::LegacyFlat;
    }
    ModelPayloadShape::Unrecognized
}

/// Parse expert ground-truth annotations into an [`AnnotationSet`].
///
/// The expert payload is an array of annotation rounds, each carrying a
/// `result` array of mixed entry types; only `"labels"` entries contribute
/// spans. Spans keep source order across rounds.
#[must_use]
pub fn expert_annotation_set(raw: &Value) -> AnnotationSet {
    let mut spans = Vec::new();

    let Some(rounds) = raw.as_array() else {
        log::warn!("expert payload is not an array of rounds; treating as empty");
        return AnnotationSet::new();
    };

    for round in rounds {
        let Some(entries) = round.get("result").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            if let Some(span) = span_from_entry(entry) {
                spans.push(span);
            }
        }
    }

    AnnotationSet::from_spans(spans)
}

/// Parse one model's annotations into an [`AnnotationSet`].
///
/// Dispatches on the sniffed payload shape; an unrecognized payload
/// yields an empty set.
#[must_use]
pub fn model_annotation_set(raw: &Value, model: &str) -> AnnotationSet {
    match detect_model_shape(raw, model) {
        ModelPayloadShape::Structured => structured_annotation_set(raw),
        ModelPayloadShape::LegacyFlat => legacy_annotation_set(raw, model),
        ModelPayloadShape::Unrecognized => {
            log::warn!("unrecognized model payload shape for {model}; treating as empty");
            AnnotationSet::new()
        }
    }
}

/// Error string from a legacy flat payload, if present and non-empty.
#[must_use]
pub fn legacy_error(raw: &Value, model: &str) -> Option<String> {
    raw.get(format!("{model}_error"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Execution time from a legacy flat payload, if present.
#[must_use]
pub fn legacy_execution_time_ms(raw: &Value, model: &str) -> Option<u64> {
    raw.get(format!("{model}_execution_time_ms"))
        .and_then(Value::as_u64)
}

fn structured_annotation_set(raw: &Value) -> AnnotationSet {
    let entries = raw
        .get("annotations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    AnnotationSet::from_spans(entries.iter().filter_map(span_from_entry).collect())
}

fn legacy_annotation_set(raw: &Value, model: &str) -> AnnotationSet {
    let field = raw.get(format!("{model}_annotations"));

    // Legacy columns sometimes hold the array JSON-encoded as a string.
    let decoded;
    let entries = match field {
        Some(Value::Array(entries)) => entries.as_slice(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(parsed)) => {
                decoded = parsed;
                decoded.as_slice()
            }
            _ => {
                log::warn!("legacy {model}_annotations string did not decode to an array");
                return AnnotationSet::new();
            }
        },
        _ => return AnnotationSet::new(),
    };

    AnnotationSet::from_spans(entries.iter().filter_map(span_from_entry).collect())
}

/// Parse one entry into a span.
///
/// Entries wrapped as `{"type": ..., "value": {...}}` contribute only when
/// `type == "labels"`; bare `{start, end, text, labels}` objects (seen in
/// legacy arrays) are parsed directly.
fn span_from_entry(entry: &Value) -> Option<LabeledSpan> {
    match entry.get("type") {
        Some(t) => {
            if t.as_str() != Some("labels") {
                return None;
            }
            span_from_value(entry.get("value")?)
        }
        None => span_from_value(entry),
    }
}

fn span_from_value(value: &Value) -> Option<LabeledSpan> {
    let start = offset_field(value, "start")?;
    let end = offset_field(value, "end")?;

    let text = value.get("text").and_then(Value::as_str).unwrap_or("");
    let labels: Vec<String> = value
        .get("labels")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    match LabeledSpan::new(start, end, text, labels) {
        Ok(span) => Some(span),
        Err(err) => {
            log::debug!("discarding annotation entry: {err}");
            None
        }
    }
}

/// Read a char offset that may arrive as an integer or a float.
fn offset_field(value: &Value, key: &str) -> Option<usize> {
    let v = value.get(key)?;
    if let Some(n) = v.as_u64() {
        return usize::try_from(n).ok();
    }
    // Loosely-typed sources emit offsets like 120.0.
    let f = v.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        return Some(f as usize);
    }
    None
}
