//! Labeled span and annotation-set types.
//!
//! A [`LabeledSpan`] is one annotated region of a text: a half-open
//! character range `[start, end)` with the surface text and one or more
//! technique labels. An [`AnnotationSet`] is the ordered collection of
//! spans one source (the expert, or one model) produced for one text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Error, Result};

/// A single annotated region of a text.
///
/// Invariants (enforced at construction): `end > start`, `text` non-empty,
/// `labels` non-empty. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSpan {
    /// Start position (inclusive char offset).
    pub start: usize,
    /// End position (exclusive char offset).
    pub end: usize,
    /// Annotated surface text.
    pub text: String,
    /// Technique labels attached to this region.
    pub labels: Vec<String>,
}

impl LabeledSpan {
    /// Create a new span, validating the invariants.
    ///
    /// # Errors
    /// Returns `Error::InvalidSpan` if `end <= start`, `text` is empty,
    /// or `labels` is empty.
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        labels: Vec<String>,
    ) -> Result<Self> {
        let text = text.into();
        if end <= start {
            return Err(Error::invalid_span(format!(
                "end ({end}) must be greater than start ({start})"
            )));
        }
        if text.is_empty() {
            return Err(Error::invalid_span("text must not be empty"));
        }
        if labels.is_empty() {
            return Err(Error::invalid_span("labels must not be empty"));
        }
        Ok(Self {
            start,
            end,
            text,
            labels,
        })
    }

    /// Length of the annotated range in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false: valid spans have `end > start`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether two spans share at least one character.
    #[must_use]
    pub fn overlaps(&self, other: &LabeledSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Number of characters shared by two spans.
    #[must_use]
    pub fn intersection_len(&self, other: &LabeledSpan) -> usize {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        hi.saturating_sub(lo)
    }
}

/// Ordered sequence of [`LabeledSpan`] for one text and one source.
///
/// Built fresh per comparison from a raw annotation payload; never stored.
/// Span order follows the source payload — matching is order-independent,
/// so no re-sorting happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSet(Vec<LabeledSpan>);

impl AnnotationSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from already-validated spans.
    #[must_use]
    pub fn from_spans(spans: Vec<LabeledSpan>) -> Self {
        Self(spans)
    }

    /// Number of spans in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the spans in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, LabeledSpan> {
        self.0.iter()
    }

    /// Borrow the spans as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[LabeledSpan] {
        &self.0
    }

    /// Span at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LabeledSpan> {
        self.0.get(index)
    }

    /// Sum of span lengths across the set.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.0.iter().map(LabeledSpan::len).sum()
    }

    /// Count label occurrences across all spans.
    #[must_use]
    pub fn label_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for span in &self.0 {
            for label in &span.labels {
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a LabeledSpan;
    type IntoIter = std::slice::Iter<'a, LabeledSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<LabeledSpan>> for AnnotationSet {
    fn from(spans: Vec<LabeledSpan>) -> Self {
        Self(spans)
    }
}
