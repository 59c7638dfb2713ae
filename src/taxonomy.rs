//! Technique taxonomy mapping.
//!
//! Expert annotators and model prompts use different label vocabularies
//! for the same propaganda techniques (the expert guideline says
//! `simplification` where a model emits `causalOversimplification`). A
//! [`CategoryMapper`] translates labels from either vocabulary into
//! canonical category keys so matching treats synonyms as equal.
//!
//! The mapper is always injected into the matcher — taxonomies evolve, so
//! nothing downstream hardcodes the table. [`CategoryMapper::propaganda`]
//! ships the current production table; [`default_mapper`] exposes it as a
//! shared static.

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

use crate::span::LabeledSpan;

static DEFAULT_MAPPER: Lazy<CategoryMapper> = Lazy::new(CategoryMapper::propaganda);

/// The shared default technique table.
#[must_use]
pub fn default_mapper() -> &'static CategoryMapper {
    &DEFAULT_MAPPER
}

/// Maps technique labels from any vocabulary to canonical category keys.
///
/// The table is many-to-many: one label may belong to several categories
/// (an expert's `emotionalExpression` covers both loaded language and
/// exaggeration). Labels without an entry fall back to their own
/// lowercased form, so unknown-but-identical labels still match each
/// other. Lookups are case-insensitive.
///
/// # Example
///
/// ```rust
/// use propeval::CategoryMapper;
///
/// let mut mapper = CategoryMapper::new();
/// mapper.add("simplification", "simplification");
/// mapper.add("causalOversimplification", "simplification");
///
/// assert!(mapper.compatible("simplification", "causalOversimplification"));
/// assert!(!mapper.compatible("simplification", "doubt"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CategoryMapper {
    mappings: HashMap<String, BTreeSet<String>>,
}

impl CategoryMapper {
    /// Create an empty mapper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `label` as belonging to `category`.
    ///
    /// May be called repeatedly with the same label to build a
    /// many-to-many table.
    pub fn add(&mut self, label: impl AsRef<str>, category: impl Into<String>) {
        self.mappings
            .entry(label.as_ref().to_lowercase())
            .or_default()
            .insert(category.into());
    }

    /// Canonical categories for a label.
    ///
    /// Unmapped labels yield their own lowercased form as a singleton set.
    #[must_use]
    pub fn canonical(&self, label: &str) -> BTreeSet<String> {
        let key = label.to_lowercase();
        match self.mappings.get(&key) {
            Some(categories) => categories.clone(),
            None => BTreeSet::from([key]),
        }
    }

    /// Whether two labels share at least one canonical category.
    #[must_use]
    pub fn compatible(&self, a: &str, b: &str) -> bool {
        let ca = self.canonical(a);
        let cb = self.canonical(b);
        ca.intersection(&cb).next().is_some()
    }

    /// Whether two spans carry at least one compatible label pair.
    #[must_use]
    pub fn compatible_spans(&self, a: &LabeledSpan, b: &LabeledSpan) -> bool {
        a.labels
            .iter()
            .any(|la| b.labels.iter().any(|lb| self.compatible(la, lb)))
    }

    /// Number of labels with explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the table has no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// The production propaganda-technique table.
    ///
    /// Left column: expert guideline labels. Right column: the camelCase
    /// labels the model prompts request. Both sides resolve to the same
    /// canonical keys.
    #[must_use]
    pub fn propaganda() -> Self {
        let mut mapper = Self::new();

        // Expert guideline vocabulary.
        mapper.add("emotionalExpression", "loaded_language");
        mapper.add("emotionalExpression", "exaggeration");
        mapper.add("labelling", "name_calling");
        mapper.add("simplification", "simplification");
        mapper.add("demonizing", "demonization");
        mapper.add("demonizing", "name_calling");
        mapper.add("fearmongering", "fear_appeal");
        mapper.add("relativizing", "relativization");
        mapper.add("relativizing", "whataboutism");
        mapper.add("argumentation", "authority");
        mapper.add("opinion", "doubt");
        mapper.add("location", "flag_waving");

        // Model prompt vocabulary.
        mapper.add("loadedLanguage", "loaded_language");
        mapper.add("nameCalling", "name_calling");
        mapper.add("causalOversimplification", "simplification");
        mapper.add("blackAndWhiteFallacy", "simplification");
        mapper.add("appealToFear", "fear_appeal");
        mapper.add("exaggeration", "exaggeration");
        mapper.add("minimisation", "relativization");
        mapper.add("whataboutism", "whataboutism");
        mapper.add("appealToAuthority", "authority");
        mapper.add("doubt", "doubt");
        mapper.add("flagWaving", "flag_waving");
        mapper.add("slogans", "slogans");
        mapper.add("repetition", "repetition");
        mapper.add("bandwagon", "bandwagon");
        mapper.add("thoughtTerminatingCliche", "cliche");
        mapper.add("strawMan", "relativization");

        mapper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::LabeledSpan;

    #[test]
    fn test_synonyms_across_vocabularies() {
        let mapper = CategoryMapper::propaganda();

        assert!(mapper.compatible("simplification", "causalOversimplification"));
        assert!(mapper.compatible("emotionalExpression", "loadedLanguage"));
        assert!(mapper.compatible("labelling", "nameCalling"));
        assert!(mapper.compatible("fearmongering", "appealToFear"));
    }

    #[test]
    fn test_unrelated_labels_incompatible() {
        let mapper = CategoryMapper::propaganda();

        assert!(!mapper.compatible("slogans", "doubt"));
        assert!(!mapper.compatible("repetition", "appealToFear"));
    }

    #[test]
    fn test_unknown_labels_fall_back_to_lowercase() {
        let mapper = CategoryMapper::propaganda();

        assert_eq!(
            mapper.canonical("BrandNewTechnique"),
            BTreeSet::from(["brandnewtechnique".to_string()])
        );
        // Identical unknown labels still match each other.
        assert!(mapper.compatible("brandNewTechnique", "BRANDNEWTECHNIQUE"));
        assert!(!mapper.compatible("brandNewTechnique", "otherTechnique"));
    }

    #[test]
    fn test_many_to_many_membership() {
        let mapper = CategoryMapper::propaganda();

        // emotionalExpression belongs to two categories, so it matches
        // both loadedLanguage and exaggeration.
        assert!(mapper.compatible("emotionalExpression", "loadedLanguage"));
        assert!(mapper.compatible("emotionalExpression", "exaggeration"));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mapper = CategoryMapper::propaganda();
        assert!(mapper.compatible("LOADEDLANGUAGE", "emotionalexpression"));
    }

    #[test]
    fn test_compatible_spans() {
        let mapper = CategoryMapper::propaganda();

        let expert =
            LabeledSpan::new(0, 10, "x", vec!["simplification".into(), "opinion".into()]).unwrap();
        let model_hit =
            LabeledSpan::new(5, 15, "y", vec!["causalOversimplification".into()]).unwrap();
        let model_miss = LabeledSpan::new(5, 15, "y", vec!["slogans".into()]).unwrap();

        assert!(mapper.compatible_spans(&expert, &model_hit));
        assert!(!mapper.compatible_spans(&expert, &model_miss));
    }

    #[test]
    fn test_injected_custom_table() {
        let mut mapper = CategoryMapper::new();
        mapper.add("a", "cat1");
        mapper.add("b", "cat1");
        mapper.add("c", "cat2");

        assert!(mapper.compatible("a", "b"));
        assert!(!mapper.compatible("a", "c"));
        assert_eq!(mapper.len(), 3);
    }
}
