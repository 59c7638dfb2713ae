//! Aggregation across texts, jobs, and models.
//!
//! Everything here is purely additive over append-only facts: a rollup
//! can be recomputed at any time from the full set of comparison metrics
//! and analysis records, and repeated runs over the same snapshot give
//! identical results. Failed analyses contribute to nothing except the
//! failure counters — not to totals, not to confusion matrices, not to
//! execution-time averages.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agreement::{cohens_kappa, BinaryConfusion};
use crate::metrics::{ComparisonMetric, ModelAnalysis};

/// Days covered by the analysis-count time series.
const TIME_SERIES_DAYS: i64 = 30;

/// Entries kept in the top-technique ranking.
const TOP_TECHNIQUES_LIMIT: usize = 10;

/// Aggregated view of one model's results across a job or globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    /// Model key.
    pub model: String,
    /// Successful analyses contributing to the averages.
    pub total_analyses: usize,
    /// Analyses excluded as failed (either failure encoding).
    pub failed_analyses: usize,
    /// Mean span-level precision.
    pub avg_precision: f64,
    /// Mean span-level recall.
    pub avg_recall: f64,
    /// Mean span-level F1.
    pub avg_f1: f64,
    /// Mean position accuracy.
    pub avg_position_accuracy: f64,
    /// Text-level propaganda decision confusion matrix.
    pub confusion: BinaryConfusion,
    /// Cohen's kappa over the text-level decisions.
    pub cohens_kappa: f64,
    /// Mean execution time over successful analyses only.
    pub avg_execution_time_ms: f64,
    /// Successful share of all attempts, percent, one decimal.
    pub success_rate: f64,
    /// Detection counts per technique label.
    pub per_label: HashMap<String, usize>,
}

impl ModelPerformance {
    /// Format as a markdown table row.
    ///
    /// Columns: model, analyses, precision, recall, F1, position
    /// accuracy, kappa, average time.
    #[must_use]
    pub fn to_markdown_row(&self) -> String {
        format!(
            "| {} | {} | {:.1}% | {:.1}% | {:.1}% | {:.1}% | {:.3} | {:.0}ms |",
            self.model,
            self.total_analyses,
            self.avg_precision * 100.0,
            self.avg_recall * 100.0,
            self.avg_f1 * 100.0,
            self.avg_position_accuracy * 100.0,
            self.cohens_kappa,
            self.avg_execution_time_ms,
        )
    }
}

/// One technique and how often models detected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueCount {
    /// Technique label as produced by the models.
    pub technique: String,
    /// Number of spans carrying the label.
    pub count: usize,
}

/// Successful analysis count for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Bucket day (UTC).
    pub date: NaiveDate,
    /// Successful analyses completed that day.
    pub count: usize,
}

/// Global statistics across all jobs and models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    /// Successful analyses across all models.
    pub total_analyses: usize,
    /// Excluded failed analyses across all models.
    pub total_failed: usize,
    /// Per-model aggregates.
    pub models: HashMap<String, ModelPerformance>,
    /// Mean execution time per model, successful analyses only.
    pub avg_execution_time_ms: HashMap<String, f64>,
    /// Most frequently detected techniques, descending.
    pub top_techniques: Vec<TechniqueCount>,
    /// Trailing 30-day daily analysis counts, zero-filled.
    pub time_series: Vec<DailyCount>,
}

impl StatisticsSummary {
    /// Format the per-model table as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut rows: Vec<&ModelPerformance> = self.models.values().collect();
        rows.sort_by(|a, b| a.model.cmp(&b.model));

        let mut out = String::from(
            "| Model | Analyses | Precision | Recall | F1 | Position | Kappa | Avg time |\n\
             |-------|----------|-----------|--------|----|----------|-------|----------|\n",
        );
        for row in rows {
            out.push_str(&row.to_markdown_row());
            out.push('\n');
        }
        out
    }
}

/// Aggregate comparison metrics per model for one job.
///
/// `metrics` holds the per-text results (successful analyses only, by
/// construction); `analyses` supplies failure counts, per-label
/// detections, and the success rate. Both are filtered to `job_id` here.
#[must_use]
pub fn aggregate_job(
    metrics: &[ComparisonMetric],
    analyses: &[ModelAnalysis],
    job_id: u64,
) -> HashMap<String, ModelPerformance> {
    let job_metrics: Vec<&ComparisonMetric> =
        metrics.iter().filter(|m| m.job_id == job_id).collect();
    let job_analyses: Vec<&ModelAnalysis> =
        analyses.iter().filter(|a| a.job_id == job_id).collect();

    aggregate_models(&job_metrics, &job_analyses)
}

/// Aggregate comparison metrics per model across all jobs.
#[must_use]
pub fn aggregate_all(
    metrics: &[ComparisonMetric],
    analyses: &[ModelAnalysis],
) -> HashMap<String, ModelPerformance> {
    let all_metrics: Vec<&ComparisonMetric> = metrics.iter().collect();
    let all_analyses: Vec<&ModelAnalysis> = analyses.iter().collect();
    aggregate_models(&all_metrics, &all_analyses)
}

fn aggregate_models(
    metrics: &[&ComparisonMetric],
    analyses: &[&ModelAnalysis],
) -> HashMap<String, ModelPerformance> {
    let mut models: Vec<String> = metrics
        .iter()
        .map(|m| m.model.clone())
        .chain(analyses.iter().map(|a| a.model.clone()))
        .collect();
    models.sort();
    models.dedup();

    models
        .into_iter()
        .map(|model| {
            let perf = model_performance(&model, metrics, analyses);
            (model, perf)
        })
        .collect()
}

fn model_performance(
    model: &str,
    metrics: &[&ComparisonMetric],
    analyses: &[&ModelAnalysis],
) -> ModelPerformance {
    let own_metrics: Vec<&ComparisonMetric> =
        metrics.iter().filter(|m| m.model == model).copied().collect();
    let own_analyses: Vec<&ModelAnalysis> =
        analyses.iter().filter(|a| a.model == model).copied().collect();

    let failed_analyses = own_analyses.iter().filter(|a| a.is_failed()).count();
    let attempts = own_analyses.len();

    let mut confusion = BinaryConfusion::new();
    for metric in &own_metrics {
        confusion.record(metric.expert_flagged(), metric.model_flagged());
    }

    let mut per_label: HashMap<String, usize> = HashMap::new();
    for analysis in &own_analyses {
        if !analysis.is_scorable() {
            continue;
        }
        for (label, count) in analysis.annotation_set().label_counts() {
            *per_label.entry(label).or_insert(0) += count;
        }
    }

    ModelPerformance {
        model: model.to_string(),
        total_analyses: own_metrics.len(),
        failed_analyses,
        avg_precision: mean(own_metrics.iter().map(|m| m.precision)),
        avg_recall: mean(own_metrics.iter().map(|m| m.recall)),
        avg_f1: mean(own_metrics.iter().map(|m| m.f1_score)),
        avg_position_accuracy: mean(own_metrics.iter().map(|m| m.position_accuracy)),
        cohens_kappa: cohens_kappa(&confusion),
        confusion,
        avg_execution_time_ms: mean(own_metrics.iter().map(|m| m.execution_time_ms as f64)),
        success_rate: percent_1dp(attempts.saturating_sub(failed_analyses), attempts),
        per_label,
    }
}

/// Compute the global statistics snapshot.
///
/// `as_of` anchors the trailing time-series window; pass the current
/// instant for live dashboards or a fixed one for reproducible tests.
#[must_use]
pub fn global_statistics(
    metrics: &[ComparisonMetric],
    analyses: &[ModelAnalysis],
    as_of: DateTime<Utc>,
) -> StatisticsSummary {
    let models = aggregate_all(metrics, analyses);

    let total_analyses = models.values().map(|m| m.total_analyses).sum();
    let total_failed = models.values().map(|m| m.failed_analyses).sum();

    let avg_execution_time_ms = models
        .values()
        .map(|m| (m.model.clone(), m.avg_execution_time_ms))
        .collect();

    StatisticsSummary {
        total_analyses,
        total_failed,
        avg_execution_time_ms,
        top_techniques: top_techniques(&models),
        time_series: time_series(analyses, as_of),
        models,
    }
}

/// [`global_statistics`] anchored at the current instant.
#[must_use]
pub fn global_statistics_now(
    metrics: &[ComparisonMetric],
    analyses: &[ModelAnalysis],
) -> StatisticsSummary {
    global_statistics(metrics, analyses, Utc::now())
}

/// Rank technique labels by detection count, descending.
///
/// Ties break on the label so the ranking is deterministic.
fn top_techniques(models: &HashMap<String, ModelPerformance>) -> Vec<TechniqueCount> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for performance in models.values() {
        for (label, count) in &performance.per_label {
            *totals.entry(label).or_insert(0) += count;
        }
    }

    let mut ranked: Vec<TechniqueCount> = totals
        .into_iter()
        .map(|(technique, count)| TechniqueCount {
            technique: technique.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.technique.cmp(&b.technique)));
    ranked.truncate(TOP_TECHNIQUES_LIMIT);
    ranked
}

/// Daily successful-analysis counts for the trailing window, zero-filled.
fn time_series(analyses: &[ModelAnalysis], as_of: DateTime<Utc>) -> Vec<DailyCount> {
    let mut by_day: HashMap<NaiveDate, usize> = HashMap::new();
    for analysis in analyses {
        if analysis.is_scorable() {
            *by_day.entry(analysis.completed_at.date_naive()).or_insert(0) += 1;
        }
    }

    let last = as_of.date_naive();
    (0..TIME_SERIES_DAYS)
        .rev()
        .map(|back| {
            let date = last - Duration::days(back);
            DailyCount {
                date,
                count: by_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Percentage rounded to one decimal, 0.0 when the denominator is 0.
fn percent_1dp(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let pct = numerator as f64 / denominator as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
