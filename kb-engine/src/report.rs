//! Reporting aggregator: read-only views over the corpus snapshot and the
//! usage-aggregate store. Pure projections; nothing here is persisted.

use shared_types::{KbHealth, KbHealthReport, PerformanceRow, UsageAggregate};

use crate::actors::usage::round3;
use crate::classifier;

/// Corpus health: coverage and mean relevance. An empty store yields the
/// distinguished `NoData` result, never zeroed totals.
pub fn kb_health(total_articles: usize, aggregates: &[UsageAggregate]) -> KbHealth {
    if aggregates.is_empty() {
        return KbHealth::NoData {
            message: "No usage data yet".to_string(),
        };
    }

    let active = aggregates.len();
    let mean = aggregates.iter().map(|a| a.avg_score).sum::<f64>() / active as f64;

    KbHealth::Report(KbHealthReport {
        total_articles: total_articles as u64,
        actively_used_articles: active as u64,
        unused_articles: total_articles.saturating_sub(active) as u64,
        average_relevance_score: round3(mean),
        generated_at: chrono::Utc::now(),
    })
}

/// All aggregates sorted descending by `usage_count` (tie: ascending
/// `article_id`). Non-finite stored averages surface as an explicit null
/// rather than being dropped or serialized as NaN.
pub fn article_performance(aggregates: &[UsageAggregate]) -> Vec<PerformanceRow> {
    let mut rows: Vec<PerformanceRow> = aggregates
        .iter()
        .map(|a| PerformanceRow {
            article_id: a.article_id.clone(),
            usage_count: a.usage_count,
            avg_score: a.avg_score.is_finite().then_some(a.avg_score),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.usage_count
            .cmp(&a.usage_count)
            .then_with(|| a.article_id.cmp(&b.article_id))
    });
    rows
}

/// Aggregates repeatedly matched yet consistently scoring low.
pub fn content_gaps(aggregates: &[UsageAggregate]) -> Vec<UsageAggregate> {
    aggregates
        .iter()
        .filter(|a| classifier::is_content_gap(a))
        .cloned()
        .collect()
}
