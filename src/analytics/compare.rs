//! Comparison Engine
//!
//! Period-over-period percentage deltas. Each compared metric has a fixed
//! polarity; the displayed delta is sign-adjusted so a positive value always
//! means the metric improved.

use indexmap::IndexMap;
use serde::Serialize;

use super::metrics::QueryMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparedMetric {
    ClickThroughRate,
    TotalSearches,
    AvgLatency,
    ZeroResultCount,
}

impl ComparedMetric {
    pub const ALL: [ComparedMetric; 4] = [
        ComparedMetric::ClickThroughRate,
        ComparedMetric::TotalSearches,
        ComparedMetric::AvgLatency,
        ComparedMetric::ZeroResultCount,
    ];

    pub fn polarity(self) -> Polarity {
        match self {
            ComparedMetric::ClickThroughRate | ComparedMetric::TotalSearches => {
                Polarity::HigherIsBetter
            }
            ComparedMetric::AvgLatency | ComparedMetric::ZeroResultCount => {
                Polarity::LowerIsBetter
            }
        }
    }

    pub fn value(self, metrics: &QueryMetrics) -> f64 {
        match self {
            ComparedMetric::ClickThroughRate => metrics.click_through_rate,
            ComparedMetric::TotalSearches => metrics.total_searches as f64,
            ComparedMetric::AvgLatency => metrics.avg_latency,
            ComparedMetric::ZeroResultCount => metrics.zero_result_searches as f64,
        }
    }
}

/// Signed percentage change from `prior` to `current`
///
/// A zero baseline yields 0 when nothing changed and 100 otherwise.
pub fn percent_change(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        100.0 * (current - prior) / prior
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDelta {
    pub current: f64,
    pub prior: f64,
    /// Unadjusted `percent_change(current, prior)`
    pub raw_change: f64,
    /// Positive means improved
    pub delta: f64,
    pub lower_is_better: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    #[serde(flatten)]
    pub deltas: IndexMap<ComparedMetric, MetricDelta>,
}

impl ComparisonResult {
    pub fn get(&self, metric: ComparedMetric) -> Option<&MetricDelta> {
        self.deltas.get(&metric)
    }
}

pub fn compare(current: &QueryMetrics, prior: &QueryMetrics) -> ComparisonResult {
    let deltas = ComparedMetric::ALL
        .iter()
        .map(|&metric| {
            let c = metric.value(current);
            let p = metric.value(prior);
            let raw_change = percent_change(c, p);
            let lower_is_better = metric.polarity() == Polarity::LowerIsBetter;

            // 0.0 - x rather than -x keeps "no change" from printing as -0
            let delta = if lower_is_better {
                0.0 - raw_change
            } else {
                raw_change
            };

            (
                metric,
                MetricDelta {
                    current: c,
                    prior: p,
                    raw_change,
                    delta,
                    lower_is_better,
                },
            )
        })
        .collect();

    ComparisonResult { deltas }
}
