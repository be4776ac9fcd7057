//! Metrics Aggregator
//!
//! Scalar and ranked metrics over the in-memory record set of one window.
//! Pure: no I/O, no clock, no shared state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::buckets::TemporalBuckets;
use crate::store::SearchEvent;

/// Maximum entries in a ranked query list
pub const TOP_K: usize = 10;

/// Click-through rate above which engagement counts as good
const GOOD_ENGAGEMENT_CTR: f64 = 50.0;

/// Click-through rate below which result relevance gets flagged
pub const LOW_CTR_THRESHOLD: f64 = 30.0;

/// Zero-result query entries tolerated before missing content gets flagged
pub const ZERO_RESULT_ENTRY_LIMIT: usize = 5;

/// How average latency treats records without a latency measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyAveraging {
    /// Divide by every record, counting absent latency as 0
    AllRecords,
    /// Divide only by records that reported a latency
    #[default]
    WithLatency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCount {
    pub filter: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    Good,
    NeedsImprovement,
}

/// Recommendation derived from a window's metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// Click-through rate is under [`LOW_CTR_THRESHOLD`]
    LowClickThrough { click_through_rate: f64 },
    /// More than [`ZERO_RESULT_ENTRY_LIMIT`] distinct queries found nothing
    HighZeroResults { top_query: String },
    PopularContent { query: String },
}

impl Insight {
    pub fn title(&self) -> &'static str {
        match self {
            Insight::LowClickThrough { .. } => "Low CTR detected",
            Insight::HighZeroResults { .. } => "High zero results",
            Insight::PopularContent { .. } => "Popular content",
        }
    }

    pub fn recommendation(&self) -> String {
        match self {
            Insight::LowClickThrough { click_through_rate } => format!(
                "Click-through rate is {:.1}%, below {}%. Consider improving result relevance or adding more engaging snippets.",
                click_through_rate, LOW_CTR_THRESHOLD
            ),
            Insight::HighZeroResults { top_query } => format!(
                "Many searches return no results. Consider adding content for: {:?}",
                top_query
            ),
            Insight::PopularContent { query } => format!(
                "{:?} is highly searched. Consider featuring this content prominently.",
                query
            ),
        }
    }
}

/// Scalar and ranked metrics for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetrics {
    pub total_searches: usize,
    /// Distinct queries, compared case-insensitively
    pub unique_queries: usize,
    pub avg_results_per_search: f64,
    /// Percentage in [0, 100]
    pub click_through_rate: f64,
    pub avg_latency: f64,
    /// Every search that returned nothing, not only the top-ranked ones
    pub zero_result_searches: usize,
    pub engagement: Engagement,
    pub top_queries: Vec<QueryCount>,
    pub zero_result_queries: Vec<QueryCount>,
    pub filter_usage: Vec<FilterCount>,
    pub insights: Vec<Insight>,
}

/// Complete computed result for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub metrics: QueryMetrics,
    #[serde(flatten)]
    pub trends: TemporalBuckets,
}

/// Computes [`QueryMetrics`] from a record set
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAggregator {
    latency: LatencyAveraging,
}

impl MetricsAggregator {
    pub fn new(latency: LatencyAveraging) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> LatencyAveraging {
        self.latency
    }

    pub fn aggregate(&self, events: &[SearchEvent]) -> QueryMetrics {
        let total = events.len();

        let result_sum: f64 = events.iter().map(|e| f64::from(e.result_count)).sum();
        let clicked = events.iter().filter(|e| e.was_clicked()).count();

        let query_counts = count_by(events.iter().map(SearchEvent::query_key));
        let unique_queries = query_counts.len();

        let zero_result_counts = count_by(
            events
                .iter()
                .filter(|e| e.result_count == 0)
                .map(SearchEvent::query_key),
        );
        let zero_result_searches = zero_result_counts.values().sum();

        let filter_usage = ranked(count_by(events.iter().map(|e| e.filter_type.clone())))
            .into_iter()
            .map(|(filter, count)| FilterCount { filter, count })
            .collect();

        let click_through_rate = 100.0 * ratio(clicked as f64, total);

        let mut metrics = QueryMetrics {
            total_searches: total,
            unique_queries,
            avg_results_per_search: ratio(result_sum, total),
            click_through_rate,
            avg_latency: self.average_latency(events),
            zero_result_searches,
            engagement: if click_through_rate > GOOD_ENGAGEMENT_CTR {
                Engagement::Good
            } else {
                Engagement::NeedsImprovement
            },
            top_queries: top_k(query_counts),
            zero_result_queries: top_k(zero_result_counts),
            filter_usage,
            insights: Vec::new(),
        };
        metrics.insights = insights(&metrics);
        metrics
    }

    fn average_latency(&self, events: &[SearchEvent]) -> f64 {
        let measured = events.iter().filter_map(|e| e.latency_ms);
        let sum: f64 = measured.clone().map(|ms| ms as f64).sum();

        let denominator = match self.latency {
            LatencyAveraging::AllRecords => events.len(),
            LatencyAveraging::WithLatency => measured.count(),
        };
        ratio(sum, denominator)
    }
}

/// Recommendations for a window, in display order. An empty window yields none.
pub fn insights(metrics: &QueryMetrics) -> Vec<Insight> {
    let mut insights = Vec::new();
    if metrics.total_searches == 0 {
        return insights;
    }

    if metrics.click_through_rate < LOW_CTR_THRESHOLD {
        insights.push(Insight::LowClickThrough {
            click_through_rate: metrics.click_through_rate,
        });
    }
    if metrics.zero_result_queries.len() > ZERO_RESULT_ENTRY_LIMIT {
        if let Some(top) = metrics.zero_result_queries.first() {
            insights.push(Insight::HighZeroResults {
                top_query: top.query.clone(),
            });
        }
    }
    if let Some(top) = metrics.top_queries.first() {
        insights.push(Insight::PopularContent {
            query: top.query.clone(),
        });
    }
    insights
}

/// `numerator / denominator`, or 0 when there is nothing to divide by
fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Count occurrences, remembering the order keys were first seen
fn count_by(keys: impl Iterator<Item = String>) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Sort by count descending; the stable sort keeps first-seen order for ties
fn ranked(counts: IndexMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

fn top_k(counts: IndexMap<String, usize>) -> Vec<QueryCount> {
    ranked(counts)
        .into_iter()
        .take(TOP_K)
        .map(|(query, count)| QueryCount { query, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(events: &[SearchEvent]) -> QueryMetrics {
        MetricsAggregator::default().aggregate(events)
    }

    #[test]
    fn test_zero_and_click_scenario() {
        let events = vec![
            SearchEvent::new("algebra", 0, 100),
            SearchEvent::new("geometry", 3, 200).clicked("x"),
        ];
        let metrics = aggregate(&events);

        assert_eq!(metrics.total_searches, 2);
        assert_eq!(metrics.click_through_rate, 50.0);
        assert_eq!(metrics.zero_result_queries.len(), 1);
        assert_eq!(metrics.zero_result_queries[0].query, "algebra");
        assert_eq!(metrics.zero_result_searches, 1);
        assert_eq!(metrics.avg_results_per_search, 1.5);
    }

    #[test]
    fn test_empty_input_has_no_nan() {
        let metrics = aggregate(&[]);

        assert_eq!(metrics.total_searches, 0);
        assert_eq!(metrics.unique_queries, 0);
        assert_eq!(metrics.avg_results_per_search, 0.0);
        assert_eq!(metrics.click_through_rate, 0.0);
        assert_eq!(metrics.avg_latency, 0.0);
        assert!(metrics.top_queries.is_empty());
        assert!(metrics.filter_usage.is_empty());
        assert_eq!(metrics.engagement, Engagement::NeedsImprovement);
        assert!(metrics.insights.is_empty());
    }

    #[test]
    fn test_click_through_rate_matches_ratio() {
        for (n, r) in [(1usize, 0usize), (3, 1), (7, 7), (40, 13)] {
            let events: Vec<SearchEvent> = (0..n)
                .map(|i| {
                    let e = SearchEvent::new(format!("q{}", i), 1, i as i64);
                    if i < r {
                        e.clicked("hit")
                    } else {
                        e
                    }
                })
                .collect();

            let ctr = aggregate(&events).click_through_rate;
            assert!((ctr - 100.0 * r as f64 / n as f64).abs() < 1e-9);
            assert!((0.0..=100.0).contains(&ctr));
        }
    }

    #[test]
    fn test_unique_queries_case_insensitive() {
        let events = vec![
            SearchEvent::new("Math", 1, 1),
            SearchEvent::new("math", 1, 2),
            SearchEvent::new("MATH", 1, 3),
            SearchEvent::new("physics", 1, 4),
        ];
        let metrics = aggregate(&events);

        assert_eq!(metrics.unique_queries, 2);
        assert!(metrics.unique_queries <= metrics.total_searches);
        assert_eq!(
            metrics.top_queries[0],
            QueryCount {
                query: "math".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_top_queries_bounded_and_sorted() {
        let mut events = Vec::new();
        for q in 0..15 {
            for _ in 0..(q % 4 + 1) {
                events.push(SearchEvent::new(format!("query-{}", q), 0, 0));
            }
        }
        let metrics = aggregate(&events);

        for list in [&metrics.top_queries, &metrics.zero_result_queries] {
            assert_eq!(list.len(), TOP_K);
            assert!(list.windows(2).all(|w| w[0].count >= w[1].count));
        }
        assert_eq!(metrics.unique_queries, 15);
        assert_eq!(metrics.zero_result_searches, events.len());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let events = vec![
            SearchEvent::new("zebra", 1, 1),
            SearchEvent::new("apple", 1, 2),
            SearchEvent::new("mango", 1, 3),
            SearchEvent::new("apple", 1, 4),
            SearchEvent::new("zebra", 1, 5),
        ];
        let names: Vec<String> = aggregate(&events)
            .top_queries
            .into_iter()
            .map(|q| q.query)
            .collect();

        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_filter_usage_untruncated() {
        let mut events = Vec::new();
        for f in 0..12 {
            events.push(SearchEvent::new("q", 1, 0).filter(format!("filter-{}", f)));
        }
        events.push(SearchEvent::new("q", 1, 0).filter("filter-3"));

        let usage = aggregate(&events).filter_usage;
        assert_eq!(usage.len(), 12);
        assert_eq!(usage[0].filter, "filter-3");
        assert_eq!(usage[0].count, 2);
    }

    #[test]
    fn test_latency_averaging_modes() {
        let events = vec![
            SearchEvent::new("a", 1, 0).latency(100),
            SearchEvent::new("b", 1, 0).latency(300),
            SearchEvent::new("c", 1, 0),
            SearchEvent::new("d", 1, 0),
        ];

        let all = MetricsAggregator::new(LatencyAveraging::AllRecords).aggregate(&events);
        let measured = MetricsAggregator::new(LatencyAveraging::WithLatency).aggregate(&events);

        assert_eq!(all.avg_latency, 100.0);
        assert_eq!(measured.avg_latency, 200.0);

        let none = vec![SearchEvent::new("a", 1, 0)];
        let measured = MetricsAggregator::new(LatencyAveraging::WithLatency).aggregate(&none);
        assert_eq!(measured.avg_latency, 0.0);
    }

    #[test]
    fn test_engagement_threshold() {
        let events = vec![
            SearchEvent::new("a", 1, 0).clicked("x"),
            SearchEvent::new("b", 1, 0).clicked("y"),
            SearchEvent::new("c", 1, 0),
        ];
        assert_eq!(aggregate(&events).engagement, Engagement::Good);

        let half = &events[1..];
        assert_eq!(aggregate(half).engagement, Engagement::NeedsImprovement);
    }

    /// `clicked` of 10 searches clicked, all for distinct queries
    fn with_clicks(clicked: usize) -> Vec<SearchEvent> {
        (0..10)
            .map(|i| {
                let e = SearchEvent::new(format!("q{}", i), 1, i as i64);
                if i < clicked {
                    e.clicked("hit")
                } else {
                    e
                }
            })
            .collect()
    }

    fn zero_result_entries(distinct: usize) -> Vec<SearchEvent> {
        let mut events = vec![SearchEvent::new("missing", 0, 0)];
        events.extend((1..distinct).map(|i| SearchEvent::new(format!("gap-{}", i), 0, i as i64)));
        events.push(SearchEvent::new("missing", 0, 99).clicked("x"));
        events
    }

    #[test]
    fn test_low_ctr_insight_boundary() {
        let at_threshold = aggregate(&with_clicks(3));
        assert_eq!(at_threshold.click_through_rate, 30.0);
        assert!(!at_threshold
            .insights
            .iter()
            .any(|i| matches!(i, Insight::LowClickThrough { .. })));

        let below = aggregate(&with_clicks(2));
        assert_eq!(
            below.insights[0],
            Insight::LowClickThrough {
                click_through_rate: 20.0
            }
        );
    }

    #[test]
    fn test_high_zero_results_insight_boundary() {
        let five = aggregate(&zero_result_entries(5));
        assert_eq!(five.zero_result_queries.len(), 5);
        assert!(!five
            .insights
            .iter()
            .any(|i| matches!(i, Insight::HighZeroResults { .. })));

        let six = aggregate(&zero_result_entries(6));
        assert_eq!(six.zero_result_queries.len(), 6);
        assert!(six.insights.contains(&Insight::HighZeroResults {
            top_query: "missing".to_string()
        }));
    }

    #[test]
    fn test_popular_content_names_top_query() {
        let events = vec![
            SearchEvent::new("calculus", 2, 1).clicked("a"),
            SearchEvent::new("Calculus", 2, 2).clicked("b"),
            SearchEvent::new("biology", 2, 3).clicked("c"),
        ];
        let metrics = aggregate(&events);

        assert_eq!(
            metrics.insights,
            vec![Insight::PopularContent {
                query: "calculus".to_string()
            }]
        );

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["insights"][0]["kind"], "popular_content");
        assert_eq!(json["insights"][0]["query"], "calculus");
    }
}
