//! Aggregator -> chart pipeline.
//!
//! The dashboard is a list of [`ChartSpec`]s; one pass evaluates every
//! aggregator over the same block slice and yields the series in list order.

use crate::aggregate::{Aggregator, BucketGranularity};
use ethscan_core::{AggregateSeries, Block};
use rayon::prelude::*;

/// Which aggregation to draw, where, and under what title.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub aggregator: Aggregator,
    pub target: String,
    pub title: String,
}

impl ChartSpec {
    /// Spec using the aggregator's default target and title.
    pub fn standard(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            target: aggregator.target().to_string(),
            title: aggregator.title().to_string(),
        }
    }
}

/// The five dashboard charts, time buckets at `granularity`.
pub fn default_charts(granularity: BucketGranularity) -> Vec<ChartSpec> {
    [
        Aggregator::TransactionCount,
        Aggregator::AverageGasPrice,
        Aggregator::TotalGasPrice,
        Aggregator::TotalValue,
        Aggregator::ValuePerBucket(granularity),
    ]
    .into_iter()
    .map(ChartSpec::standard)
    .collect()
}

/// Evaluates all charts in parallel. Output is index-aligned with `charts`.
pub fn evaluate(charts: &[ChartSpec], blocks: &[Block]) -> Vec<AggregateSeries> {
    tracing::debug!(charts = charts.len(), blocks = blocks.len(), "aggregating");

    charts
        .par_iter()
        .map(|chart| chart.aggregator.apply(blocks))
        .collect()
}
