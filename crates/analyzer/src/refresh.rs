//! Refresh cycle: fetch -> aggregate -> render, on a fixed period.
//!
//! ```text
//! Idle -> Fetching -> Aggregating -> Rendering -> Idle
//!            |
//!            +-- fetch or payload error --> Idle (charts untouched)
//! ```
//!
//! The cycle owns the chart handles. Each render step disposes a chart's
//! previous handle before drawing its replacement, so exactly one handle per
//! chart is live after the first successful cycle.

use crate::aggregate::BucketGranularity;
use crate::pipeline::{self, ChartSpec};
use crate::sink::{SeriesSink, SinkHandle};
use ethscan_core::error::{EthscanError, EthscanResult};
use ethscan_core::{parse_blocks, Block};
use ethscan_provider::{Endpoint, FetchGateway};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Default refresh period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(30);

/// Where the cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Aggregating,
    Rendering,
}

/// One-shot loading indicator: shown before the first fetch, hidden after
/// the first successful render, never touched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loading {
    Pending,
    Shown,
    Done,
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub blocks: usize,
    pub transactions: u64,
    /// Lowest and highest block number seen.
    pub block_range: Option<(u64, u64)>,
    pub charts: usize,
    pub fetch_time: Duration,
    pub total_time: Duration,
}

/// Drives the dashboard.
///
/// `run_cycle` takes `&mut self`, so two cycles can never overlap on one
/// instance; `run` awaits each cycle before waiting for the next tick.
pub struct RefreshCycle<G, S> {
    gateway: G,
    sink: S,
    charts: Vec<ChartSpec>,
    /// Index-aligned with `charts`.
    handles: Vec<Option<SinkHandle>>,
    state: CycleState,
    loading: Loading,
    completed: u64,
    skipped: u64,
    max_cycles: Option<u64>,
}

impl<G: FetchGateway, S: SeriesSink> RefreshCycle<G, S> {
    /// Cycle over the five default charts with per-minute value buckets.
    pub fn new(gateway: G, sink: S) -> Self {
        Self::new_with_charts(gateway, sink, pipeline::default_charts(BucketGranularity::Minute))
    }

    /// Cycle over a custom chart list.
    pub fn new_with_charts(gateway: G, sink: S, charts: Vec<ChartSpec>) -> Self {
        Self {
            gateway,
            sink,
            handles: charts.iter().map(|_| None).collect(),
            charts,
            state: CycleState::Idle,
            loading: Loading::Pending,
            completed: 0,
            skipped: 0,
            max_cycles: None,
        }
    }

    /// Replaces the chart list, disposing every chart drawn from the old one.
    ///
    /// The new charts appear on the next successful cycle.
    pub fn set_charts(&mut self, charts: Vec<ChartSpec>) -> EthscanResult<()> {
        for handle in self.handles.iter_mut().filter_map(Option::take) {
            self.sink.dispose(handle)?;
        }
        self.handles = charts.iter().map(|_| None).collect();
        self.charts = charts;
        Ok(())
    }

    /// Stop `run` after this many cycle attempts, failed ones included.
    pub fn with_max_cycles(mut self, n: u64) -> Self {
        self.max_cycles = Some(n);
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Charts with a live handle.
    pub fn live_handles(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed
    }

    pub fn skipped_cycles(&self) -> u64 {
        self.skipped
    }

    /// Runs one full cycle.
    ///
    /// Fetch and payload errors are returned after the cycle falls back to
    /// `Idle` with every existing chart left in place. Sink errors are
    /// returned as is; the caller should treat them as fatal.
    pub async fn run_cycle(&mut self) -> EthscanResult<CycleReport> {
        let result = self.cycle().await;
        self.transition(CycleState::Idle);

        match &result {
            Ok(_) => self.completed += 1,
            Err(e) if e.is_skippable() => {
                self.skipped += 1;
                tracing::warn!(error = %e, "cycle skipped, keeping previous charts");
            }
            Err(_) => {}
        }
        result
    }

    async fn cycle(&mut self) -> EthscanResult<CycleReport> {
        let t0 = Instant::now();

        if self.loading == Loading::Pending {
            self.sink.set_loading(true)?;
            self.loading = Loading::Shown;
        }

        // Fetching: all three payloads or nothing.
        self.transition(CycleState::Fetching);
        let (transactions, latest_blocks, historic) = tokio::try_join!(
            self.gateway.fetch_transactions(),
            self.gateway.fetch_blocks(),
            self.gateway.fetch_historic_data(),
        )?;
        let blocks = parse_blocks(&historic)?;
        let fetch_time = t0.elapsed();

        self.sink.show_raw(Endpoint::Transactions, &transactions)?;
        self.sink.show_raw(Endpoint::Blocks, &latest_blocks)?;

        // Aggregating.
        self.transition(CycleState::Aggregating);
        let summary = BlockSummary::of(&blocks);
        let charts = self.charts.clone();
        let series = tokio::task::spawn_blocking(move || pipeline::evaluate(&charts, &blocks))
            .await
            .map_err(|e| EthscanError::Internal(format!("aggregation task failed: {e}")))?;

        // Rendering: release each chart's previous handle, then redraw it.
        self.transition(CycleState::Rendering);
        for ((chart, series), slot) in self.charts.iter().zip(&series).zip(&mut self.handles) {
            if let Some(previous) = slot.take() {
                self.sink.dispose(previous)?;
            }
            *slot = Some(self.sink.render(&chart.target, series, &chart.title)?);
            tracing::debug!(chart = %chart.target, points = series.len(), "rendered");
        }

        if self.loading == Loading::Shown {
            self.sink.set_loading(false)?;
            self.loading = Loading::Done;
        }

        Ok(CycleReport {
            cycle: self.completed + self.skipped + 1,
            blocks: summary.blocks,
            transactions: summary.transactions,
            block_range: summary.range,
            charts: self.charts.len(),
            fetch_time,
            total_time: t0.elapsed(),
        })
    }

    fn transition(&mut self, next: CycleState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "cycle state");
            self.state = next;
        }
    }

    /// Fires a cycle immediately, then every `period` until `shutdown`
    /// resolves or the cycle limit is reached.
    ///
    /// Ticks that fall due while a cycle is still running are skipped, not
    /// queued. Skippable errors are logged and retried on the next tick;
    /// any other error ends the loop.
    pub async fn run<F>(&mut self, period: Duration, shutdown: F) -> EthscanResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(period_secs = period.as_secs_f64(), charts = self.charts.len(), "refresh loop started");

        loop {
            if self.max_cycles.is_some_and(|max| self.completed + self.skipped >= max) {
                tracing::info!(cycles = self.completed + self.skipped, "cycle limit reached");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    cycle = report.cycle,
                    blocks = report.blocks,
                    txs = report.transactions,
                    fetch_ms = report.fetch_time.as_millis(),
                    elapsed_ms = report.total_time.as_millis(),
                    "charts refreshed"
                ),
                Err(e) if e.is_skippable() => {}
                Err(e) => {
                    tracing::error!(error = %e, "refresh loop stopped");
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

/// Block and transaction totals taken before the blocks move to the
/// aggregation task.
struct BlockSummary {
    blocks: usize,
    transactions: u64,
    range: Option<(u64, u64)>,
}

impl BlockSummary {
    fn of(blocks: &[Block]) -> Self {
        let range = blocks.iter().map(|b| b.number).fold(None, |acc, n| match acc {
            None => Some((n, n)),
            Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
        });

        Self {
            blocks: blocks.len(),
            transactions: blocks.iter().map(Block::transaction_count).sum(),
            range,
        }
    }
}
