//! Cycle report generator.
//!
//! Takes one cycle's [`CycleReport`] plus the charts it drew and produces a
//! boxed text summary with per-chart statistics.

use crate::refresh::CycleReport;
use crate::sink::memory::RenderedChart;
use serde::Serialize;

/// Summary of one refresh cycle.
#[derive(Debug, Serialize)]
pub struct Report {
    pub blocks: usize,
    pub transactions: u64,
    pub block_range: Option<(u64, u64)>,
    pub charts: Vec<ChartStats>,
    pub fetch_time_ms: u64,
    pub total_time_ms: u64,
}

/// Point count and value spread for one chart.
#[derive(Debug, Serialize)]
pub struct ChartStats {
    pub target: String,
    pub title: String,
    pub points: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
}

impl Report {
    /// Build a report from a cycle outcome and the charts it rendered.
    pub fn build<'a>(
        cycle: &CycleReport,
        charts: impl IntoIterator<Item = &'a RenderedChart>,
    ) -> Self {
        let charts = charts
            .into_iter()
            .map(|c| ChartStats {
                target: c.target.clone(),
                title: c.title.clone(),
                points: c.series.len(),
                min: c.series.min(),
                max: c.series.max(),
                sum: c.series.sum(),
            })
            .collect();

        Report {
            blocks: cycle.blocks,
            transactions: cycle.transactions,
            block_range: cycle.block_range,
            charts,
            fetch_time_ms: cycle.fetch_time.as_millis() as u64,
            total_time_ms: cycle.total_time.as_millis() as u64,
        }
    }

    /// Render the report as a formatted string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let range = match self.block_range {
            Some((lo, hi)) => format!("{lo} - {hi}"),
            None => "-".to_string(),
        };

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                    ETHSCAN CHART SNAPSHOT                    ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Blocks:             {:>39} ║\n", self.blocks));
        out.push_str(&format!("║  Block range:        {:>39} ║\n", range));
        out.push_str(&format!("║  Transactions:       {:>39} ║\n", self.transactions));
        out.push_str(&format!("║  Fetch time:         {:>36} ms ║\n", self.fetch_time_ms));
        out.push_str(&format!("║  Total time:         {:>36} ms ║\n", self.total_time_ms));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.charts.is_empty() {
            out.push_str("║  No charts rendered.                                         ║\n");
        } else {
            for (i, c) in self.charts.iter().enumerate() {
                out.push_str("║                                                              ║\n");
                out.push_str(&format!("║  {}. {} [{}]\n", i + 1, c.title, c.target));
                out.push_str(&format!(
                    "║     Points: {}  |  Min: {}  |  Max: {}  |  Sum: {}\n",
                    c.points,
                    fmt_opt(c.min),
                    fmt_opt(c.max),
                    fmt_num(c.sum)
                ));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), fmt_num)
}

/// Integers without a fraction, everything else to 2 decimals; wei-scale
/// numbers in scientific notation.
fn fmt_num(v: f64) -> String {
    if v.abs() >= 1e15 {
        format!("{v:.3e}")
    } else if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
