//! Block aggregators, chart pipeline, chart sinks, and the refresh cycle.

pub mod aggregate;
pub mod pipeline;
pub mod refresh;
pub mod reporter;
pub mod sink;

pub use aggregate::{Aggregator, BucketGranularity};
pub use pipeline::{default_charts, ChartSpec};
pub use refresh::{CycleReport, CycleState, RefreshCycle};
pub use sink::{MemorySink, NdjsonSink, SeriesSink, SinkHandle};
