//! Chart sinks: where rendered series go.
//!
//! A sink accepts `(target, series, title)` and hands back a [`SinkHandle`]
//! for the chart it drew. Disposing the handle releases that chart. The
//! refresh cycle holds at most one handle per chart and disposes it before
//! drawing the replacement.
//!
//! Two backends:
//! - **NDJSON stream**: one event per line to any `Write` impl
//! - **Memory**: live charts kept in a map; backs tests and `snapshot`

pub mod json_stream;
pub mod memory;

pub use json_stream::NdjsonSink;
pub use memory::MemorySink;

use ethscan_core::{AggregateSeries, EthscanResult};
use ethscan_provider::Endpoint;
use serde::Serialize;
use serde_json::Value;

/// Opaque ticket for one rendered chart.
///
/// Neither `Clone` nor `Copy`: [`SeriesSink::dispose`] consumes it, so an
/// owner can only give a handle back once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SinkHandle(u64);

impl SinkHandle {
    /// Wraps a sink-assigned id. Only sinks should mint handles.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Chart rendering target.
pub trait SeriesSink: Send {
    /// Draws `series` into `target` and returns the handle owning it.
    fn render(
        &mut self,
        target: &str,
        series: &AggregateSeries,
        title: &str,
    ) -> EthscanResult<SinkHandle>;

    /// Releases a chart. Unknown or already released handles are a no-op.
    fn dispose(&mut self, handle: SinkHandle) -> EthscanResult<()>;

    /// Verbatim display of a live payload.
    fn show_raw(&mut self, _endpoint: Endpoint, _payload: &Value) -> EthscanResult<()> {
        Ok(())
    }

    /// Loading indicator toggle.
    fn set_loading(&mut self, _visible: bool) -> EthscanResult<()> {
        Ok(())
    }
}

impl<S: SeriesSink + ?Sized> SeriesSink for Box<S> {
    fn render(
        &mut self,
        target: &str,
        series: &AggregateSeries,
        title: &str,
    ) -> EthscanResult<SinkHandle> {
        (**self).render(target, series, title)
    }

    fn dispose(&mut self, handle: SinkHandle) -> EthscanResult<()> {
        (**self).dispose(handle)
    }

    fn show_raw(&mut self, endpoint: Endpoint, payload: &Value) -> EthscanResult<()> {
        (**self).show_raw(endpoint, payload)
    }

    fn set_loading(&mut self, visible: bool) -> EthscanResult<()> {
        (**self).set_loading(visible)
    }
}

// ---------------------------------------------------------------------------
// Serializable event rows
// ---------------------------------------------------------------------------

/// Chart style hint carried with every render.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
}

/// One sink event, tagged by `event`.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent<'a> {
    Render {
        handle: u64,
        target: &'a str,
        title: &'a str,
        kind: ChartKind,
        labels: &'a [String],
        data: &'a [f64],
        created_at: String,
    },
    Dispose {
        handle: u64,
    },
    Raw {
        endpoint: &'a str,
        payload: &'a Value,
    },
    Loading {
        visible: bool,
    },
}

/// RFC 3339 UTC timestamp for event rows.
fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
