//! NDJSON (newline-delimited JSON) event sink.
//!
//! Every render, dispose, raw payload, and loading toggle becomes one JSON
//! line, serialized straight into the writer. A dashboard front end replays
//! the stream to keep its charts in sync.
//!
//! ```ignore
//! let mut sink = NdjsonSink::stdout();
//! let handle = sink.render("gas-chart", &series, "Total Gas Price per Block")?;
//! sink.dispose(handle)?;
//! ```

use super::{now_rfc3339, ChartKind, SeriesSink, SinkEvent, SinkHandle};
use ethscan_core::{AggregateSeries, EthscanError, EthscanResult};
use ethscan_provider::Endpoint;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{self, BufWriter, Write};

/// NDJSON writer over any `Write`.
///
/// Wrapped in a `BufWriter`; flushed after every event so a tailing reader
/// never sees half a line.
pub struct NdjsonSink<W: Write> {
    writer: BufWriter<W>,
    next_handle: u64,
    live: HashSet<u64>,
    rows_written: usize,
}

impl NdjsonSink<io::Stdout> {
    /// Write NDJSON to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> NdjsonSink<W> {
    /// Create a sink wrapping any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            next_handle: 1,
            live: HashSet::new(),
            rows_written: 0,
        }
    }

    fn write_event(&mut self, event: &SinkEvent<'_>) -> EthscanResult<()> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| EthscanError::Sink(format!("serialize event: {e}")))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| EthscanError::Sink(format!("write event: {e}")))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of charts rendered and not yet disposed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

impl<W: Write + Send> SeriesSink for NdjsonSink<W> {
    fn render(
        &mut self,
        target: &str,
        series: &AggregateSeries,
        title: &str,
    ) -> EthscanResult<SinkHandle> {
        let id = self.next_handle;
        self.write_event(&SinkEvent::Render {
            handle: id,
            target,
            title,
            kind: ChartKind::Line,
            labels: series.labels(),
            data: series.values(),
            created_at: now_rfc3339(),
        })?;

        self.next_handle += 1;
        self.live.insert(id);
        Ok(SinkHandle::from_raw(id))
    }

    fn dispose(&mut self, handle: SinkHandle) -> EthscanResult<()> {
        if !self.live.remove(&handle.id()) {
            return Ok(());
        }
        self.write_event(&SinkEvent::Dispose { handle: handle.id() })
    }

    fn show_raw(&mut self, endpoint: Endpoint, payload: &Value) -> EthscanResult<()> {
        self.write_event(&SinkEvent::Raw {
            endpoint: endpoint.path(),
            payload,
        })
    }

    fn set_loading(&mut self, visible: bool) -> EthscanResult<()> {
        self.write_event(&SinkEvent::Loading { visible })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lines(buf: &[u8]) -> Vec<Value> {
        std::str::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn render_and_dispose_events() {
        let mut buf = Vec::new();
        let mut sink = NdjsonSink::new(&mut buf);

        let mut series = AggregateSeries::new();
        series.push("17002251", 150.0);

        let handle = sink
            .render("gas-avg-chart", &series, "Average Gas Price per Block")
            .unwrap();
        assert_eq!(sink.live_count(), 1);
        sink.dispose(handle).unwrap();
        assert_eq!(sink.live_count(), 0);
        sink.set_loading(false).unwrap();
        let n = sink.finish().unwrap();
        assert_eq!(n, 3);

        let rows = lines(&buf);
        assert_eq!(rows[0]["event"], "render");
        assert_eq!(rows[0]["handle"], 1);
        assert_eq!(rows[0]["target"], "gas-avg-chart");
        assert_eq!(rows[0]["kind"], "line");
        assert_eq!(rows[0]["labels"], json!(["17002251"]));
        assert_eq!(rows[0]["data"], json!([150.0]));
        assert_eq!(rows[1], json!({"event": "dispose", "handle": 1}));
        assert_eq!(rows[2], json!({"event": "loading", "visible": false}));
    }

    #[test]
    fn foreign_handle_dispose_is_silent() {
        let mut buf = Vec::new();
        let mut sink = NdjsonSink::new(&mut buf);
        sink.dispose(SinkHandle::from_raw(99)).unwrap();
        assert_eq!(sink.rows_written(), 0);
    }

    #[test]
    fn raw_payload_passthrough() {
        let mut buf = Vec::new();
        let mut sink = NdjsonSink::new(&mut buf);
        sink.show_raw(Endpoint::Blocks, &json!([{"number": "0x1"}]))
            .unwrap();
        sink.finish().unwrap();

        let rows = lines(&buf);
        assert_eq!(
            rows[0],
            json!({"event": "raw", "endpoint": "blocks", "payload": [{"number": "0x1"}]})
        );
    }
}
