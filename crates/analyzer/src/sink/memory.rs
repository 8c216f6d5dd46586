//! In-memory sink.

use super::{SeriesSink, SinkHandle};
use ethscan_core::{AggregateSeries, EthscanError, EthscanResult};
use ethscan_provider::Endpoint;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A chart currently held by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    pub target: String,
    pub title: String,
    pub series: AggregateSeries,
}

/// Keeps live charts in render order and counts every render and dispose.
#[derive(Debug, Default)]
pub struct MemorySink {
    live: IndexMap<u64, RenderedChart>,
    next_handle: u64,
    rendered: usize,
    disposed: usize,
    raw: HashMap<Endpoint, Value>,
    loading_toggles: Vec<bool>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `render` fail, as a torn-down display would.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered
    }

    pub fn disposed_count(&self) -> usize {
        self.disposed
    }

    /// Live charts in the order they were drawn.
    pub fn live_charts(&self) -> impl Iterator<Item = &RenderedChart> {
        self.live.values()
    }

    /// The live chart drawn into `target`, if any.
    pub fn chart(&self, target: &str) -> Option<&RenderedChart> {
        self.live.values().find(|c| c.target == target)
    }

    pub fn is_live(&self, handle: &SinkHandle) -> bool {
        self.live.contains_key(&handle.id())
    }

    /// Last payload shown for `endpoint`.
    pub fn raw(&self, endpoint: Endpoint) -> Option<&Value> {
        self.raw.get(&endpoint)
    }

    /// Every loading-indicator change, oldest first.
    pub fn loading_toggles(&self) -> &[bool] {
        &self.loading_toggles
    }
}

impl SeriesSink for MemorySink {
    fn render(
        &mut self,
        target: &str,
        series: &AggregateSeries,
        title: &str,
    ) -> EthscanResult<SinkHandle> {
        if self.closed {
            return Err(EthscanError::Sink(format!("cannot render {target}: sink closed")));
        }

        self.next_handle += 1;
        self.rendered += 1;
        self.live.insert(
            self.next_handle,
            RenderedChart {
                target: target.to_string(),
                title: title.to_string(),
                series: series.clone(),
            },
        );
        Ok(SinkHandle::from_raw(self.next_handle))
    }

    fn dispose(&mut self, handle: SinkHandle) -> EthscanResult<()> {
        if self.live.shift_remove(&handle.id()).is_some() {
            self.disposed += 1;
        }
        Ok(())
    }

    fn show_raw(&mut self, endpoint: Endpoint, payload: &Value) -> EthscanResult<()> {
        self.raw.insert(endpoint, payload.clone());
        Ok(())
    }

    fn set_loading(&mut self, visible: bool) -> EthscanResult<()> {
        self.loading_toggles.push(visible);
        Ok(())
    }
}
