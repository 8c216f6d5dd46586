//! Domain types for the ethscan aggregation engine.

use crate::numeric;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// A raw numeric field as it arrived on the wire.
///
/// Kept uncoerced so a corrupt value degrades to `0` at aggregation time
/// instead of rejecting the block that carries it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl Quantity {
    /// Lenient numeric value: unparseable or non-finite input is `0.0`.
    #[inline]
    pub fn coerce(&self) -> f64 {
        match self {
            Self::Number(n) => numeric::finite_or_zero(*n),
            Self::Text(s) => numeric::coerce_str(s),
            Self::Absent => 0.0,
        }
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<f64> for Quantity {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

// ---------------------------------------------------------------------------
// Transaction / Block
// ---------------------------------------------------------------------------

/// Transaction fields the aggregators read. Everything else is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transaction {
    pub gas_price: Quantity,
    pub value: Quantity,
}

impl Transaction {
    pub fn new(gas_price: impl Into<Quantity>, value: impl Into<Quantity>) -> Self {
        Self {
            gas_price: gas_price.into(),
            value: value.into(),
        }
    }
}

/// One block from the historic-data feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub number: u64,
    /// Unix seconds. `None` when the wire value was not readable hex.
    pub timestamp: Option<i64>,
    /// Materialized transaction count, when the producer sent one.
    pub transaction_number: Option<u64>,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(number: u64, timestamp: Option<i64>, transactions: Vec<Transaction>) -> Self {
        Self {
            number,
            timestamp,
            transaction_number: None,
            transactions,
        }
    }

    /// Prefers the materialized count over the embedded list length.
    pub fn transaction_count(&self) -> u64 {
        self.transaction_number
            .unwrap_or(self.transactions.len() as u64)
    }

    /// Block time in milliseconds since the epoch.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.timestamp.and_then(|secs| secs.checked_mul(1000))
    }
}

// ---------------------------------------------------------------------------
// Aggregate series
// ---------------------------------------------------------------------------

/// Index-aligned labels and values, ready to chart.
///
/// Fields are private so `labels[i]` always pairs with `values[i]`.
/// Deserializing rejects columns of unequal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesColumns")]
pub struct AggregateSeries {
    labels: Vec<String>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct SeriesColumns {
    labels: Vec<String>,
    values: Vec<f64>,
}

impl TryFrom<SeriesColumns> for AggregateSeries {
    type Error = String;

    fn try_from(cols: SeriesColumns) -> Result<Self, Self::Error> {
        if cols.labels.len() != cols.values.len() {
            return Err(format!(
                "{} labels but {} values",
                cols.labels.len(),
                cols.values.len()
            ));
        }
        Ok(Self {
            labels: cols.labels,
            values: cols.values,
        })
    }
}

impl AggregateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            labels: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    /// Appends every point of `other`, keeping its order.
    pub fn extend(&mut self, other: AggregateSeries) {
        self.labels.extend(other.labels);
        self.values.extend(other.values);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

impl FromIterator<(String, f64)> for AggregateSeries {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut series = Self::new();
        for (label, value) in iter {
            series.push(label, value);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialized_count_wins() {
        let mut block = Block::new(1, Some(0), vec![Transaction::default()]);
        assert_eq!(block.transaction_count(), 1);
        block.transaction_number = Some(180);
        assert_eq!(block.transaction_count(), 180);
    }

    #[test]
    fn timestamp_millis_scales_seconds() {
        let block = Block::new(1, Some(100_000_000), vec![]);
        assert_eq!(block.timestamp_millis(), Some(100_000_000_000));
        assert_eq!(Block::new(1, None, vec![]).timestamp_millis(), None);
        assert_eq!(Block::new(1, Some(i64::MAX), vec![]).timestamp_millis(), None);
    }

    #[test]
    fn quantity_coercion() {
        assert_eq!(Quantity::from("0x10").coerce(), 16.0);
        assert_eq!(Quantity::from(f64::NAN).coerce(), 0.0);
        assert_eq!(Quantity::Absent.coerce(), 0.0);
    }

    #[test]
    fn series_stays_aligned() {
        let mut a: AggregateSeries = vec![("1".to_string(), 2.0)].into_iter().collect();
        a.push("2", 5.0);
        a.extend(vec![("3".to_string(), -1.0)].into_iter().collect());

        assert_eq!(a.labels(), ["1", "2", "3"]);
        assert_eq!(a.values(), [2.0, 5.0, -1.0]);
        assert_eq!(a.sum(), 6.0);
        assert_eq!(a.min(), Some(-1.0));
        assert_eq!(a.max(), Some(5.0));
        assert_eq!(AggregateSeries::new().max(), None);
    }

    #[test]
    fn series_decode_rejects_ragged_columns() {
        let ok: AggregateSeries =
            serde_json::from_value(serde_json::json!({"labels": ["a", "b"], "values": [1.0, 2.0]}))
                .unwrap();
        assert_eq!(ok.iter().count(), 2);

        let err = serde_json::from_value::<AggregateSeries>(
            serde_json::json!({"labels": ["a", "b"], "values": [1.0]}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("2 labels but 1 values"));
    }
}
