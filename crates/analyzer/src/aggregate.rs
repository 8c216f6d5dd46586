//! Block aggregators.
//!
//! Every aggregator is a pure `&[Block] -> AggregateSeries` fold with no
//! shared state, so the chart pipeline can evaluate them in parallel.
//! Per-block series keep input order and label points with the block number.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use ethscan_core::{AggregateSeries, Block};
use indexmap::IndexMap;

// ---------------------------------------------------------------------------
// Per-block series
// ---------------------------------------------------------------------------

/// Transactions per block.
pub fn transaction_count(blocks: &[Block]) -> AggregateSeries {
    per_block(blocks, |b| b.transaction_count() as f64)
}

/// Mean gas price per block; `0` for a block without transactions.
pub fn average_gas_price(blocks: &[Block]) -> AggregateSeries {
    per_block(blocks, |b| {
        if b.transactions.is_empty() {
            0.0
        } else {
            sum_gas_price(b) / b.transactions.len() as f64
        }
    })
}

/// Sum of gas prices per block.
pub fn total_gas_price(blocks: &[Block]) -> AggregateSeries {
    per_block(blocks, sum_gas_price)
}

/// Sum of transferred value per block.
pub fn total_value(blocks: &[Block]) -> AggregateSeries {
    per_block(blocks, sum_value)
}

fn per_block(blocks: &[Block], f: impl Fn(&Block) -> f64) -> AggregateSeries {
    let mut series = AggregateSeries::with_capacity(blocks.len());
    for block in blocks {
        series.push(block.number.to_string(), f(block));
    }
    series
}

fn sum_gas_price(block: &Block) -> f64 {
    block.transactions.iter().map(|tx| tx.gas_price.coerce()).sum()
}

fn sum_value(block: &Block) -> f64 {
    block.transactions.iter().map(|tx| tx.value.coerce()).sum()
}

// ---------------------------------------------------------------------------
// Time-bucketed value
// ---------------------------------------------------------------------------

/// Wall-clock bucket width for [`value_per_bucket`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BucketGranularity {
    /// `YEAR-MONTH-DAY HOUR:MINUTE`
    #[default]
    Minute,
    /// `YEAR-MONTH-DAY HOUR:00`
    Hour,
    /// `YEAR-MONTH-DAY`
    Day,
}

impl BucketGranularity {
    /// Unpadded bucket key, e.g. `2023-4-5 9:7` for a minute bucket.
    pub fn key<Tz: TimeZone>(self, at: &DateTime<Tz>) -> String {
        match self {
            Self::Minute => format!(
                "{}-{}-{} {}:{}",
                at.year(),
                at.month(),
                at.day(),
                at.hour(),
                at.minute()
            ),
            Self::Hour => format!("{}-{}-{} {}:00", at.year(), at.month(), at.day(), at.hour()),
            Self::Day => format!("{}-{}-{}", at.year(), at.month(), at.day()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl std::str::FromStr for BucketGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(format!("unknown granularity `{other}` (minute, hour, day)")),
        }
    }
}

/// Transferred value per local-time bucket.
pub fn value_per_bucket(blocks: &[Block], granularity: BucketGranularity) -> AggregateSeries {
    value_per_bucket_in(blocks, granularity, &Local)
}

/// Transferred value per time bucket in `tz`.
///
/// Every transaction is dated by its owning block. Labels come out in the
/// order buckets are first met while scanning `blocks`, which is not
/// necessarily chronological. Blocks without a readable timestamp are left
/// out.
pub fn value_per_bucket_in<Tz: TimeZone>(
    blocks: &[Block],
    granularity: BucketGranularity,
    tz: &Tz,
) -> AggregateSeries {
    let mut sums: IndexMap<String, f64> = IndexMap::new();

    for block in blocks {
        if block.transactions.is_empty() {
            continue;
        }

        let at = block
            .timestamp_millis()
            .and_then(|ms| tz.timestamp_millis_opt(ms).single());
        let Some(at) = at else {
            tracing::debug!(block = block.number, "no usable timestamp, left out of time buckets");
            continue;
        };

        *sums.entry(granularity.key(&at)).or_insert(0.0) += sum_value(block);
    }

    sums.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Aggregator selector
// ---------------------------------------------------------------------------

/// One of the five chartable aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregator {
    TransactionCount,
    AverageGasPrice,
    TotalGasPrice,
    TotalValue,
    ValuePerBucket(BucketGranularity),
}

impl Aggregator {
    pub fn apply(self, blocks: &[Block]) -> AggregateSeries {
        match self {
            Self::TransactionCount => transaction_count(blocks),
            Self::AverageGasPrice => average_gas_price(blocks),
            Self::TotalGasPrice => total_gas_price(blocks),
            Self::TotalValue => total_value(blocks),
            Self::ValuePerBucket(g) => value_per_bucket(blocks, g),
        }
    }

    /// Default chart target identifier.
    pub fn target(self) -> &'static str {
        match self {
            Self::TransactionCount => "transaction-chart",
            Self::AverageGasPrice => "gas-avg-chart",
            Self::TotalGasPrice => "gas-chart",
            Self::TotalValue => "txs-value-chart",
            Self::ValuePerBucket(BucketGranularity::Minute) => "txs-value-min-chart",
            Self::ValuePerBucket(BucketGranularity::Hour) => "txs-value-hour-chart",
            Self::ValuePerBucket(BucketGranularity::Day) => "txs-value-day-chart",
        }
    }

    /// Default chart title.
    pub fn title(self) -> &'static str {
        match self {
            Self::TransactionCount => "Transactions per Block",
            Self::AverageGasPrice => "Average Gas Price per Block",
            Self::TotalGasPrice => "Total Gas Price per Block",
            Self::TotalValue => "Total Value per Block",
            Self::ValuePerBucket(BucketGranularity::Minute) => "Transaction Value per Minute",
            Self::ValuePerBucket(BucketGranularity::Hour) => "Transaction Value per Hour",
            Self::ValuePerBucket(BucketGranularity::Day) => "Transaction Value per Day",
        }
    }
}
