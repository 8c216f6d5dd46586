//! Record model, numeric coercion, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod numeric;
pub mod payload;
pub mod types;

pub use error::{EthscanError, EthscanResult};
pub use payload::parse_blocks;
pub use types::{AggregateSeries, Block, Quantity, Transaction};
