//! Shape validation: parsed JSON -> `Vec<Block>`.
//!
//! The top level must be an array of objects that each carry `number`,
//! `timestamp` and a `transactions` array. Anything below that is read
//! leniently: a broken transaction never rejects its block.

use crate::error::{EthscanError, EthscanResult};
use crate::numeric;
use crate::types::{Block, Quantity, Transaction};
use serde_json::{Map, Value};

/// Converts a historic-data payload into blocks.
pub fn parse_blocks(payload: &Value) -> EthscanResult<Vec<Block>> {
    let items = payload.as_array().ok_or_else(|| {
        EthscanError::MalformedPayload(format!(
            "expected an array of blocks, got {}",
            json_kind(payload)
        ))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_block(index, item))
        .collect()
}

fn parse_block(index: usize, item: &Value) -> EthscanResult<Block> {
    let obj = item.as_object().ok_or_else(|| {
        malformed(index, format!("expected an object, got {}", json_kind(item)))
    })?;

    let number = required(obj, index, "number")?;
    let number = block_number(number)
        .ok_or_else(|| malformed(index, format!("unreadable block number {number}")))?;

    let timestamp = match required(obj, index, "timestamp")? {
        Value::String(s) => numeric::parse_hex_seconds(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };

    let transactions = required(obj, index, "transactions")?
        .as_array()
        .ok_or_else(|| malformed(index, "`transactions` is not an array".into()))?
        .iter()
        .map(parse_transaction)
        .collect();

    let transaction_number = obj.get("transaction_number").and_then(block_number);

    Ok(Block {
        number,
        timestamp,
        transaction_number,
        transactions,
    })
}

fn parse_transaction(item: &Value) -> Transaction {
    match item.as_object() {
        Some(obj) => Transaction {
            gas_price: quantity(obj.get("gas_price")),
            value: quantity(obj.get("value")),
        },
        None => Transaction::default(),
    }
}

fn quantity(v: Option<&Value>) -> Quantity {
    match v {
        Some(Value::String(s)) => Quantity::Text(s.clone()),
        Some(Value::Number(n)) => n.as_f64().map_or(Quantity::Absent, Quantity::Number),
        _ => Quantity::Absent,
    }
}

fn block_number(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => numeric::parse_block_number(s),
        _ => None,
    }
}

fn required<'a>(obj: &'a Map<String, Value>, index: usize, key: &str) -> EthscanResult<&'a Value> {
    obj.get(key)
        .ok_or_else(|| malformed(index, format!("missing `{key}`")))
}

fn malformed(index: usize, reason: String) -> EthscanError {
    EthscanError::MalformedPayload(format!("block #{index}: {reason}"))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_block() {
        let blocks = parse_blocks(&json!([{
            "number": 1,
            "timestamp": "0x5f5e100",
            "transactions": [
                {"gas_price": "100", "value": "10"},
                {"gas_price": "200", "value": "20"}
            ]
        }]))
        .unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].number, 1);
        assert_eq!(blocks[0].timestamp, Some(100_000_000));
        assert_eq!(blocks[0].transaction_number, None);
        assert_eq!(blocks[0].transactions[1], Transaction::new("200", "20"));
    }

    #[test]
    fn parses_producer_wire_format() {
        // Hex-encoded number and quantities, extra fields, materialized count.
        let blocks = parse_blocks(&json!([{
            "number": "0x1036f0b",
            "hash": "0xabc",
            "miner_author": null,
            "timestamp": "0x642d7c63",
            "transaction_number": 2,
            "transactions": [
                {"hash": "0x01", "from": "0x02", "to": null, "value": "0x0", "gas_price": "0x3b9aca00", "gas": "0x5208"},
                {"hash": "0x03", "from": "0x04", "value": "0xde0b6b3a7640000", "gas_price": null, "gas": "0x5208"}
            ]
        }]))
        .unwrap();

        let block = &blocks[0];
        assert_eq!(block.number, 17_002_251);
        assert_eq!(block.transaction_number, Some(2));
        assert_eq!(block.transactions[0].gas_price.coerce(), 1e9);
        assert_eq!(block.transactions[1].gas_price, Quantity::Absent);
        assert_eq!(block.transactions[1].value.coerce(), 1e18);
    }

    #[test]
    fn rejects_non_array() {
        let err = parse_blocks(&json!({"blocks": []})).unwrap_err();
        assert!(matches!(err, EthscanError::MalformedPayload(_)));
    }

    #[test]
    fn rejects_missing_required_fields() {
        for block in [
            json!({"timestamp": "0x1", "transactions": []}),
            json!({"number": 1, "transactions": []}),
            json!({"number": 1, "timestamp": "0x1"}),
            json!({"number": 1, "timestamp": "0x1", "transactions": "none"}),
            json!({"number": "soon", "timestamp": "0x1", "transactions": []}),
            json!(7),
        ] {
            let err = parse_blocks(&json!([block])).unwrap_err();
            assert!(matches!(err, EthscanError::MalformedPayload(_)), "{block}");
        }
    }

    #[test]
    fn tolerates_broken_transactions() {
        let blocks = parse_blocks(&json!([{
            "number": 5,
            "timestamp": "garbage",
            "transactions": [42, {"gas_price": true}, {"gas_price": "abc", "value": 5}]
        }]))
        .unwrap();

        let block = &blocks[0];
        assert_eq!(block.timestamp, None);
        assert_eq!(block.transactions.len(), 3);
        assert_eq!(block.transactions[0], Transaction::default());
        assert_eq!(block.transactions[1].gas_price, Quantity::Absent);
        assert_eq!(block.transactions[2].gas_price.coerce(), 0.0);
        assert_eq!(block.transactions[2].value.coerce(), 5.0);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_blocks(&json!([])).unwrap().is_empty());
    }
}
