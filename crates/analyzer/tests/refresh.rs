//! Refresh cycle against a mock data API over HTTP.

use ethscan_analyzer::{BucketGranularity, CycleState, MemorySink, NdjsonSink, RefreshCycle};
use ethscan_core::EthscanError;
use ethscan_provider::{Endpoint, HttpGateway};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn historic_payload() -> Value {
    // Shape served by the block archive: hex numbers and quantities.
    json!([
        {
            "number": "0x1036f0b",
            "hash": "0xaa",
            "timestamp": "0x642d7c63",
            "transaction_number": 2,
            "transactions": [
                {"hash": "0x01", "value": "0x0", "gas_price": "0x3b9aca00", "gas": "0x5208"},
                {"hash": "0x02", "value": "0x2", "gas_price": "0x77359400", "gas": "0x5208"}
            ]
        },
        {
            "number": "0x1036f0c",
            "hash": "0xbb",
            "timestamp": "0x642d7c6f",
            "transaction_number": 0,
            "transactions": []
        }
    ])
}

async fn mount_live_endpoints(server: &MockServer) {
    for endpoint in [Endpoint::Transactions, Endpoint::Blocks] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", endpoint.path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"live": endpoint.path()}])))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn http_cycle_renders_dashboard() {
    let server = MockServer::start().await;
    mount_live_endpoints(&server).await;
    Mock::given(method("GET"))
        .and(path("/historic-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(historic_payload()))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let mut cycle = RefreshCycle::new(gateway, MemorySink::new());
    let report = cycle.run_cycle().await.unwrap();

    assert_eq!(report.blocks, 2);
    assert_eq!(report.transactions, 2);
    assert_eq!(report.block_range, Some((17_002_251, 17_002_252)));

    let sink = cycle.sink();
    let count = &sink.chart("transaction-chart").unwrap().series;
    assert_eq!(count.labels(), ["17002251", "17002252"]);
    assert_eq!(count.values(), [2.0, 0.0]);

    let avg = &sink.chart("gas-avg-chart").unwrap().series;
    assert_eq!(avg.values(), [1.5e9, 0.0]);

    let value = &sink.chart("txs-value-chart").unwrap().series;
    assert_eq!(value.values(), [2.0, 0.0]);

    // Both blocks land in the same minute; the empty one adds nothing.
    let per_minute = &sink.chart("txs-value-min-chart").unwrap().series;
    assert_eq!(per_minute.len(), 1);
    assert_eq!(per_minute.values(), [2.0]);

    assert_eq!(
        sink.raw(Endpoint::Transactions),
        Some(&json!([{"live": "transactions"}]))
    );
}

#[tokio::test]
async fn http_outage_keeps_charts() {
    let server = MockServer::start().await;
    mount_live_endpoints(&server).await;
    Mock::given(method("GET"))
        .and(path("/historic-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(historic_payload()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/historic-data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let mut cycle = RefreshCycle::new(gateway, MemorySink::new());

    cycle.run_cycle().await.unwrap();
    let err = cycle.run_cycle().await.unwrap_err();

    assert!(matches!(err, EthscanError::Transport(_)));
    assert_eq!(cycle.state(), CycleState::Idle);
    assert_eq!(cycle.live_handles(), 5);
    assert_eq!(cycle.sink().live_count(), 5);
    assert_eq!(cycle.sink().disposed_count(), 0);
}

#[tokio::test]
async fn ndjson_stream_replays_to_one_chart_per_target() {
    let server = MockServer::start().await;
    mount_live_endpoints(&server).await;
    Mock::given(method("GET"))
        .and(path("/historic-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(historic_payload()))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&server.uri()).unwrap();
    let charts = ethscan_analyzer::default_charts(BucketGranularity::Hour);
    let mut cycle = RefreshCycle::new_with_charts(gateway, NdjsonSink::new(Vec::new()), charts);

    for _ in 0..3 {
        cycle.run_cycle().await.unwrap();
    }
    let sink = cycle.into_sink();
    assert_eq!(sink.live_count(), 5);
    let rows = sink.rows_written();

    // 1 loading on + 3 x (2 raw + 5 render) + 2 x 5 dispose + 1 loading off.
    assert_eq!(rows, 1 + 3 * 7 + 2 * 5 + 1);
}
