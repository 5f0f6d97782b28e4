use bridge_backend::aggregate::{BatchScanAggregator, EventAggregator};
use bridge_backend::error::IndexerError;
use bridge_backend::indexer::{BridgeEventSource, DailyStatsQuery, IndexerClient};
use bridge_backend::models::{EventFilter, EventType, OrderDirection};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

fn client(server: &MockServer) -> IndexerClient {
    IndexerClient::new(
        format!("{}/subgraphs/bridge", server.uri()),
        Duration::from_secs(5),
        1000,
    )
    .unwrap()
}

fn event_json(hash: &str, timestamp: &str, chain: &str) -> Value {
    json!({
        "amount": "1000000000000000000",
        "blockNumber": "1024",
        "chainName": chain,
        "eventType": "WITHDRAW",
        "from": "0x1111",
        "timestamp": timestamp,
        "to": "0x2222",
        "transactionHash": hash,
        "verseId": "1"
    })
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_fetch_page_without_chain_uses_event_type_only_query() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/subgraphs/bridge"))
        .and(body_partial_json(json!({
            "variables": {"eventType": "WITHDRAW", "first": 20, "skip": 20}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bridgeEvents": [
                event_json("0xb", "100", "tcg"),
                event_json("0xc", "200", "home"),
                event_json("0xa", "100", "tcg")
            ]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, None);
    let events = client(&mock_server).fetch_page(&filter, 20, 20).await.unwrap();

    let hashes: Vec<&str> = events.iter().map(|e| e.transaction_hash.as_str()).collect();
    assert_eq!(hashes, vec!["0xc", "0xa", "0xb"]);

    let bodies = request_bodies(&mock_server).await;
    assert!(bodies[0]["variables"].get("chainName").is_none());
    let query = bodies[0]["query"].as_str().unwrap();
    assert!(query.contains("orderBy: timestamp"));
    assert!(!query.contains("$chainName"));
}

#[tokio::test]
async fn test_fetch_page_with_chain_uses_chain_query() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": {"eventType": "DEPOSIT", "chainName": "tcg", "first": 2, "skip": 0}
        })))
        .and(body_string_contains("$chainName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bridgeEvents": [
                event_json("0x1", "300", "tcg"),
                event_json("0x2", "200", "tcg"),
                event_json("0x3", "100", "tcg")
            ]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Deposit, Some("tcg".into()));
    let events = client(&mock_server).fetch_page(&filter, 2, 0).await.unwrap();

    // truncated to the requested page size
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].transaction_hash, "0x1");
}

#[tokio::test]
async fn test_fetch_count_uses_indexer_cap() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(body_string_contains("CountBridgeEvents"))
        .and(body_partial_json(json!({"variables": {"first": 1000}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bridgeEvents": [{"id": "a"}, {"id": "b"}, {"id": "c"}]}
        })))
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, Some(String::new()));
    let ids = client(&mock_server).fetch_count(&filter).await.unwrap();

    assert_eq!(ids.len(), 3);
    let bodies = request_bodies(&mock_server).await;
    assert!(bodies[0]["variables"].get("chainName").is_none());
    assert!(bodies[0]["variables"].get("skip").is_none());
}

#[tokio::test]
async fn test_graphql_errors_are_typed() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "Type `Query` has no field `bridgeEvents`"}]
        })))
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = client(&mock_server).fetch_count(&filter).await.unwrap_err();

    match err {
        IndexerError::Graphql(messages) => {
            assert_eq!(messages, vec!["Type `Query` has no field `bridgeEvents`".to_string()])
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_status_error() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("indexer syncing"))
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = client(&mock_server).fetch_page(&filter, 20, 0).await.unwrap_err();

    assert!(matches!(
        err,
        IndexerError::Status { status: 503, ref body } if body == "indexer syncing"
    ));
}

#[tokio::test]
async fn test_missing_bridge_events_is_malformed() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = client(&mock_server).fetch_page(&filter, 20, 0).await.unwrap_err();

    assert!(matches!(err, IndexerError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = client(&mock_server).fetch_count(&filter).await.unwrap_err();

    assert!(matches!(err, IndexerError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"bridgeEvents": []}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = IndexerClient::new(mock_server.uri(), Duration::from_millis(200), 1000).unwrap();
    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = client.fetch_count(&filter).await.unwrap_err();

    assert!(matches!(err, IndexerError::Timeout));
}

#[tokio::test]
async fn test_aggregate_scans_all_batches() {
    let mock_server = setup_mock_server().await;

    let batch = |n: usize, offset: usize| -> Value {
        let rows: Vec<Value> = (0..n)
            .map(|i| json!({"id": format!("e{}", offset + i), "amount": "0.1"}))
            .collect();
        json!({"data": {"bridgeEvents": rows}})
    };

    for (skip, n) in [(0u32, 20usize), (20, 20), (40, 5)] {
        Mock::given(method("POST"))
            .and(body_string_contains("BridgeEventAmounts"))
            .and(body_partial_json(json!({
                "variables": {"eventType": "WITHDRAW", "first": 20, "skip": skip}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(batch(n, skip as usize)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let aggregator = BatchScanAggregator::new(Arc::new(client(&mock_server)), 20);
    let filter = EventFilter::new(EventType::Withdraw, None);
    let result = aggregator
        .aggregate(&filter, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.count, 45);
    assert_eq!(result.sum.to_string(), "4.5");
    assert_eq!(request_bodies(&mock_server).await.len(), 3);
}

#[tokio::test]
async fn test_aggregate_failure_mid_scan() {
    let mock_server = setup_mock_server().await;

    let rows: Vec<Value> = (0..20).map(|i| json!({"id": i.to_string(), "amount": "1"})).collect();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"skip": 0}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bridgeEvents": rows}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"skip": 20}})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let aggregator = BatchScanAggregator::new(Arc::new(client(&mock_server)), 20);
    let filter = EventFilter::new(EventType::Withdraw, None);
    let err = aggregator
        .aggregate(&filter, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, IndexerError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_daily_stats() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(body_string_contains("dailyBridgeStats"))
        .and(body_partial_json(json!({
            "variables": {
                "first": 30,
                "orderBy": "date",
                "orderDirection": "asc",
                "startDate": "2024-05-01",
                "endDate": "2024-05-31"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"dailyBridgeStats": [{
                "id": "2024-05-01-tcg-WITHDRAW",
                "verseId": "1",
                "chainName": "tcg",
                "date": "2024-05-01",
                "eventType": "WITHDRAW",
                "total_amount": "12.5",
                "accumulated_amount": "340",
                "count": "4",
                "blockTime": "1714521600"
            }]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stats = client(&mock_server)
        .fetch_daily_stats(&DailyStatsQuery {
            first: 30,
            order_direction: OrderDirection::Asc,
            start_date: "2024-05-01".into(),
            end_date: "2024-05-31".into(),
        })
        .await
        .unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_amount, "12.5");
    assert_eq!(stats[0].event_type, EventType::Withdraw);
}
