use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_test::TestServer;
use equitix::analysis::Analyzer;
use equitix::config::SignalConfig;
use equitix::core::http::{create_router, AppState, HealthStatus};
use equitix::metrics::Metrics;
use equitix::services::yahoo::YahooFinanceClient;
use equitix::store::MemorySignalStore;
use tokio::sync::RwLock;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper structure bundling together the HTTP server and mocked upstream.
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
    pub market_data: MockServer,
}

impl TestApp {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;
        mock_chart_history(&mock_server).await;
        mock_calendar_events(&mock_server).await;

        let config = SignalConfig::default();
        let client = Arc::new(
            YahooFinanceClient::new(&config)
                .with_base_url(mock_server.uri())
                .with_retry_delay(Duration::from_millis(10)),
        );

        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let store = Arc::new(MemorySignalStore::new());
        let analyzer = Arc::new(
            Analyzer::new(store, client.clone(), client, config).with_metrics(metrics.clone()),
        );

        let state = AppState {
            analyzer,
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics: metrics.clone(),
            start_time: Arc::new(Instant::now()),
        };

        let router = create_router(state);
        let server = TestServer::new(router).expect("start test server");

        Self {
            server,
            metrics,
            market_data: mock_server,
        }
    }
}

/// Sixty rising daily closes; enough history for every indicator window.
pub fn chart_body() -> serde_json::Value {
    let count = 60;
    let timestamps: Vec<i64> = (0..count).map(|i| 1_600_000_000 + i * 86_400).collect();
    let closes: Vec<f64> = (0..count).map(|i| 100.0 + i as f64 * 0.5).collect();
    let opens = closes.clone();
    let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
    let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
    let volumes: Vec<u64> = (0..count).map(|_| 1_000_000).collect();

    serde_json::json!({
        "chart": {
            "result": [{
                "meta": { "symbol": "TEST" },
                "timestamp": timestamps,
                "indicators": {
                    "quote": [{
                        "open": opens,
                        "high": highs,
                        "low": lows,
                        "close": closes,
                        "volume": volumes
                    }]
                }
            }],
            "error": null
        }
    })
}

/// Serve history for any well-formed symbol. Symbols containing digits fall
/// through to wiremock's default 404, which the client maps to NoData.
pub async fn mock_chart_history(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/v8/finance/chart/[A-Z.-]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
        .mount(server)
        .await;
}

/// Serve an event-free calendar for every symbol.
pub async fn mock_calendar_events(server: &MockServer) {
    let body = serde_json::json!({
        "quoteSummary": {
            "result": [{ "calendarEvents": {} }],
            "error": null
        }
    });

    Mock::given(method("GET"))
        .and(path_regex(r"^/v10/finance/quoteSummary/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
