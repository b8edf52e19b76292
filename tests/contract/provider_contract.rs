//! Behavior every provider adapter shares behind `MarketDataClient`.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use marketpulse_core::{
    AlphaVantageAdapter, FinnhubAdapter, HttpError, MarketDataClient, ProviderId, SourceErrorKind,
    TwelveDataAdapter,
};

use support::{symbol, ScriptedHttpClient};

struct ProviderCase {
    id: ProviderId,
    quote_body: &'static str,
    history_body: &'static str,
    diagnostic_body: &'static str,
    diagnostic_message: &'static str,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Alphavantage,
            quote_body: r#"{"Global Quote": {"05. price": "187.44", "10. change percent": "+0.50%"}}"#,
            history_body: r#"{"Time Series (Daily)": {
                "2024-03-13": {"4. close": "171.13"},
                "2024-03-15": {"4. close": "172.62"},
                "2024-03-14": {"4. close": "173.00"}
            }}"#,
            diagnostic_body: r#"{"Information": "Thank you for using Alpha Vantage!"}"#,
            diagnostic_message: "Thank you for using Alpha Vantage!",
        },
        ProviderCase {
            id: ProviderId::Finnhub,
            quote_body: r#"{"c": 187.44, "d": 0.93, "dp": 0.5, "h": 188.1, "l": 185.2}"#,
            history_body: r#"{"s": "ok",
                "t": [1710288000, 1710374400, 1710460800],
                "c": [171.13, 173.00, 172.62]}"#,
            diagnostic_body: r#"{"error": "You don't have access to this resource."}"#,
            diagnostic_message: "You don't have access to this resource.",
        },
        ProviderCase {
            id: ProviderId::Twelvedata,
            quote_body: r#"{"price": "187.44000"}"#,
            history_body: r#"{"meta": {"symbol": "AAPL"}, "values": [
                {"datetime": "2024-03-15", "close": "172.62"},
                {"datetime": "2024-03-14", "close": "173.00"},
                {"datetime": "2024-03-13", "close": "171.13"}
            ], "status": "ok"}"#,
            diagnostic_body: r#"{"code": 429, "message": "You have run out of API credits", "status": "error"}"#,
            diagnostic_message: "You have run out of API credits",
        },
    ]
}

fn client_for(id: ProviderId, http: Arc<ScriptedHttpClient>, key: &str) -> Arc<dyn MarketDataClient> {
    match id {
        ProviderId::Alphavantage => Arc::new(AlphaVantageAdapter::with_http_client(http, key)),
        ProviderId::Finnhub => Arc::new(FinnhubAdapter::with_http_client(http, key)),
        ProviderId::Twelvedata => Arc::new(TwelveDataAdapter::with_http_client(http, key)),
    }
}

/// Every adapter talks to a single host, so one catch-all route answers all calls.
fn answering(body: &str) -> Arc<ScriptedHttpClient> {
    Arc::new(ScriptedHttpClient::new().route("https://", body))
}

#[tokio::test]
async fn quotes_decode_to_positive_prices() {
    for case in provider_cases() {
        let client = client_for(case.id, answering(case.quote_body), "key");

        let quote = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .unwrap_or_else(|e| panic!("{}: {e}", case.id));

        assert_eq!(quote.price, 187.44, "{}", case.id);
        assert_eq!(client.quote_provider(), case.id);
    }
}

#[tokio::test]
async fn history_is_ascending_and_trimmed_to_limit() {
    for case in provider_cases() {
        let client = client_for(case.id, answering(case.history_body), "key");

        let closes = client
            .fetch_daily_closes(&symbol("AAPL"), 2)
            .await
            .unwrap_or_else(|e| panic!("{}: {e}", case.id));

        let values = closes.iter().map(|point| point.close).collect::<Vec<_>>();
        assert_eq!(values, vec![173.00, 172.62], "{}", case.id);
        assert!(closes[0].ts < closes[1].ts, "{}", case.id);
    }
}

#[tokio::test]
async fn blank_key_fails_before_any_request() {
    for case in provider_cases() {
        let http = answering(case.quote_body);
        let client = client_for(case.id, Arc::clone(&http), "   ");

        let error = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("blank key must fail");

        assert_eq!(error.kind(), SourceErrorKind::MissingApiKey, "{}", case.id);
        assert!(http.requests().is_empty(), "{}", case.id);
    }
}

#[tokio::test]
async fn zero_limit_is_an_invalid_request() {
    for case in provider_cases() {
        let http = answering(case.history_body);
        let client = client_for(case.id, Arc::clone(&http), "key");

        let error = client
            .fetch_daily_closes(&symbol("AAPL"), 0)
            .await
            .expect_err("zero limit must fail");

        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest, "{}", case.id);
        assert!(http.requests().is_empty(), "{}", case.id);
    }
}

#[tokio::test]
async fn diagnostic_documents_become_provider_messages() {
    for case in provider_cases() {
        let client = client_for(case.id, answering(case.diagnostic_body), "key");

        let error = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("diagnostic must fail");

        assert_eq!(error.kind(), SourceErrorKind::ProviderMessage, "{}", case.id);
        assert_eq!(error.message(), case.diagnostic_message, "{}", case.id);
    }
}

#[tokio::test]
async fn non_json_bodies_are_decode_errors() {
    for case in provider_cases() {
        let client = client_for(case.id, answering("<html>maintenance</html>"), "key");

        let error = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("html must fail");

        assert_eq!(error.kind(), SourceErrorKind::Decode, "{}", case.id);
    }
}

#[tokio::test]
async fn server_errors_carry_status_and_are_retryable() {
    for case in provider_cases() {
        let http = Arc::new(ScriptedHttpClient::new().route_status("https://", 503, "upstream down"));
        let client = client_for(case.id, http, "key");

        let error = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("503 must fail");

        assert_eq!(error.kind(), SourceErrorKind::HttpStatus, "{}", case.id);
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.body(), Some("upstream down"));
        assert!(error.retryable());
    }
}

#[tokio::test]
async fn transport_failures_are_retryable() {
    for case in provider_cases() {
        let http = Arc::new(
            ScriptedHttpClient::new().route_response("https://", Err(HttpError::new("connection reset"))),
        );
        let client = client_for(case.id, http, "key");

        let error = client
            .fetch_quote(&symbol("AAPL"))
            .await
            .expect_err("transport must fail");

        assert_eq!(error.kind(), SourceErrorKind::Transport, "{}", case.id);
        assert!(error.retryable());
    }
}

#[tokio::test]
async fn api_keys_never_appear_in_logged_urls() {
    for case in provider_cases() {
        let http = answering(case.quote_body);
        let client = client_for(case.id, Arc::clone(&http), "secret-key");

        client.fetch_quote(&symbol("AAPL")).await.expect("quote");

        let requests = http.requests();
        let request = &requests[0];
        assert!(!request.redacted_url().contains("secret-key"), "{}", case.id);
    }
}
