//! Fakes shared by the integration test targets.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use marketpulse_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, MarketDataClient, PricePoint, ProviderId,
    Quote, SourceError, SourceFuture, Symbol,
};

type CannedResponse = Result<HttpResponse, HttpError>;

/// Answers requests by URL fragment and records every request it sees.
///
/// Routes are matched in registration order and can be hit any number of times.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<(String, CannedResponse)>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Duration,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every response is held back by `delay` of tokio time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn route(self, fragment: &str, body: &str) -> Self {
        self.route_response(fragment, Ok(HttpResponse::ok_json(body)))
    }

    pub fn route_status(self, fragment: &str, status: u16, body: &str) -> Self {
        self.route_response(
            fragment,
            Ok(HttpResponse {
                status,
                body: body.to_owned(),
            }),
        )
    }

    pub fn route_response(self, fragment: &str, response: CannedResponse) -> Self {
        self.routes
            .lock()
            .expect("routes should not be poisoned")
            .push((fragment.to_owned(), response));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("requests should not be poisoned")
            .clone()
    }

    pub fn request_count(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url.contains(fragment))
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .lock()
            .expect("routes should not be poisoned")
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                Err(HttpError::new(format!("no route for {}", request.redacted_url())))
            });
        self.requests
            .lock()
            .expect("requests should not be poisoned")
            .push(request);

        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }
}

/// In-process client with a fixed quote per symbol.
pub struct StubMarketClient {
    provider: ProviderId,
    quotes: HashMap<String, Result<Quote, SourceError>>,
    history: Vec<PricePoint>,
    calls: Mutex<Vec<String>>,
}

impl StubMarketClient {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            quotes: HashMap::new(),
            history: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_quote(mut self, symbol: &str, price: f64, change_percent: Option<f64>) -> Self {
        let quote = Quote::new(price, change_percent).expect("valid quote");
        self.quotes.insert(symbol.to_owned(), Ok(quote));
        self
    }

    pub fn with_failure(mut self, symbol: &str, error: SourceError) -> Self {
        self.quotes.insert(symbol.to_owned(), Err(error));
        self
    }

    pub fn with_history(mut self, history: Vec<PricePoint>) -> Self {
        self.history = history;
        self
    }

    /// `"quote:AAPL"` / `"history:AAPL:5"` entries in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls should not be poisoned").clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .expect("calls should not be poisoned")
            .push(call);
    }
}

impl MarketDataClient for StubMarketClient {
    fn quote_provider(&self) -> ProviderId {
        self.provider
    }

    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote> {
        self.record(format!("quote:{symbol}"));
        let outcome = self
            .quotes
            .get(symbol.as_str())
            .cloned()
            .unwrap_or_else(|| Err(SourceError::no_data(format!("no stub quote for {symbol}"))));
        Box::pin(async move { outcome })
    }

    fn fetch_daily_closes<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: usize,
    ) -> SourceFuture<'a, Vec<PricePoint>> {
        self.record(format!("history:{symbol}:{limit}"));
        let history = self.history.clone();
        Box::pin(async move { Ok(history) })
    }
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}
