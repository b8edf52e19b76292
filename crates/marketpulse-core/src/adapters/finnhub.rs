use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use super::{decode_document, diagnostic_field, invalid_value, parse_document, require_key};
use crate::data_source::{ensure_limit, MarketDataClient, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpFetcher, HttpRequest};
use crate::{most_recent, PricePoint, ProviderId, Quote, Symbol, UtcDateTime};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const DEFAULT_LOOKBACK_DAYS: i64 = 180;

/// Finnhub adapter. Authenticates with the `X-Finnhub-Token` header.
#[derive(Clone)]
pub struct FinnhubAdapter {
    fetcher: HttpFetcher,
    token: String,
    base_url: String,
    lookback_days: i64,
}

impl FinnhubAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            fetcher: HttpFetcher::default(),
            token: token.into(),
            base_url: String::from(BASE_URL),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, token: impl Into<String>) -> Self {
        Self {
            fetcher: HttpFetcher::new(http_client),
            ..Self::new(token)
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Calendar days of history requested from the candle endpoint.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = i64::from(days.max(1));
        self
    }

    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote, SourceError> {
        let request = self.request("/quote")?.with_query("symbol", symbol.as_str());
        debug!("finnhub quote for {symbol}");

        let response: QuoteResponse = self.query_json(request).await?;
        // Unknown symbols are answered with all-zero fields.
        let price = response
            .c
            .filter(|price| *price > 0.0)
            .ok_or_else(|| SourceError::no_data(format!("finnhub has no quote for {symbol}")))?;

        Quote::new(price, response.dp).map_err(|e| invalid_value(ProviderId::Finnhub, e))
    }

    pub async fn daily_closes(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        ensure_limit(ProviderId::Finnhub, limit)?;
        let to = UtcDateTime::now();
        let from = to.saturating_sub(time::Duration::days(self.lookback_days));
        let request = self
            .request("/stock/candle")?
            .with_query("symbol", symbol.as_str())
            .with_query("resolution", "D")
            .with_query("from", &from.unix_seconds().to_string())
            .with_query("to", &to.unix_seconds().to_string());
        debug!("finnhub stock/candle for {symbol}");

        let response: CandleResponse = self.query_json(request).await?;
        if response.s.as_deref() != Some("ok") {
            let status = response.s.as_deref().unwrap_or("no status");
            return Err(SourceError::provider_message(format!(
                "finnhub reported {status} for {symbol}"
            )));
        }

        let closes = response.c.unwrap_or_default();
        let times = response.t.unwrap_or_default();
        if closes.is_empty() || closes.len() != times.len() {
            return Err(SourceError::no_data(format!(
                "finnhub candles for {symbol} are empty or misaligned ({} closes, {} timestamps)",
                closes.len(),
                times.len()
            )));
        }

        let points = times
            .into_iter()
            .zip(closes)
            .map(|(seconds, close)| {
                let ts = UtcDateTime::from_unix_seconds(seconds)?;
                PricePoint::new(ts, close)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid_value(ProviderId::Finnhub, e))?;

        Ok(most_recent(points, limit))
    }

    fn request(&self, path: &str) -> Result<HttpRequest, SourceError> {
        let token = require_key(ProviderId::Finnhub, &self.token)?;
        Ok(
            HttpRequest::get(format!("{}{path}", self.base_url)).with_auth(&HttpAuth::Header {
                name: String::from("X-Finnhub-Token"),
                value: token.to_owned(),
            }),
        )
    }

    async fn query_json<T: serde::de::DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, SourceError> {
        let body = self.fetcher.get(request).await?;
        let document = parse_document(ProviderId::Finnhub, &body)?;
        if let Some(message) = diagnostic_field(&document, &["error"]) {
            return Err(SourceError::provider_message(message));
        }
        decode_document(ProviderId::Finnhub, document)
    }
}

impl MarketDataClient for FinnhubAdapter {
    fn quote_provider(&self) -> ProviderId {
        ProviderId::Finnhub
    }

    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote> {
        Box::pin(self.quote(symbol))
    }

    fn fetch_daily_closes<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: usize,
    ) -> SourceFuture<'a, Vec<PricePoint>> {
        Box::pin(self.daily_closes(symbol, limit))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    c: Option<f64>,
    dp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    c: Option<Vec<f64>>,
    t: Option<Vec<i64>>,
    s: Option<String>,
}
