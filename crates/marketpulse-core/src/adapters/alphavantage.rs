use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;

use super::{
    dated_close, decode_document, diagnostic_field, invalid_value, parse_decimal, parse_document,
    parse_percent, require_key,
};
use crate::data_source::{ensure_limit, MarketDataClient, SourceError, SourceFuture};
use crate::directory::ListingFeed;
use crate::http_client::{HttpAuth, HttpClient, HttpFetcher, HttpRequest};
use crate::{most_recent, PricePoint, ProviderId, Quote, Symbol, SymbolSuggestion};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Top-level fields Alpha Vantage uses for rate-limit notices and errors.
const DIAGNOSTIC_FIELDS: &[&str] = &["Information", "Note", "Error Message"];

/// Alpha Vantage adapter: quotes, daily closes, symbol search and the listing CSV.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    fetcher: HttpFetcher,
    api_key: String,
    base_url: String,
}

impl AlphaVantageAdapter {
    /// Adapter backed by the reqwest transport.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            fetcher: HttpFetcher::default(),
            api_key: api_key.into(),
            base_url: String::from(BASE_URL),
        }
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            fetcher: HttpFetcher::new(http_client),
            ..Self::new(api_key)
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Latest price and change percent from `GLOBAL_QUOTE`.
    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote, SourceError> {
        let request = self.request("GLOBAL_QUOTE")?.with_query("symbol", symbol.as_str());
        debug!("alphavantage GLOBAL_QUOTE for {symbol}");

        let envelope: GlobalQuoteEnvelope = self.query_json(request).await?;
        let quote = envelope
            .global_quote
            .ok_or_else(|| SourceError::no_data(format!("alphavantage has no quote for {symbol}")))?;
        let price = quote
            .price
            .as_deref()
            .and_then(parse_decimal)
            .ok_or_else(|| SourceError::no_data(format!("alphavantage has no price for {symbol}")))?;
        let change_percent = quote.change_percent.as_deref().and_then(parse_percent);

        Quote::new(price, change_percent).map_err(|e| invalid_value(ProviderId::Alphavantage, e))
    }

    /// Most recent `limit` daily closes from `TIME_SERIES_DAILY`, ascending.
    pub async fn daily_closes(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        ensure_limit(ProviderId::Alphavantage, limit)?;
        let request = self
            .request("TIME_SERIES_DAILY")?
            .with_query("symbol", symbol.as_str());
        debug!("alphavantage TIME_SERIES_DAILY for {symbol}");

        let envelope: DailySeriesEnvelope = self.query_json(request).await?;
        let series = envelope.series.ok_or_else(|| {
            SourceError::no_data(format!("alphavantage has no daily series for {symbol}"))
        })?;

        let points = series
            .iter()
            .map(|(day, bar)| dated_close(ProviderId::Alphavantage, day, bar.close.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        if points.is_empty() {
            return Err(SourceError::no_data(format!(
                "alphavantage daily series for {symbol} is empty"
            )));
        }

        Ok(most_recent(points, limit))
    }

    /// `SYMBOL_SEARCH` matches ordered by descending match score.
    pub async fn search_symbols(&self, keywords: &str) -> Result<Vec<SymbolSuggestion>, SourceError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let request = self.request("SYMBOL_SEARCH")?.with_query("keywords", keywords);
        debug!("alphavantage SYMBOL_SEARCH for {keywords:?}");

        let envelope: SymbolSearchEnvelope = self.query_json(request).await?;
        let mut suggestions = envelope
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .filter_map(|hit| {
                Some(SymbolSuggestion {
                    symbol: hit.symbol?,
                    name: hit.name?,
                    kind: hit.kind,
                    region: hit.region,
                    currency: hit.currency,
                    match_score: hit.match_score.as_deref().and_then(parse_decimal),
                })
            })
            .collect::<Vec<_>>();

        suggestions.sort_by(|a, b| {
            let a = a.match_score.unwrap_or(0.0);
            let b = b.match_score.unwrap_or(0.0);
            b.total_cmp(&a)
        });
        Ok(suggestions)
    }

    /// Raw `LISTING_STATUS` CSV payload. `date` is `YYYY-MM-DD`.
    ///
    /// The body is returned untouched; a JSON envelope in place of CSV is
    /// detected by the directory service.
    pub async fn download_listing_csv(
        &self,
        state: &str,
        date: Option<&str>,
    ) -> Result<String, SourceError> {
        let mut request = self.request("LISTING_STATUS")?.with_query("state", state);
        if let Some(date) = date {
            request = request.with_query("date", date);
        }
        debug!("alphavantage LISTING_STATUS state={state}");

        self.fetcher.get(request).await
    }

    fn request(&self, function: &str) -> Result<HttpRequest, SourceError> {
        let api_key = require_key(ProviderId::Alphavantage, &self.api_key)?;
        Ok(HttpRequest::get(self.base_url.as_str())
            .with_query("function", function)
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.to_owned(),
            }))
    }

    async fn query_json<T: serde::de::DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, SourceError> {
        let body = self.fetcher.get(request).await?;
        let document = parse_document(ProviderId::Alphavantage, &body)?;
        if let Some(message) = diagnostic_field(&document, DIAGNOSTIC_FIELDS) {
            return Err(SourceError::provider_message(message));
        }
        decode_document(ProviderId::Alphavantage, document)
    }
}

impl MarketDataClient for AlphaVantageAdapter {
    fn quote_provider(&self) -> ProviderId {
        ProviderId::Alphavantage
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

impl ListingFeed for AlphaVantageAdapter {
    fn fetch_listing_csv(&self) -> SourceFuture<'_, String> {
        Box::pin(self.download_listing_csv("active", None))
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteEnvelope {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailySeriesEnvelope {
    #[serde(rename = "Time Series (Daily)", default)]
    series: Option<BTreeMap<String, DailyBar>>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SymbolSearchEnvelope {
    #[serde(rename = "bestMatches", default)]
    best_matches: Option<Vec<SymbolMatch>>,
}

#[derive(Debug, Deserialize)]
struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    symbol: Option<String>,
    #[serde(rename = "2. name")]
    name: Option<String>,
    #[serde(rename = "3. type")]
    kind: Option<String>,
    #[serde(rename = "4. region")]
    region: Option<String>,
    #[serde(rename = "8. currency")]
    currency: Option<String>,
    #[serde(rename = "9. matchScore")]
    match_score: Option<String>,
}
