use std::sync::Arc;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{
    dated_close, decode_document, diagnostic_field, invalid_value, parse_decimal, parse_document,
    require_key,
};
use crate::cache::ExpiringCache;
use crate::data_source::{ensure_limit, MarketDataClient, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpFetcher, HttpRequest};
use crate::policy::ProviderPolicy;
use crate::throttling::SlidingWindowLimiter;
use crate::{most_recent, PricePoint, ProviderId, Quote, Symbol};

const BASE_URL: &str = "https://api.twelvedata.com";
const MIN_OUTPUT_SIZE: usize = 10;
const MAX_OUTPUT_SIZE: usize = 200;

/// Twelve Data adapter.
///
/// History requests are rate limited and cached; the limiter and cache are
/// shared by every clone of one adapter.
#[derive(Clone)]
pub struct TwelveDataAdapter {
    fetcher: HttpFetcher,
    api_key: String,
    base_url: String,
    limiter: Arc<SlidingWindowLimiter>,
    history_cache: Arc<ExpiringCache<Vec<PricePoint>, SourceError>>,
}

impl TwelveDataAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_policy(
            HttpFetcher::default(),
            api_key,
            &ProviderPolicy::twelvedata_default(),
        )
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self::with_policy(
            HttpFetcher::new(http_client),
            api_key,
            &ProviderPolicy::twelvedata_default(),
        )
    }

    pub fn with_policy(
        fetcher: HttpFetcher,
        api_key: impl Into<String>,
        policy: &ProviderPolicy,
    ) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
            base_url: String::from(BASE_URL),
            limiter: Arc::new(SlidingWindowLimiter::from_policy(policy)),
            history_cache: Arc::new(ExpiringCache::new(policy.history_ttl)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Latest price from `/price`. Twelve Data reports no change percent there.
    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote, SourceError> {
        let request = self.request("/price")?.with_query("symbol", symbol.as_str());
        debug!("twelvedata price for {symbol}");

        let body = self.fetcher.get(request).await?;
        let response: PriceResponse = decode_checked(&body)?;
        let price = response
            .price
            .as_deref()
            .and_then(parse_decimal)
            .ok_or_else(|| SourceError::no_data(format!("twelvedata has no price for {symbol}")))?;

        Quote::new(price, None).map_err(|e| invalid_value(ProviderId::Twelvedata, e))
    }

    /// Daily closes from `/time_series`, ascending.
    ///
    /// The provider is asked for `limit` clamped to 10..=200 points; the cached
    /// series is then trimmed to the `limit` most recent.
    pub async fn daily_closes(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<PricePoint>, SourceError> {
        ensure_limit(ProviderId::Twelvedata, limit)?;
        let output_size = limit.clamp(MIN_OUTPUT_SIZE, MAX_OUTPUT_SIZE);
        let cache_key = history_cache_key(symbol, output_size);
        let request = self
            .request("/time_series")?
            .with_query("symbol", symbol.as_str())
            .with_query("interval", "1day")
            .with_query("outputsize", &output_size.to_string());

        let fetcher = self.fetcher.clone();
        let limiter = Arc::clone(&self.limiter);
        let label = symbol.to_string();
        let series = self
            .history_cache
            .get_or_create(&cache_key, move || async move {
                limiter.acquire().await;
                debug!("twelvedata time_series for {label} (outputsize {output_size})");
                let body = fetcher.get(request).await?;
                parse_time_series(&label, &body)
            })
            .await?;

        Ok(most_recent(series, limit))
    }

    fn request(&self, path: &str) -> Result<HttpRequest, SourceError> {
        let api_key = require_key(ProviderId::Twelvedata, &self.api_key)?;
        Ok(
            HttpRequest::get(format!("{}{path}", self.base_url)).with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.to_owned(),
            }),
        )
    }
}

impl MarketDataClient for TwelveDataAdapter {
    fn quote_provider(&self) -> ProviderId {
        ProviderId::Twelvedata
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

pub(crate) fn history_cache_key(symbol: &Symbol, output_size: usize) -> String {
    format!("TD:1day:{symbol}:{output_size}")
}

fn decode_checked<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    let document = parse_document(ProviderId::Twelvedata, body)?;
    if let Some(message) = diagnostic_field(&document, &["message"]) {
        return Err(SourceError::provider_message(message));
    }
    if document
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status.eq_ignore_ascii_case("error"))
    {
        return Err(SourceError::provider_message("twelvedata reported an unknown error"));
    }
    decode_document(ProviderId::Twelvedata, document)
}

fn parse_time_series(symbol: &str, body: &str) -> Result<Vec<PricePoint>, SourceError> {
    let response: TimeSeriesResponse = decode_checked(body)?;
    let mut points = response
        .values
        .unwrap_or_default()
        .iter()
        .map(|value| {
            dated_close(ProviderId::Twelvedata, &value.datetime, Some(value.close.as_str()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err(SourceError::no_data(format!(
            "twelvedata time series for {symbol} is empty"
        )));
    }

    points.sort_by_key(|point| point.ts);
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    close: String,
}
