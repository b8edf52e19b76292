use std::env;
use std::sync::Arc;

use log::debug;

use crate::adapters::{AlphaVantageAdapter, FinnhubAdapter, TwelveDataAdapter};
use crate::data_source::{MarketDataClient, SourceFuture};
use crate::http_client::{HttpClient, HttpFetcher, ReqwestHttpClient};
use crate::policy::ProviderPolicy;
use crate::{PricePoint, ProviderId, Quote, Symbol};

/// Sends quotes to one client and history to another.
///
/// Calls are forwarded unchanged: no merging, no fallback between the two.
#[derive(Clone)]
pub struct HybridClient {
    quotes: Arc<dyn MarketDataClient>,
    history: Arc<dyn MarketDataClient>,
}

impl HybridClient {
    pub fn new(quotes: Arc<dyn MarketDataClient>, history: Arc<dyn MarketDataClient>) -> Self {
        Self { quotes, history }
    }
}

impl MarketDataClient for HybridClient {
    fn quote_provider(&self) -> ProviderId {
        self.quotes.quote_provider()
    }

    fn history_provider(&self) -> ProviderId {
        self.history.history_provider()
    }

    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote> {
        self.quotes.fetch_quote(symbol)
    }

    fn fetch_daily_closes<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: usize,
    ) -> SourceFuture<'a, Vec<PricePoint>> {
        self.history.fetch_daily_closes(symbol, limit)
    }
}

/// Provider API keys. Blank values are treated as absent.
///
/// # Environment Variables
///
/// | Provider | Primary Env Var | Fallback Env Var |
/// |----------|----------------|------------------|
/// | Finnhub | `MARKETPULSE_FINNHUB_API_KEY` | `FINNHUB_API_KEY` |
/// | Twelve Data | `MARKETPULSE_TWELVEDATA_API_KEY` | `TWELVEDATA_API_KEY` |
/// | Alpha Vantage | `MARKETPULSE_ALPHAVANTAGE_API_KEY` | `ALPHAVANTAGE_API_KEY` |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderKeys {
    pub finnhub: Option<String>,
    pub twelvedata: Option<String>,
    pub alphavantage: Option<String>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves keys through `lookup`, preferring the `MARKETPULSE_` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let resolve = |provider: ProviderId| {
            let suffix = format!("{}_API_KEY", provider.as_str().to_ascii_uppercase());
            [format!("MARKETPULSE_{suffix}"), suffix]
                .iter()
                .find_map(|name| normalize_key(lookup(name)))
        };

        Self {
            finnhub: resolve(ProviderId::Finnhub),
            twelvedata: resolve(ProviderId::Twelvedata),
            alphavantage: resolve(ProviderId::Alphavantage),
        }
    }

    pub fn with_finnhub(mut self, key: impl Into<String>) -> Self {
        self.finnhub = normalize_key(Some(key.into()));
        self
    }

    pub fn with_twelvedata(mut self, key: impl Into<String>) -> Self {
        self.twelvedata = normalize_key(Some(key.into()));
        self
    }

    pub fn with_alphavantage(mut self, key: impl Into<String>) -> Self {
        self.alphavantage = normalize_key(Some(key.into()));
        self
    }
}

fn normalize_key(key: Option<String>) -> Option<String> {
    key.map(|key| key.trim().to_owned())
        .filter(|key| !key.is_empty())
}

/// Which client the configured keys select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSelection {
    /// Finnhub quotes, Twelve Data history.
    Hybrid,
    Finnhub,
    AlphaVantage,
}

impl ClientSelection {
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Hybrid => "Finnhub (quote) + TwelveData (chart)",
            Self::Finnhub => "Finnhub",
            Self::AlphaVantage => "AlphaVantage",
        }
    }
}

/// Builds the effective [`MarketDataClient`] from the available keys.
///
/// # Example
///
/// ```rust,ignore
/// use marketpulse_core::MarketDataClientBuilder;
///
/// let builder = MarketDataClientBuilder::from_env();
/// println!("using {}", builder.selection().display_name());
/// let client = builder.build();
/// ```
#[derive(Clone)]
pub struct MarketDataClientBuilder {
    keys: ProviderKeys,
    http_client: Arc<dyn HttpClient>,
    twelvedata_policy: ProviderPolicy,
    finnhub_lookback_days: Option<u32>,
}

impl MarketDataClientBuilder {
    pub fn new(keys: ProviderKeys) -> Self {
        Self {
            keys,
            http_client: Arc::new(ReqwestHttpClient::new()),
            twelvedata_policy: ProviderPolicy::twelvedata_default(),
            finnhub_lookback_days: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderKeys::from_env())
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn with_twelvedata_policy(mut self, policy: ProviderPolicy) -> Self {
        self.twelvedata_policy = policy;
        self
    }

    pub fn with_finnhub_lookback_days(mut self, days: u32) -> Self {
        self.finnhub_lookback_days = Some(days);
        self
    }

    pub fn keys(&self) -> &ProviderKeys {
        &self.keys
    }

    pub fn selection(&self) -> ClientSelection {
        match (&self.keys.finnhub, &self.keys.twelvedata) {
            (Some(_), Some(_)) => ClientSelection::Hybrid,
            (Some(_), None) => ClientSelection::Finnhub,
            _ => ClientSelection::AlphaVantage,
        }
    }

    /// Alpha Vantage adapter for search and the listing feed. A missing key
    /// surfaces as `MissingApiKey` on first use.
    pub fn alphavantage(&self) -> AlphaVantageAdapter {
        AlphaVantageAdapter::with_http_client(
            Arc::clone(&self.http_client),
            self.keys.alphavantage.clone().unwrap_or_default(),
        )
    }

    pub fn build(&self) -> Arc<dyn MarketDataClient> {
        let selection = self.selection();
        debug!("market data client: {}", selection.display_name());

        match selection {
            ClientSelection::Hybrid => Arc::new(HybridClient::new(
                Arc::new(self.finnhub()),
                Arc::new(self.twelvedata()),
            )),
            ClientSelection::Finnhub => Arc::new(self.finnhub()),
            ClientSelection::AlphaVantage => Arc::new(self.alphavantage()),
        }
    }

    fn finnhub(&self) -> FinnhubAdapter {
        let adapter = FinnhubAdapter::with_http_client(
            Arc::clone(&self.http_client),
            self.keys.finnhub.clone().unwrap_or_default(),
        );
        match self.finnhub_lookback_days {
            Some(days) => adapter.with_lookback_days(days),
            None => adapter,
        }
    }

    fn twelvedata(&self) -> TwelveDataAdapter {
        TwelveDataAdapter::with_policy(
            HttpFetcher::new(Arc::clone(&self.http_client)),
            self.keys.twelvedata.clone().unwrap_or_default(),
            &self.twelvedata_policy,
        )
    }
}
