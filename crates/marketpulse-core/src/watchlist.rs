use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_source::{MarketDataClient, SourceError};
use crate::error::StoreError;
use crate::policy::RefreshPolicy;
use crate::store::WatchlistStore;
use crate::{Symbol, UtcDateTime, ValidationError};

/// One watched instrument with its last observed quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: Symbol,
    pub name: Option<String>,
    pub last_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub last_updated: Option<UtcDateTime>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Ticker {
    pub fn new(symbol: Symbol, name: Option<String>) -> Self {
        Self {
            symbol,
            name,
            last_price: None,
            change_percent: None,
            last_updated: None,
            is_favorite: false,
        }
    }

    fn refreshed_recently(&self, now: UtcDateTime, interval: std::time::Duration) -> bool {
        self.last_updated
            .is_some_and(|updated| now.since(updated) < interval)
    }
}

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Symbols touched by [`Watchlist::refresh_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub refreshed: Vec<Symbol>,
    pub skipped: Vec<Symbol>,
}

/// Ordered, persisted list of tickers. Every mutation is saved immediately.
#[derive(Debug)]
pub struct Watchlist<S: WatchlistStore> {
    store: S,
    tickers: Vec<Ticker>,
    policy: RefreshPolicy,
}

impl<S: WatchlistStore> Watchlist<S> {
    /// Loads the saved list; an empty store is seeded with AAPL and MSFT.
    pub fn load_or_seed(store: S) -> Result<Self, WatchlistError> {
        let mut tickers = store.load()?;
        if tickers.is_empty() {
            tickers = vec![
                Ticker::new(Symbol::parse("AAPL")?, Some(String::from("Apple"))),
                Ticker::new(Symbol::parse("MSFT")?, Some(String::from("Microsoft"))),
            ];
            store.save(&tickers)?;
            info!("seeded empty watchlist with default tickers");
        }

        Ok(Self {
            store,
            tickers,
            policy: RefreshPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&Ticker> {
        self.tickers.iter().find(|ticker| &ticker.symbol == symbol)
    }

    /// Appends a ticker. An existing symbol only gains a name it was missing.
    pub fn add(&mut self, raw: &str, name: Option<String>) -> Result<AddOutcome, WatchlistError> {
        let symbol = Symbol::parse(raw)?;

        let outcome = match self.tickers.iter_mut().find(|t| t.symbol == symbol) {
            Some(existing) => {
                if existing.name.is_none() {
                    existing.name = name;
                }
                AddOutcome::AlreadyPresent
            }
            None => {
                self.tickers.push(Ticker::new(symbol, name));
                AddOutcome::Added
            }
        };

        self.store.save(&self.tickers)?;
        Ok(outcome)
    }

    /// Removes every listed symbol and returns how many tickers were dropped.
    pub fn remove_symbols(&mut self, symbols: &[Symbol]) -> Result<usize, WatchlistError> {
        let doomed = symbols.iter().collect::<HashSet<_>>();
        let before = self.tickers.len();
        self.tickers.retain(|ticker| !doomed.contains(&ticker.symbol));

        self.store.save(&self.tickers)?;
        Ok(before - self.tickers.len())
    }

    /// Flips the favorite flag. Returns the new state, or `None` for an unknown symbol.
    pub fn toggle_favorite(&mut self, symbol: &Symbol) -> Result<Option<bool>, WatchlistError> {
        let Some(ticker) = self.tickers.iter_mut().find(|t| &t.symbol == symbol) else {
            return Ok(None);
        };
        ticker.is_favorite = !ticker.is_favorite;
        let state = ticker.is_favorite;

        self.store.save(&self.tickers)?;
        Ok(Some(state))
    }

    /// Fetches fresh quotes for every ticker in order.
    ///
    /// Tickers refreshed within the policy's minimum interval are skipped
    /// unless `force` is set. Network requests are spaced by the pacing delay.
    ///
    /// # Errors
    ///
    /// The first failure stops the walk; tickers updated before it stay saved.
    pub async fn refresh_all(
        &mut self,
        client: &dyn MarketDataClient,
        force: bool,
    ) -> Result<RefreshReport, WatchlistError> {
        let mut report = RefreshReport::default();

        for index in 0..self.tickers.len() {
            let symbol = self.tickers[index].symbol.clone();
            if !force
                && self.tickers[index]
                    .refreshed_recently(UtcDateTime::now(), self.policy.min_refresh_interval)
            {
                report.skipped.push(symbol);
                continue;
            }

            if !report.refreshed.is_empty() {
                tokio::time::sleep(self.policy.pacing_delay).await;
            }

            debug!("refreshing {symbol}");
            let quote = client.fetch_quote(&symbol).await?;
            let ticker = &mut self.tickers[index];
            ticker.last_price = Some(quote.price);
            ticker.change_percent = quote.change_percent;
            ticker.last_updated = Some(UtcDateTime::now());
            self.store.save(&self.tickers)?;

            report.refreshed.push(symbol);
        }

        Ok(report)
    }
}
