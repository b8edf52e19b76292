//! Market data client trait and the shared error classification.
//!
//! Every provider adapter implements [`MarketDataClient`]; callers never need
//! to know which wire protocol sits behind it.
//!
//! | Method | Response | Description |
//! |--------|----------|-------------|
//! | [`fetch_quote`](MarketDataClient::fetch_quote) | [`Quote`] | Latest price and change percent |
//! | [`fetch_daily_closes`](MarketDataClient::fetch_daily_closes) | `Vec<PricePoint>` | Ascending daily closes |
//!
//! # Example
//!
//! ```rust,ignore
//! use marketpulse_core::{MarketDataClient, SourceError, Symbol};
//!
//! async fn show(client: &dyn MarketDataClient) -> Result<(), SourceError> {
//!     let symbol = Symbol::parse("AAPL")?;
//!     let quote = client.fetch_quote(&symbol).await?;
//!     println!("{symbol}: {:.2}", quote.price);
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::cache::CacheError;
use crate::{PricePoint, ProviderId, Quote, Symbol, ValidationError};

/// Boxed future returned by client methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Connection, DNS, TLS or timeout failure before a response arrived.
    Transport,
    /// Non-2xx response; see [`SourceError::status`] and [`SourceError::body`].
    HttpStatus,
    /// Body did not match the expected JSON schema.
    Decode,
    /// Well-formed response carrying a provider diagnostic (rate limit, bad key, note).
    ProviderMessage,
    /// Schema decoded but the required data is absent.
    NoData,
    /// The provider's API key is not configured.
    MissingApiKey,
    InvalidRequest,
    Internal,
}

/// Structured error returned by market data clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    status: Option<u16>,
    body: Option<String>,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Transport, message)
    }

    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            kind: SourceErrorKind::HttpStatus,
            message: format!("HTTP {status}: {body}"),
            status: Some(status),
            body: Some(body),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Decode, message)
    }

    /// Provider diagnostic text, kept verbatim so it can be shown to users.
    pub fn provider_message(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::ProviderMessage, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NoData, message)
    }

    pub fn missing_api_key(provider: ProviderId) -> Self {
        Self::new(
            SourceErrorKind::MissingApiKey,
            format!("{} API key is not configured", provider.display_name()),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Whether repeating the same call later may succeed.
    pub const fn retryable(&self) -> bool {
        match self.kind {
            SourceErrorKind::Transport => true,
            SourceErrorKind::HttpStatus => matches!(
                self.status,
                Some(408) | Some(429) | Some(500..=599)
            ),
            _ => false,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::HttpStatus => "source.http_status",
            SourceErrorKind::Decode => "source.decode",
            SourceErrorKind::ProviderMessage => "source.provider_message",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::MissingApiKey => "source.missing_api_key",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}

impl From<CacheError> for SourceError {
    fn from(error: CacheError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Uniform quote/history capability implemented by every provider adapter.
///
/// Implementations must be `Send + Sync`; one client is typically shared by
/// many concurrent tasks.
pub trait MarketDataClient: Send + Sync {
    /// Provider answering quote requests.
    fn quote_provider(&self) -> ProviderId;

    /// Provider answering history requests.
    fn history_provider(&self) -> ProviderId {
        self.quote_provider()
    }

    /// Fetches the latest price and, when the provider reports it, the change percent.
    ///
    /// # Errors
    ///
    /// Any [`SourceErrorKind`]; soft provider errors surface as
    /// [`SourceErrorKind::ProviderMessage`] even on HTTP 200.
    fn fetch_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote>;

    /// Fetches daily closes, ascending by timestamp, keeping the most recent `limit`.
    ///
    /// # Errors
    ///
    /// [`SourceErrorKind::InvalidRequest`] when `limit` is zero, otherwise as
    /// for [`fetch_quote`](MarketDataClient::fetch_quote).
    fn fetch_daily_closes<'a>(
        &'a self,
        symbol: &'a Symbol,
        limit: usize,
    ) -> SourceFuture<'a, Vec<PricePoint>>;
}

pub(crate) fn ensure_limit(provider: ProviderId, limit: usize) -> Result<(), SourceError> {
    if limit == 0 {
        return Err(SourceError::invalid_request(format!(
            "{provider} history limit must be greater than zero"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_error_carries_status_and_body() {
        let error = SourceError::http_status(429, "slow down");
        assert_eq!(error.kind(), SourceErrorKind::HttpStatus);
        assert_eq!(error.status(), Some(429));
        assert_eq!(error.body(), Some("slow down"));
        assert!(error.retryable());
        assert_eq!(error.to_string(), "HTTP 429: slow down (source.http_status)");
    }

    #[test]
    fn provider_message_is_not_retryable() {
        let error = SourceError::provider_message("Thank you for using Alpha Vantage!");
        assert_eq!(error.code(), "source.provider_message");
        assert!(!error.retryable());
    }

    #[test]
    fn zero_limit_is_invalid() {
        let error = ensure_limit(ProviderId::Finnhub, 0).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("limit"));
    }
}
