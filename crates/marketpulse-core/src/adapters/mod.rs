mod alphavantage;
mod finnhub;
mod twelvedata;

pub use alphavantage::AlphaVantageAdapter;
pub use finnhub::FinnhubAdapter;
pub use twelvedata::TwelveDataAdapter;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{PricePoint, ProviderId, SourceError, UtcDateTime, ValidationError};

/// Trimmed key, or `MissingApiKey` when blank.
pub(crate) fn require_key(provider: ProviderId, key: &str) -> Result<&str, SourceError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SourceError::missing_api_key(provider));
    }
    Ok(key)
}

/// First step of response handling: any JSON document is accepted.
pub(crate) fn parse_document(provider: ProviderId, body: &str) -> Result<Value, SourceError> {
    serde_json::from_str(body)
        .map_err(|e| SourceError::decode(format!("{provider} returned malformed JSON: {e}")))
}

/// Second step: decode the success schema from an already-vetted document.
pub(crate) fn decode_document<T: DeserializeOwned>(
    provider: ProviderId,
    document: Value,
) -> Result<T, SourceError> {
    serde_json::from_value(document)
        .map_err(|e| SourceError::decode(format!("{provider} response did not match schema: {e}")))
}

/// First string field among `fields` present in a top-level JSON object.
pub(crate) fn diagnostic_field(document: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| document.get(*field).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Parses provider decimal strings such as `"187.4400"`.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses percent strings: `"-1.1650%"` is `-1.165`, `"+0.30%"` and `"0.30%"` are `0.30`.
pub(crate) fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let without_sign = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let unsigned = without_sign.strip_prefix('+').unwrap_or(without_sign);
    parse_decimal(unsigned)
}

/// A provider value that fails domain validation is a malformed response.
pub(crate) fn invalid_value(provider: ProviderId, error: ValidationError) -> SourceError {
    SourceError::decode(format!("{provider} returned an invalid value: {error}"))
}

/// One dated close from string fields. Any bad field rejects the whole series.
pub(crate) fn dated_close(
    provider: ProviderId,
    date: &str,
    close: Option<&str>,
) -> Result<PricePoint, SourceError> {
    let ts = UtcDateTime::parse_provider_date(date).map_err(|e| invalid_value(provider, e))?;
    let close = close.and_then(parse_decimal).ok_or_else(|| {
        SourceError::decode(format!("{provider} returned a non-numeric close for {date}"))
    })?;
    PricePoint::new(ts, close).map_err(|e| invalid_value(provider, e))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

    /// Replays canned responses in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        pub(crate) fn with_bodies(bodies: &[&str]) -> Self {
            let client = Self::default();
            for body in bodies {
                client.push(Ok(HttpResponse::ok_json(*body)));
            }
            client
        }

        pub(crate) fn push(&self, response: Result<HttpResponse, HttpError>) {
            self.responses
                .lock()
                .expect("response queue should not be poisoned")
                .push_back(response);
        }

        pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self
                .responses
                .lock()
                .expect("response queue should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("no canned response left")));
            Box::pin(async move { response })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    #[test]
    fn bad_series_values_are_decode_errors() {
        let negative = dated_close(ProviderId::Twelvedata, "2024-03-15", Some("-1.0"))
            .expect_err("negative close");
        assert_eq!(negative.kind(), SourceErrorKind::Decode);

        let garbled = dated_close(ProviderId::Alphavantage, "2024-03-15", Some("n/a"))
            .expect_err("garbled close");
        assert_eq!(garbled.kind(), SourceErrorKind::Decode);

        let undated = dated_close(ProviderId::Alphavantage, "15/03/2024", Some("1.0"))
            .expect_err("bad date");
        assert_eq!(undated.kind(), SourceErrorKind::Decode);

        let point = dated_close(ProviderId::Twelvedata, "2024-03-15 15:59:00", Some("172.62"))
            .expect("valid point");
        assert_eq!(point.close, 172.62);
    }

    #[test]
    fn parses_signed_and_unsigned_percentages() {
        assert_eq!(parse_percent("-1.1650%"), Some(-1.165));
        assert_eq!(parse_percent("+0.30%"), Some(0.30));
        assert_eq!(parse_percent("0.30%"), Some(0.30));
        assert_eq!(parse_percent(" 2.5 % "), Some(2.5));
        assert_eq!(parse_percent("n/a"), None);
    }

    #[test]
    fn blank_key_is_missing() {
        let error = require_key(ProviderId::Twelvedata, "  ").expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::MissingApiKey);
        assert_eq!(require_key(ProviderId::Twelvedata, " k ").ok(), Some("k"));
    }

    #[test]
    fn diagnostic_field_uses_first_present_field() {
        let document: Value =
            serde_json::from_str(r#"{"Note": "slow down", "Error Message": "bad"}"#).expect("json");
        assert_eq!(
            diagnostic_field(&document, &["Information", "Note", "Error Message"]).as_deref(),
            Some("slow down")
        );
        assert!(diagnostic_field(&document, &["message"]).is_none());
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let error = parse_document(ProviderId::Finnhub, "<html>").expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Decode);
    }
}
