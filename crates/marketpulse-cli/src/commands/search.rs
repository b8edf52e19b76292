use std::sync::Arc;
use std::time::Duration;

use marketpulse_core::{search_listings, ListingDirectoryService, StockListing};
use serde::Serialize;

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::{CommandOutcome, Context};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Serialize)]
struct SearchResponseData<'a> {
    query: &'a str,
    results: Vec<&'a StockListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

pub async fn run(args: &SearchArgs, context: &Context) -> Result<CommandOutcome, CliError> {
    if args.limit == 0 {
        return Err(CliError::Command(String::from(
            "--limit must be greater than zero",
        )));
    }

    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let service = ListingDirectoryService::new(
        Arc::new(context.builder.alphavantage()),
        Arc::new(context.store.clone()),
    );
    let max_age = Duration::from_secs(args.max_age_days.saturating_mul(SECONDS_PER_DAY));
    let loaded = service.load_or_fallback(max_age).await;

    let data = serde_json::to_value(SearchResponseData {
        query,
        results: search_listings(&loaded.listings, query, args.limit),
        notice: loaded.notice,
    })?;
    Ok(CommandOutcome::ok(data))
}
