use marketpulse_core::SymbolSuggestion;
use serde::Serialize;

use crate::cli::LookupArgs;
use crate::error::CliError;

use super::{CommandOutcome, Context};

#[derive(Debug, Serialize)]
struct LookupResponseData {
    keywords: String,
    results: Vec<SymbolSuggestion>,
}

pub async fn run(args: &LookupArgs, context: &Context) -> Result<CommandOutcome, CliError> {
    let keywords = args.keywords.trim();
    if keywords.is_empty() {
        return Err(CliError::Command(String::from("keywords must not be empty")));
    }

    let results = context.builder.alphavantage().search_symbols(keywords).await?;
    let data = serde_json::to_value(LookupResponseData {
        keywords: keywords.to_owned(),
        results,
    })?;
    Ok(CommandOutcome::ok(data))
}
