use marketpulse_core::{Quote, Symbol};
use serde::Serialize;

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::{CommandOutcome, Context};

#[derive(Debug, Serialize)]
struct QuoteResponseData {
    client: &'static str,
    quotes: Vec<SymbolQuote>,
    errors: Vec<SymbolFailure>,
}

#[derive(Debug, Serialize)]
struct SymbolQuote {
    symbol: Symbol,
    #[serde(flatten)]
    quote: Quote,
}

#[derive(Debug, Serialize)]
struct SymbolFailure {
    symbol: Symbol,
    code: &'static str,
    message: String,
    retryable: bool,
}

pub async fn run(args: &QuoteArgs, context: &Context) -> Result<CommandOutcome, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let client = context.builder.build();
    let mut quotes = Vec::new();
    let mut errors = Vec::new();

    for symbol in symbols {
        let fetched = client.fetch_quote(&symbol).await;
        match fetched {
            Ok(quote) => quotes.push(SymbolQuote { symbol, quote }),
            Err(error) if args.symbols.len() == 1 => {
                return Err(error.into());
            }
            Err(error) => errors.push(SymbolFailure {
                code: error.code(),
                message: error.message().to_owned(),
                retryable: error.retryable(),
                symbol,
            }),
        }
    }

    let partial_failure = !errors.is_empty();
    let data = serde_json::to_value(QuoteResponseData {
        client: context.builder.selection().display_name(),
        quotes,
        errors,
    })?;
    Ok(CommandOutcome::ok(data).with_partial_failure(partial_failure))
}
