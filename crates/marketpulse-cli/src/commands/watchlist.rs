use log::info;
use marketpulse_core::{AddOutcome, JsonFileStore, Symbol, Watchlist};
use serde_json::json;

use crate::cli::{WatchlistArgs, WatchlistCommand};
use crate::error::CliError;

use super::{CommandOutcome, Context};

pub async fn run(args: &WatchlistArgs, context: &Context) -> Result<CommandOutcome, CliError> {
    let mut watchlist = Watchlist::load_or_seed(context.store.clone())?;

    let data = match &args.command {
        WatchlistCommand::List => json!({ "tickers": watchlist.tickers() }),
        WatchlistCommand::Add(add) => {
            let outcome = watchlist.add(&add.symbol, add.name.clone())?;
            json!({
                "added": outcome == AddOutcome::Added,
                "tickers": watchlist.tickers(),
            })
        }
        WatchlistCommand::Remove(remove) => {
            let symbols = parse_symbols(&remove.symbols)?;
            let removed = watchlist.remove_symbols(&symbols)?;
            json!({ "removed": removed, "tickers": watchlist.tickers() })
        }
        WatchlistCommand::Favorite(favorite) => {
            let symbol = Symbol::parse(&favorite.symbol)?;
            let Some(is_favorite) = watchlist.toggle_favorite(&symbol)? else {
                return Err(CliError::Command(format!("{symbol} is not on the watchlist")));
            };
            json!({ "symbol": symbol, "isFavorite": is_favorite })
        }
        WatchlistCommand::Refresh(refresh) => {
            return refresh_all(&mut watchlist, context, refresh.force).await;
        }
    };

    Ok(CommandOutcome::ok(data))
}

async fn refresh_all(
    watchlist: &mut Watchlist<JsonFileStore>,
    context: &Context,
    force: bool,
) -> Result<CommandOutcome, CliError> {
    let client = context.builder.build();
    let report = watchlist.refresh_all(client.as_ref(), force).await?;
    info!(
        "watchlist refresh: {} refreshed, {} skipped",
        report.refreshed.len(),
        report.skipped.len()
    );

    Ok(CommandOutcome::ok(json!({
        "report": report,
        "tickers": watchlist.tickers(),
    })))
}

fn parse_symbols(raw: &[String]) -> Result<Vec<Symbol>, CliError> {
    raw.iter()
        .map(|symbol| Symbol::parse(symbol).map_err(CliError::from))
        .collect()
}
