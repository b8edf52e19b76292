use marketpulse_core::{PricePoint, ProviderId, Symbol};
use serde::Serialize;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::{CommandOutcome, Context};

#[derive(Debug, Serialize)]
struct HistoryResponseData {
    symbol: Symbol,
    provider: ProviderId,
    closes: Vec<PricePoint>,
}

pub async fn run(args: &HistoryArgs, context: &Context) -> Result<CommandOutcome, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let client = context.builder.build();

    let closes = client.fetch_daily_closes(&symbol, args.limit).await?;
    let data = serde_json::to_value(HistoryResponseData {
        provider: client.history_provider(),
        symbol,
        closes,
    })?;
    Ok(CommandOutcome::ok(data))
}
