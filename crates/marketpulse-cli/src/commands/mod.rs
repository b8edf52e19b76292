mod history;
mod lookup;
mod quote;
mod search;
mod watchlist;

use std::path::Path;

use log::debug;
use marketpulse_core::{JsonFileStore, MarketDataClientBuilder};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandOutcome {
    pub data: Value,
    /// Some items failed while others succeeded.
    pub partial_failure: bool,
}

impl CommandOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            partial_failure: false,
        }
    }

    pub fn with_partial_failure(mut self, partial_failure: bool) -> Self {
        self.partial_failure = partial_failure;
        self
    }
}

/// Shared state handed to every command.
pub struct Context {
    pub builder: MarketDataClientBuilder,
    pub store: JsonFileStore,
}

impl Context {
    fn new(data_dir: &Path) -> Self {
        Self {
            builder: MarketDataClientBuilder::from_env(),
            store: JsonFileStore::new(data_dir),
        }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    let context = Context::new(&cli.data_dir);
    debug!(
        "data dir {}, client {}",
        context.store.dir().display(),
        context.builder.selection().display_name()
    );

    match &cli.command {
        Command::Quote(args) => quote::run(args, &context).await,
        Command::History(args) => history::run(args, &context).await,
        Command::Lookup(args) => lookup::run(args, &context).await,
        Command::Search(args) => search::run(args, &context).await,
        Command::Watchlist(args) => watchlist::run(args, &context).await,
    }
}
