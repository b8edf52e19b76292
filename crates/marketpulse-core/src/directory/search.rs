use crate::StockListing;

/// Autocomplete over the directory.
///
/// Symbol-prefix matches come first, in directory order, followed by
/// name-contains matches not already included. Stops at `limit`.
pub fn search_listings<'a>(
    listings: &'a [StockListing],
    query: &str,
    limit: usize,
) -> Vec<&'a StockListing> {
    let query = query.trim().to_uppercase();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut hits: Vec<&StockListing> = listings
        .iter()
        .filter(|listing| listing.symbol.to_uppercase().starts_with(&query))
        .take(limit)
        .collect();

    for listing in listings {
        if hits.len() >= limit {
            break;
        }
        if listing.name.to_uppercase().contains(&query) && !hits.contains(&listing) {
            hits.push(listing);
        }
    }
    hits
}

/// Popular US listings used when the directory cannot be loaded.
pub fn fallback_listings() -> Vec<StockListing> {
    const ITEMS: &[(&str, &str, &str, &str)] = &[
        ("AAPL", "Apple Inc.", "NASDAQ", "Stock"),
        ("MSFT", "Microsoft Corp.", "NASDAQ", "Stock"),
        ("GOOGL", "Alphabet Inc. (Class A)", "NASDAQ", "Stock"),
        ("AMZN", "Amazon.com Inc.", "NASDAQ", "Stock"),
        ("NVDA", "NVIDIA Corp.", "NASDAQ", "Stock"),
        ("META", "Meta Platforms Inc.", "NASDAQ", "Stock"),
        ("TSLA", "Tesla Inc.", "NASDAQ", "Stock"),
        ("AMD", "Advanced Micro Devices", "NASDAQ", "Stock"),
        ("INTC", "Intel Corp.", "NASDAQ", "Stock"),
        ("NFLX", "Netflix Inc.", "NASDAQ", "Stock"),
        ("UBER", "Uber Technologies", "NYSE", "Stock"),
        ("KO", "Coca-Cola Co", "NYSE", "Stock"),
        ("JPM", "JPMorgan Chase & Co", "NYSE", "Stock"),
        ("V", "Visa Inc.", "NYSE", "Stock"),
        ("MA", "Mastercard Inc.", "NYSE", "Stock"),
        ("SPY", "SPDR S&P 500 ETF Trust", "NYSEARCA", "ETF"),
        ("QQQ", "Invesco QQQ Trust", "NASDAQ", "ETF"),
    ];

    ITEMS
        .iter()
        .map(|(symbol, name, exchange, asset_type)| StockListing {
            symbol: (*symbol).to_owned(),
            name: (*name).to_owned(),
            exchange: (*exchange).to_owned(),
            asset_type: (*asset_type).to_owned(),
            status: String::from("Active"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_prefix_matches_precede_name_matches() {
        let listings = fallback_listings();

        let hits = search_listings(&listings, " ma ", 10);
        let symbols = hits.iter().map(|l| l.symbol.as_str()).collect::<Vec<_>>();
        // Mastercard also matches by name but is not repeated.
        assert_eq!(symbols, vec!["MA", "AMZN"]);
    }

    #[test]
    fn respects_limit_and_empty_query() {
        let listings = fallback_listings();
        assert_eq!(listings.len(), 17);

        assert_eq!(search_listings(&listings, "a", 2).len(), 2);
        assert!(search_listings(&listings, "   ", 10).is_empty());
    }
}
