//! Parser for the `LISTING_STATUS` CSV payload.
//!
//! Schema: `symbol,name,exchange,assetType,ipoDate,delistingDate,status`.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::StockListing;

const MIN_COLUMNS: usize = 7;

fn reader(payload: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(payload.as_bytes())
}

/// Splits the first CSV record of `line` into its fields.
pub fn split_line(line: &str) -> Vec<String> {
    reader(line, false)
        .records()
        .next()
        .and_then(Result::ok)
        .map(|record| record.iter().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Whether the payload begins with the expected header row.
pub fn has_listing_header(payload: &str) -> bool {
    let head = payload
        .get(..payload.len().min(16))
        .unwrap_or(payload)
        .to_ascii_lowercase();
    head.starts_with("symbol,") || head.starts_with("\"symbol\",")
}

/// Parses every data row after the header.
///
/// Blank lines, malformed records, rows with fewer than seven columns and
/// rows with a blank symbol or name are skipped. Symbols are upper-cased.
pub fn parse_listings(payload: &str) -> Vec<StockListing> {
    reader(payload, true)
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| listing_from_record(&record))
        .collect()
}

fn listing_from_record(record: &StringRecord) -> Option<StockListing> {
    if record.len() < MIN_COLUMNS {
        return None;
    }
    let column = |index: usize| record.get(index).unwrap_or_default().to_owned();

    let symbol = column(0).to_uppercase();
    let name = column(1);
    if symbol.is_empty() || name.is_empty() {
        return None;
    }
    Some(StockListing {
        symbol,
        name,
        exchange: column(2),
        asset_type: column(3),
        status: column(6),
    })
}
