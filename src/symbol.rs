//! Charting-platform ticker → exchange symbol normalization

use crate::common::types::Exchange;

/// Returned for empty input so callers always get a symbol
pub const UNDEFINED_SYMBOL: &str = "UNDEFINED";

/// Quote currencies that need no suffix
const QUOTE_SUFFIXES: [&str; 3] = ["USDT", "USDC", "BUSD"];

/// Contracts listed with a denomination multiplier on both exchanges
const SHARED_REMAP: &[(&str, &str)] = &[
    ("PEPEUSDT", "1000PEPEUSDT"),
    ("BONKUSDT", "1000BONKUSDT"),
    ("FLOKIUSDT", "1000FLOKIUSDT"),
];

const BINANCE_REMAP: &[(&str, &str)] = &[
    ("SHIBUSDT", "1000SHIBUSDT"),
    ("LUNCUSDT", "1000LUNCUSDT"),
    ("XECUSDT", "1000XECUSDT"),
    ("SATSUSDT", "1000SATSUSDT"),
    ("RATSUSDT", "1000RATSUSDT"),
];

const BYBIT_REMAP: &[(&str, &str)] = &[
    ("SHIBUSDT", "SHIB1000USDT"),
    ("LUNCUSDT", "1000LUNCUSDT"),
    ("XECUSDT", "1000XECUSDT"),
];

/// Normalize a ticker using only the remaps shared by every exchange
pub fn normalize(raw: &str) -> String {
    remap(&canonicalize(raw), &[SHARED_REMAP])
}

/// Normalize a ticker into `exchange`'s listed symbol
pub fn normalize_for(exchange: Exchange, raw: &str) -> String {
    let specific = match exchange {
        Exchange::Binance => BINANCE_REMAP,
        Exchange::Bybit => BYBIT_REMAP,
    };
    remap(&canonicalize(raw), &[specific, SHARED_REMAP])
}

/// Strip venue prefix and contract suffixes, force a USD-stable quote
fn canonicalize(raw: &str) -> String {
    let raw = raw.trim();
    let without_venue = raw.rsplit(':').next().unwrap_or(raw);
    let mut symbol = without_venue.trim().to_uppercase();

    if let Some(stripped) = symbol.strip_suffix(".P") {
        symbol = stripped.to_string();
    }
    if let Some(stripped) = symbol.strip_suffix("PERP") {
        symbol = stripped.trim_end_matches(['-', '_']).to_string();
    }
    symbol = symbol.replace('/', "");

    if symbol.is_empty() {
        return UNDEFINED_SYMBOL.to_string();
    }

    if !QUOTE_SUFFIXES.iter().any(|quote| symbol.ends_with(quote)) {
        match symbol.strip_suffix("USD") {
            Some(base) => symbol = format!("{}USDT", base),
            None => symbol.push_str("USDT"),
        }
    }

    symbol
}

fn remap(symbol: &str, tables: &[&[(&str, &str)]]) -> String {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .find(|(from, _)| *from == symbol)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| symbol.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("BINANCE:PEPEUSDT.P"), "1000PEPEUSDT");
        assert_eq!(normalize("BTCUSD"), "BTCUSDT");
        assert_eq!(normalize(""), UNDEFINED_SYMBOL);
        assert_eq!(normalize("   "), UNDEFINED_SYMBOL);
    }

    #[test]
    fn test_strips_prefix_suffix_and_separator() {
        assert_eq!(normalize("BYBIT:ETHUSDT.P"), "ETHUSDT");
        assert_eq!(normalize("COINBASE:ETH/USD"), "ETHUSDT");
        assert_eq!(normalize("btcusdt.p"), "BTCUSDT");
        assert_eq!(normalize("BTC-PERP"), "BTCUSDT");
        assert_eq!(normalize("SOLUSDTPERP"), "SOLUSDT");
    }

    #[test]
    fn test_appends_quote_when_missing() {
        assert_eq!(normalize("SOL"), "SOLUSDT");
        assert_eq!(normalize("ETHUSDC"), "ETHUSDC");
        assert_eq!(normalize("BNBBUSD"), "BNBBUSD");
    }

    #[test]
    fn test_exchange_specific_remap() {
        assert_eq!(normalize_for(Exchange::Binance, "SHIBUSDT.P"), "1000SHIBUSDT");
        assert_eq!(normalize_for(Exchange::Bybit, "SHIBUSDT.P"), "SHIB1000USDT");
        assert_eq!(normalize_for(Exchange::Bybit, "BINANCE:PEPEUSDT.P"), "1000PEPEUSDT");
        assert_eq!(normalize_for(Exchange::Binance, "BTCUSDT"), "BTCUSDT");
        assert_eq!(normalize("SHIBUSDT"), "SHIBUSDT");
    }

    #[test]
    fn test_only_prefix_is_sentinel() {
        assert_eq!(normalize("BINANCE:"), UNDEFINED_SYMBOL);
    }
}
