//! Watchlist and initial holdings parsed from configuration.
//!
//! Symbols are given as `AAPL:175.50,MSFT:378.90` (symbol and opening
//! price). Holdings are given as `AAPL:10@170.25` (symbol, shares, average
//! cost).

use std::collections::HashSet;

use super::holding::Holding;

/// Opening quotes used when no watchlist is configured.
pub const DEFAULT_WATCHLIST: &[(&str, f64)] = &[
    ("AAPL", 175.50),
    ("GOOGL", 2845.20),
    ("MSFT", 378.90),
    ("TSLA", 245.67),
    ("AMZN", 3456.78),
    ("NVDA", 456.32),
    ("META", 324.15),
    ("NFLX", 456.78),
];

#[derive(Debug, Clone, PartialEq)]
pub struct WatchEntry {
    pub symbol: String,
    pub opening_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Watchlist {
    pub entries: Vec<WatchEntry>,
}

impl Watchlist {
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.symbol.clone()).collect()
    }

    pub fn default_market() -> Self {
        Watchlist {
            entries: DEFAULT_WATCHLIST
                .iter()
                .map(|(symbol, price)| WatchEntry {
                    symbol: (*symbol).to_string(),
                    opening_price: *price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("malformed entry '{0}'")]
    Malformed(String),

    #[error("invalid price in '{0}'")]
    InvalidPrice(String),

    #[error("invalid share count in '{0}'")]
    InvalidShares(String),
}

fn split_tokens(input: &str) -> Result<Vec<&str>, WatchlistError> {
    input
        .split(',')
        .map(|token| {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                Err(WatchlistError::EmptyToken)
            } else {
                Ok(trimmed)
            }
        })
        .collect()
}

fn parse_symbol(raw: &str, token: &str) -> Result<String, WatchlistError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
        return Err(WatchlistError::Malformed(token.to_string()));
    }
    Ok(symbol)
}

fn parse_price(raw: &str, token: &str) -> Result<f64, WatchlistError> {
    match raw.trim().parse::<f64>() {
        Ok(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(WatchlistError::InvalidPrice(token.to_string())),
    }
}

pub fn parse_symbols(input: &str) -> Result<Watchlist, WatchlistError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in split_tokens(input)? {
        let (symbol, price) = token
            .split_once(':')
            .ok_or_else(|| WatchlistError::Malformed(token.to_string()))?;
        let symbol = parse_symbol(symbol, token)?;
        let opening_price = parse_price(price, token)?;

        if !seen.insert(symbol.clone()) {
            return Err(WatchlistError::DuplicateSymbol(symbol));
        }
        entries.push(WatchEntry {
            symbol,
            opening_price,
        });
    }

    Ok(Watchlist { entries })
}

/// Holdings start valued at their average cost until the first tick arrives.
pub fn parse_holdings(input: &str) -> Result<Vec<Holding>, WatchlistError> {
    let mut holdings = Vec::new();
    let mut seen = HashSet::new();

    for token in split_tokens(input)? {
        let (symbol, rest) = token
            .split_once(':')
            .ok_or_else(|| WatchlistError::Malformed(token.to_string()))?;
        let (shares, cost) = rest
            .split_once('@')
            .ok_or_else(|| WatchlistError::Malformed(token.to_string()))?;

        let symbol = parse_symbol(symbol, token)?;
        let shares = match shares.trim().parse::<i64>() {
            Ok(s) if s > 0 => s,
            _ => return Err(WatchlistError::InvalidShares(token.to_string())),
        };
        let avg_cost = parse_price(cost, token)?;

        if !seen.insert(symbol.clone()) {
            return Err(WatchlistError::DuplicateSymbol(symbol));
        }
        holdings.push(Holding {
            symbol,
            shares,
            avg_cost,
            current_price: avg_cost,
        });
    }

    Ok(holdings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_basic() {
        let list = parse_symbols("AAPL:175.50,MSFT:378.90").unwrap();
        assert_eq!(list.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(list.entries[0].opening_price, 175.50);
    }

    #[test]
    fn test_parse_symbols_with_whitespace_and_case() {
        let list = parse_symbols("  aapl : 1.5 , msft:2 ").unwrap();
        assert_eq!(list.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(list.entries[1].opening_price, 2.0);
    }

    #[test]
    fn test_parse_symbols_empty_token() {
        assert_eq!(
            parse_symbols("AAPL:1,,MSFT:2"),
            Err(WatchlistError::EmptyToken)
        );
    }

    #[test]
    fn test_parse_symbols_duplicate() {
        let result = parse_symbols("AAPL:1,MSFT:2,aapl:3");
        assert!(matches!(result, Err(WatchlistError::DuplicateSymbol(s)) if s == "AAPL"));
    }

    #[test]
    fn test_parse_symbols_rejects_bad_prices() {
        assert!(matches!(
            parse_symbols("AAPL:0"),
            Err(WatchlistError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_symbols("AAPL:abc"),
            Err(WatchlistError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_symbols("AAPL"),
            Err(WatchlistError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_holdings() {
        let holdings = parse_holdings("AAPL:10@170.25, msft:5@365.50").unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].symbol, "AAPL");
        assert_eq!(holdings[0].shares, 10);
        assert_eq!(holdings[0].avg_cost, 170.25);
        assert_eq!(holdings[0].current_price, 170.25);
        assert_eq!(holdings[1].symbol, "MSFT");
    }

    #[test]
    fn test_parse_holdings_rejects_bad_entries() {
        assert!(matches!(
            parse_holdings("AAPL:0@1.0"),
            Err(WatchlistError::InvalidShares(_))
        ));
        assert!(matches!(
            parse_holdings("AAPL:10"),
            Err(WatchlistError::Malformed(_))
        ));
        assert!(matches!(
            parse_holdings("AAPL:10@-1"),
            Err(WatchlistError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_holdings("AAPL:1@1,AAPL:2@2"),
            Err(WatchlistError::DuplicateSymbol(_))
        ));
    }

    #[test]
    fn test_default_market() {
        let list = Watchlist::default_market();
        assert_eq!(list.count(), 8);
        assert_eq!(list.entries[0].symbol, "AAPL");
    }
}
