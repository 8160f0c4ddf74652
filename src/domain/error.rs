//! Domain error types.

/// Top-level error type for livefolio.
#[derive(Debug, thiserror::Error)]
pub enum LivefolioError {
    #[error("invalid tick for {symbol}: price {price} must be positive")]
    InvalidTick { symbol: String, price: f64 },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("market data error: {reason}")]
    MarketData { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LivefolioError {
    pub(crate) fn invalid_order(reason: impl Into<String>) -> Self {
        LivefolioError::InvalidOrder {
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        LivefolioError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LivefolioError> for std::process::ExitCode {
    fn from(err: &LivefolioError) -> Self {
        let code: u8 = match err {
            LivefolioError::Io(_) => 1,
            LivefolioError::ConfigParse { .. }
            | LivefolioError::ConfigMissing { .. }
            | LivefolioError::ConfigInvalid { .. } => 2,
            LivefolioError::MarketData { .. } => 3,
            LivefolioError::InvalidTick { .. } => 4,
            LivefolioError::InvalidOrder { .. } | LivefolioError::InsufficientShares { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_shares_message() {
        let err = LivefolioError::InsufficientShares {
            symbol: "AAPL".into(),
            requested: 30,
            held: 20,
        };
        assert_eq!(
            err.to_string(),
            "insufficient shares of AAPL: requested 30, held 20"
        );
    }

    #[test]
    fn config_invalid_helper() {
        let err = LivefolioError::config_invalid("feed", "jitter", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid config value [feed] jitter: must be non-negative"
        );
    }

    #[test]
    fn io_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LivefolioError = io.into();
        assert!(matches!(err, LivefolioError::Io(_)));
    }
}
