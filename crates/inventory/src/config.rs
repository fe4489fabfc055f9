//! Ledger tuning knobs.

use chrono::NaiveDate;
use tracing::warn;

/// Quantity tolerance, in the stock unit of the product.
pub const DEFAULT_EPSILON: f64 = 0.001;

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Float tolerance for "nothing left" / "nothing missing".
    pub epsilon: f64,
    /// Expiry stamped on count surplus batches so FEFO picks them last.
    pub surplus_expiry: NaiveDate,
    /// Prefix of lots received at the end of a transfer.
    pub transfer_lot_prefix: String,
    /// Prefix of production output lots.
    pub production_lot_prefix: String,
    /// Prefix of count surplus lots.
    pub adjustment_lot_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            surplus_expiry: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
            transfer_lot_prefix: "TR".to_string(),
            production_lot_prefix: "PROD".to_string(),
            adjustment_lot_prefix: "INV".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `FISHLEDGER_EPSILON` / `FISHLEDGER_SURPLUS_EXPIRY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LedgerConfig::from_env`] with an explicit variable source.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("FISHLEDGER_EPSILON") {
            match raw.trim().parse::<f64>() {
                Ok(eps) if eps.is_finite() && eps > 0.0 => config.epsilon = eps,
                _ => warn!(value = %raw, "ignoring invalid FISHLEDGER_EPSILON"),
            }
        }

        if let Some(raw) = lookup("FISHLEDGER_SURPLUS_EXPIRY") {
            match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => config.surplus_expiry = date,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid FISHLEDGER_SURPLUS_EXPIRY"),
            }
        }

        config
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_surplus_expiry(mut self, expiry: NaiveDate) -> Self {
        self.surplus_expiry = expiry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.surplus_expiry, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
        assert_eq!(config.transfer_lot_prefix, "TR");
    }

    #[test]
    fn lookup_overrides_valid_values() {
        let vars = HashMap::from([
            ("FISHLEDGER_EPSILON", "0.0001"),
            ("FISHLEDGER_SURPLUS_EXPIRY", "2099-01-01"),
        ]);
        let config = LedgerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.epsilon, 0.0001);
        assert_eq!(config.surplus_expiry, NaiveDate::from_ymd_opt(2099, 1, 1).unwrap());
    }

    #[test]
    fn lookup_ignores_garbage() {
        let vars = HashMap::from([
            ("FISHLEDGER_EPSILON", "-3"),
            ("FISHLEDGER_SURPLUS_EXPIRY", "tomorrow"),
        ]);
        let config = LedgerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config, LedgerConfig::default());
    }
}
