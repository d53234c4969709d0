//! Error types for the valuation layer
//!
//! Malformed amounts are never errors: the scanner reports them as `None`.
//! The only failure this crate surfaces is a configuration that cannot be
//! valued against.

use crate::valuation::ConversionMode;

/// Invalid valuation configuration
///
/// Returned before any tree mutation happens, so a rejected request never
/// leaves partial annotations behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Monthly income is zero, negative or not a number
    #[error("monthly income must be a positive amount (got {0})")]
    NonPositiveIncome(f64),

    /// Item mode selected without a usable item cost
    #[error("item cost must be a positive amount in {mode} mode (got {cost})")]
    NonPositiveItemCost {
        /// Mode that required the cost
        mode: ConversionMode,
        /// Rejected cost
        cost: f64,
    },

    /// Item mode selected without an item name
    #[error("item name must not be empty in {0} mode")]
    EmptyItemName(ConversionMode),

    /// Mode string not recognised
    #[error("unknown conversion mode: {0}")]
    UnknownMode(String),
}

