//! Perspective Core
//!
//! Pure building blocks of the price perspective engine:
//! - [`scanner`]: finds rupee amounts in free-form text
//! - [`valuation`]: turns an amount into a time, item or career equivalence
//!
//! # Example
//!
//! ```rust
//! use perspective_core::{detect, equivalence, ValuationConfig};
//!
//! let config = ValuationConfig::new().with_income(100_000.0);
//! let price = detect("Now only ₹1,234").unwrap();
//! assert_eq!(equivalence(price.amount, &config), "⏰ 1.9 hrs");
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod scanner;
pub mod valuation;

pub use error::ConfigError;
pub use scanner::{
    detect, has_currency_marker, is_price_like, parse_amount, scan, MatchSource, PriceMatch,
    MAX_AMOUNT, MIN_AMOUNT,
};
pub use valuation::{
    equivalence, item_icon, valuate, ConversionMode, Equivalence, IncomeBreakdown,
    ValuationConfig, CAREER_HOURS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
