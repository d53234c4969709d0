//! Valuation engine
//!
//! Converts a rupee amount into a human-readable equivalence under a
//! [`ValuationConfig`]. Every function here is pure and total; configurations
//! that cannot be valued (zero income, missing item cost) are rejected by
//! [`ValuationConfig::validate`] before any valuation happens.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Weeks per month in the work calendar approximation
pub const WEEKS_PER_MONTH: f64 = 4.33;
/// Working days per week
pub const WORKDAYS_PER_WEEK: f64 = 5.0;
/// Working hours per day
pub const HOURS_PER_WORKDAY: f64 = 7.0;
/// Length of a working career in years
pub const CAREER_YEARS: f64 = 35.0;
/// Working days per year (5 days x 52 weeks)
pub const WORKING_DAYS_PER_YEAR: f64 = 260.0;
/// Total working hours in a career
pub const CAREER_HOURS: f64 = CAREER_YEARS * WORKING_DAYS_PER_YEAR * HOURS_PER_WORKDAY;

const TIME_ICON: &str = "⏰";
const LIFE_ICON: &str = "📊";
const DEFAULT_ITEM_ICON: &str = "🛍️";

/// Keyword to icon table, first match wins
const ITEM_ICONS: &[(&str, &str)] = &[
    ("coffee", "☕"),
    ("pizza", "🍕"),
    ("burger", "🍔"),
    ("movie", "🎬"),
    ("ticket", "🎬"),
    ("book", "📚"),
    ("beer", "🍺"),
    ("drink", "🍺"),
    ("meal", "🍱"),
    ("food", "🍱"),
    ("ice cream", "🍦"),
    ("tea", "🍵"),
    ("snack", "🥟"),
    ("samosa", "🥟"),
];

/// Kind of equivalence to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConversionMode {
    /// Working time needed to earn the amount
    #[default]
    #[serde(rename = "time")]
    TimeToEarn,
    /// How many units of a chosen item the amount buys
    #[serde(rename = "item")]
    ItemEquivalence,
    /// Share of a whole working career
    #[serde(rename = "life")]
    LifePercentage,
}

impl ConversionMode {
    /// Wire name (`time`, `item`, `life`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimeToEarn => "time",
            Self::ItemEquivalence => "item",
            Self::LifePercentage => "life",
        }
    }
}

impl Display for ConversionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" | "time-to-earn" => Ok(Self::TimeToEarn),
            "item" | "item-equivalence" => Ok(Self::ItemEquivalence),
            "life" | "life-percentage" => Ok(Self::LifePercentage),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Configuration for one valuation pass
///
/// Field names on the wire follow the stored settings record
/// (`conversionMode`, `salary`, `itemName`, `itemCost`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Equivalence kind
    #[serde(rename = "conversionMode", alias = "mode")]
    pub mode: ConversionMode,
    /// Monthly income in rupees
    #[serde(rename = "salary", alias = "monthlyIncome")]
    pub monthly_income: f64,
    /// Item used by [`ConversionMode::ItemEquivalence`]
    #[serde(rename = "itemName")]
    pub item_name: String,
    /// Unit cost of the item in rupees
    #[serde(rename = "itemCost", alias = "itemUnitCost")]
    pub item_unit_cost: f64,
}

impl ValuationConfig {
    /// Default configuration (no income set)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With conversion mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    /// With monthly income
    #[inline]
    #[must_use]
    pub fn with_income(mut self, monthly_income: f64) -> Self {
        self.monthly_income = monthly_income;
        self
    }

    /// With item name and unit cost
    #[inline]
    #[must_use]
    pub fn with_item(mut self, name: impl Into<String>, unit_cost: f64) -> Self {
        self.item_name = name.into();
        self.item_unit_cost = unit_cost;
        self
    }

    /// Check the configuration can be valued against
    ///
    /// # Errors
    /// - [`ConfigError::NonPositiveIncome`] for a zero, negative or non-finite income
    /// - [`ConfigError::NonPositiveItemCost`] in item mode without a positive cost
    /// - [`ConfigError::EmptyItemName`] in item mode without an item name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.monthly_income.is_finite() && self.monthly_income > 0.0) {
            return Err(ConfigError::NonPositiveIncome(self.monthly_income));
        }
        if self.mode == ConversionMode::ItemEquivalence {
            if !(self.item_unit_cost.is_finite() && self.item_unit_cost > 0.0) {
                return Err(ConfigError::NonPositiveItemCost {
                    mode: self.mode,
                    cost: self.item_unit_cost,
                });
            }
            if self.item_name.trim().is_empty() {
                return Err(ConfigError::EmptyItemName(self.mode));
            }
        }
        Ok(())
    }

    /// Hourly rate derived from the monthly income
    #[inline]
    #[must_use]
    pub fn hourly_rate(&self) -> f64 {
        IncomeBreakdown::from_monthly(self.monthly_income).hourly
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::TimeToEarn,
            monthly_income: 0.0,
            item_name: "Coffee".to_string(),
            item_unit_cost: 150.0,
        }
    }
}

/// Monthly income split along the work calendar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    /// Per week
    pub weekly: f64,
    /// Per working day
    pub daily: f64,
    /// Per working hour
    pub hourly: f64,
}

impl IncomeBreakdown {
    /// Split a monthly income: `/ 4.33` weeks, `/ 5` days, `/ 7` hours
    #[must_use]
    pub fn from_monthly(monthly_income: f64) -> Self {
        let weekly = monthly_income / WEEKS_PER_MONTH;
        let daily = weekly / WORKDAYS_PER_WEEK;
        let hourly = daily / HOURS_PER_WORKDAY;
        Self {
            weekly,
            daily,
            hourly,
        }
    }
}

/// Computed equivalence for one amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Equivalence {
    /// Category icon
    pub icon: &'static str,
    /// Phrase without the icon, e.g. `1.9 hrs`
    pub text: String,
}

impl Display for Equivalence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.text)
    }
}

/// Equivalence of `amount` under `config`, icon included
///
/// The caller must have validated `config`; see [`ValuationConfig::validate`].
#[must_use]
pub fn equivalence(amount: f64, config: &ValuationConfig) -> String {
    valuate(amount, config).to_string()
}

/// Structured form of [`equivalence`]
#[must_use]
pub fn valuate(amount: f64, config: &ValuationConfig) -> Equivalence {
    match config.mode {
        ConversionMode::TimeToEarn => Equivalence {
            icon: TIME_ICON,
            text: time_to_earn(amount, config.hourly_rate()),
        },
        ConversionMode::ItemEquivalence => Equivalence {
            icon: item_icon(&config.item_name),
            text: item_equivalence(amount, config.item_unit_cost, &config.item_name),
        },
        ConversionMode::LifePercentage => Equivalence {
            icon: LIFE_ICON,
            text: life_percentage(amount, config.hourly_rate()),
        },
    }
}

/// Icon for an item name, by case-insensitive keyword
#[must_use]
pub fn item_icon(item_name: &str) -> &'static str {
    let lowered = item_name.to_lowercase();
    ITEM_ICONS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(DEFAULT_ITEM_ICON, |(_, icon)| *icon)
}

fn time_to_earn(amount: f64, hourly_rate: f64) -> String {
    let hours = amount / hourly_rate;
    if hours < 1.0 {
        let minutes = format!("{:.0}", (hours * 60.0).round());
        with_unit(&minutes, "min")
    } else if hours < 8.0 {
        with_unit(&format!("{hours:.1}"), "hr")
    } else {
        // Days use the 7-hour working day, same divisor as the hourly rate
        let days = hours / HOURS_PER_WORKDAY;
        if days >= 2.0 {
            format!("{days:.1} days")
        } else {
            format!("{days:.1} day")
        }
    }
}

fn item_equivalence(amount: f64, unit_cost: f64, item_name: &str) -> String {
    let quantity = format!("{:.1}", amount / unit_cost);
    let quantity = quantity.strip_suffix(".0").unwrap_or(&quantity);
    with_unit(quantity, item_name.trim())
}

fn life_percentage(amount: f64, hourly_rate: f64) -> String {
    let percentage = (amount / hourly_rate) / CAREER_HOURS * 100.0;
    if percentage < 0.001 {
        "< 0.001%".to_string()
    } else if percentage < 0.01 {
        format!("{percentage:.4}%")
    } else if percentage < 1.0 {
        format!("{percentage:.3}%")
    } else {
        format!("{percentage:.2}%")
    }
}

/// `1 hr`, `1.9 hrs`, `10 Coffees`: singular only when the shown quantity is one
///
/// Days follow their own rule in [`time_to_earn`].
fn with_unit(quantity: &str, unit: &str) -> String {
    if is_one(quantity) {
        format!("{quantity} {unit}")
    } else {
        format!("{quantity} {unit}s")
    }
}

fn is_one(quantity: &str) -> bool {
    matches!(quantity, "1" | "1.0")
}
