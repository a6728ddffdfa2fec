use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies accepted by the gateway, identified by their ISO 4217
/// numeric codes (the wire format Redsys expects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro (numeric code 978, 2 decimal places)
    EUR,
    /// Pound Sterling (numeric code 826, 2 decimal places)
    GBP,
    /// US Dollar (numeric code 840, 2 decimal places)
    USD,
}

impl Currency {
    /// ISO 4217 numeric code as the gateway expects it on the wire
    pub fn numeric_code(&self) -> &'static str {
        match self {
            Currency::EUR => "978",
            Currency::GBP => "826",
            Currency::USD => "840",
        }
    }

    /// Resolve a currency from its ISO numeric code
    pub fn from_numeric(code: &str) -> Option<Self> {
        match code {
            "978" => Some(Currency::EUR),
            "826" => Some(Currency::GBP),
            "840" => Some(Currency::USD),
            _ => None,
        }
    }

    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        2
    }

    /// Convert an amount in minor units (centavos) to major units
    pub fn from_minor_units(&self, minor: i64) -> Decimal {
        Decimal::new(minor, self.scale())
    }

    /// Convert a major-unit amount to the integer minor units the
    /// gateway expects; rejects amounts with sub-cent precision
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64, String> {
        let scaled = amount * Decimal::from(10i64.pow(self.scale()));
        if scaled.fract() != Decimal::ZERO {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self,
                self.scale(),
                amount
            ));
        }
        scaled
            .trunc()
            .to_i64()
            .ok_or_else(|| format!("Amount out of range: {}", amount))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::EUR => write!(f, "EUR"),
            Currency::GBP => write!(f, "GBP"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}
