//! Amount type for holding monetary values exactly.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Amounts are never represented as
//! binary floating point once parsed, so sums over them are exact.

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents the amount of a bill.
///
/// Equality is numeric. The scale the value was parsed with only shows in `to_string()`, so
/// `"5400.50"` is written back as `"5400.50"`.
///
/// ```
/// # use cashbook::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("5400.50").unwrap();
/// let b = Amount::from_str("5400.5").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "5400.50");
/// assert_eq!(b.to_string(), "5400.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(AmountErrorKind);

enum AmountErrorKind {
    Empty,
    Decimal(rust_decimal::Error),
}

impl AmountError {
    pub(crate) fn empty() -> Self {
        Self(AmountErrorKind::Empty)
    }
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            AmountErrorKind::Empty => f.write_str("Empty"),
            AmountErrorKind::Decimal(e) => Debug::fmt(e, f),
        }
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            AmountErrorKind::Empty => f.write_str("An amount cannot be empty"),
            AmountErrorKind::Decimal(e) => Display::fmt(e, f),
        }
    }
}

impl Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.0 {
            AmountErrorKind::Empty => None,
            AmountErrorKind::Decimal(e) => Some(e),
        }
    }
}

impl From<rust_decimal::Error> for AmountError {
    fn from(e: rust_decimal::Error) -> Self {
        Self(AmountErrorKind::Decimal(e))
    }
}

/// Parses decimal text, accepting scientific notation as a fallback.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, AmountError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(AmountError::empty());
    }
    match Decimal::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(e) if trimmed.contains(['e', 'E']) => {
            Decimal::from_scientific(trimmed).map_err(|_| AmountError::from(e))
        }
        Err(e) => Err(e.into()),
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Amount::new)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.value, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // A string keeps the exact digits through JSON
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts amounts stored either as JSON numbers or as decimal strings.
struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        // The shortest round-trip representation of the float is the number the user wrote
        Amount::from_str(&v.to_string()).map_err(de::Error::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
