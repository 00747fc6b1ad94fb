//! Monetary amounts as they travel on the wire: decimal strings.
//!
//! The backend sends amounts as strings (occasionally as JSON numbers). The raw text is
//! kept untouched so a record can be written back verbatim; arithmetic always goes
//! through [`rust_decimal::Decimal`], never through floats.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::IgnoredAny};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Amount(String);

impl Amount {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parsed value, or `None` when the raw text is not a finite decimal
    pub fn try_value(&self) -> Option<Decimal> {
        try_parse_amount(&self.0)
    }

    /// Parsed value, zero when the raw text is missing or unparseable
    pub fn value(&self) -> Decimal {
        parse_amount(&self.0)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value.normalize().to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Lenient parse: anything that is not a finite decimal counts as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    try_parse_amount(raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            tracing::trace!(raw = %raw, "unparseable amount treated as zero");
        }
        Decimal::ZERO
    })
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawAmount>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawAmount::Text(text)) => Self(text),
            Some(RawAmount::Number(number)) => Self(number.to_string()),
            Some(RawAmount::Other(_)) | None => Self::default(),
        })
    }
}
