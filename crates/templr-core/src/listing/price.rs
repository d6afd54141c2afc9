//! Listing price value.

use serde::{Deserialize, Serialize};

/// Stored label for free listings.
pub const FREE_LABEL: &str = "Free";

/// Currency symbol prefixed to bare amounts entered by creators.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Price of a listing: free, or a currency-formatted amount.
///
/// Stored as a plain string (`"Free"` or e.g. `"₹499"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Price {
    #[default]
    Free,
    Amount(String),
}

impl Price {
    /// Builds a price from the creator's raw input.
    ///
    /// Empty input means free. A bare amount gets the currency symbol; input
    /// that already starts with a symbol is kept as typed.
    pub fn from_input(input: Option<&str>) -> Self {
        let trimmed = match input.map(str::trim) {
            None | Some("") => return Self::Free,
            Some(value) => value,
        };

        if trimmed.eq_ignore_ascii_case(FREE_LABEL) {
            return Self::Free;
        }

        match trimmed.chars().next() {
            Some(first) if first.is_ascii_digit() || first == '.' => {
                Self::Amount(format!("{CURRENCY_SYMBOL}{trimmed}"))
            }
            _ => Self::Amount(trimmed.to_string()),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => FREE_LABEL,
            Self::Amount(label) => label,
        }
    }
}

impl From<String> for Price {
    fn from(value: String) -> Self {
        if value.is_empty() || value == FREE_LABEL {
            Self::Free
        } else {
            Self::Amount(value)
        }
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        match price {
            Price::Free => FREE_LABEL.to_string(),
            Price::Amount(label) => label,
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
