use thiserror::Error;

/// Prices are a single non-negative magnitude in the user's currency (kroner).
pub type Price = f64;

/// Format a price the way every rendered view shows it.
/// Example: 6000.0 -> "6000.00kr", 12.5 -> "12.50kr"
pub fn format_price(price: Price) -> String {
    format!("{:.2}kr", price)
}

/// Parse a user-supplied price string.
///
/// Accepts whole units or units with one or two decimals ("50", "12.5", "0.99").
/// Signs, exponents, thousands separators, surrounding whitespace and more than
/// two decimals are rejected. A blank string is reported as [`ParsePriceError::Empty`].
pub fn parse_price(input: &str) -> Result<Price, ParsePriceError> {
    if input.trim().is_empty() {
        return Err(ParsePriceError::Empty);
    }

    let (units, decimals) = match input.split_once('.') {
        Some((units, decimals)) => (units, Some(decimals)),
        None => (input, None),
    };

    if !is_digits(units) {
        return Err(ParsePriceError::InvalidFormat(input.to_string()));
    }
    if let Some(decimals) = decimals {
        if !is_digits(decimals) || decimals.len() > 2 {
            return Err(ParsePriceError::InvalidFormat(input.to_string()));
        }
    }

    input
        .parse()
        .map_err(|_| ParsePriceError::InvalidFormat(input.to_string()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePriceError {
    #[error("Please provide a price")]
    Empty,
    #[error("Please provide a valid price (e.g. 50 or 49.90), got '{0}'")]
    InvalidFormat(String),
}
