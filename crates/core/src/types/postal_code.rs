//! Dutch postal code type.
//!
//! This is the strict form used for checkout billing data. The shipping
//! pricing engine intentionally accepts raw strings and only checks length;
//! see [`crate::shipping`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input is empty.
    #[error("postal code cannot be empty")]
    Empty,
    /// The input does not have the `1234 AB` shape.
    #[error("postal code must look like 1234 AB")]
    InvalidFormat,
}

/// A Dutch postal code: four digits (first digit non-zero) and two letters.
///
/// Stored in canonical compact form (`1234AB`); [`fmt::Display`] renders the
/// conventional spaced form (`1234 AB`).
///
/// ```
/// use haardhout_core::PostalCode;
///
/// let code = PostalCode::parse("3811 aa").unwrap();
/// assert_eq!(code.as_compact(), "3811AA");
/// assert_eq!(code.to_string(), "3811 AA");
///
/// assert!(PostalCode::parse("0811AA").is_err());
/// assert!(PostalCode::parse("3811").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a postal code, accepting one optional space and any letter case.
    ///
    /// # Errors
    ///
    /// Returns [`PostalCodeError`] when the input is not a Dutch postal code.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PostalCodeError::Empty);
        }

        let compact: String = match trimmed.split_once(' ') {
            Some((digits, letters)) => format!("{digits}{letters}"),
            None => trimmed.to_string(),
        };

        let chars: Vec<char> = compact.chars().collect();
        let [d1, d2, d3, d4, l1, l2] = chars.as_slice() else {
            return Err(PostalCodeError::InvalidFormat);
        };

        let digits_ok = matches!(d1, '1'..='9')
            && d2.is_ascii_digit()
            && d3.is_ascii_digit()
            && d4.is_ascii_digit();
        let letters_ok = l1.is_ascii_alphabetic() && l2.is_ascii_alphabetic();
        if !digits_ok || !letters_ok {
            return Err(PostalCodeError::InvalidFormat);
        }

        Ok(Self(compact.to_ascii_uppercase()))
    }

    /// Canonical compact form, e.g. `1234AB`.
    #[must_use]
    pub fn as_compact(&self) -> &str {
        &self.0
    }

    /// The four digits, e.g. `1234`.
    #[must_use]
    pub fn digits(&self) -> &str {
        self.0.get(..4).unwrap_or(&self.0)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0.get(..4), self.0.get(4..)) {
            (Some(digits), Some(letters)) => write!(f, "{digits} {letters}"),
            _ => f.write_str(&self.0),
        }
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        for input in ["1234AB", "1234 AB", "1234ab", " 1234 ab "] {
            let code = PostalCode::parse(input).unwrap();
            assert_eq!(code.as_compact(), "1234AB", "input {input:?}");
        }
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(PostalCode::parse(""), Err(PostalCodeError::Empty));
        for input in ["0123AB", "123AB", "12345AB", "1234A", "1234 A B", "1234-AB", "ABCD12"] {
            assert_eq!(
                PostalCode::parse(input),
                Err(PostalCodeError::InvalidFormat),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_digits_and_display() {
        let code = PostalCode::parse("9711 lm").unwrap();
        assert_eq!(code.digits(), "9711");
        assert_eq!(code.to_string(), "9711 LM");
    }
}
