use std::fmt;

use crate::error::ValidationError;

pub const MIN_CITY_LEN: usize = 1;
pub const MAX_CITY_LEN: usize = 50;

/// A trimmed city name that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityQuery(String);

impl CityQuery {
    /// Validates raw user input.
    ///
    /// Checks run in order: empty input, disallowed characters, then length
    /// (counted in characters after trimming). The character check covers the
    /// whole input, so surrounding tabs or non-ASCII spaces are rejected
    /// rather than trimmed away.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        if !raw.chars().all(is_allowed) {
            return Err(ValidationError::InvalidCharacters);
        }

        let len = trimmed.chars().count();
        if len < MIN_CITY_LEN {
            return Err(ValidationError::TooShort);
        }
        if len > MAX_CITY_LEN {
            return Err(ValidationError::TooLong);
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, ' ' | '-' | '\'')
}

impl TryFrom<&str> for CityQuery {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for CityQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
