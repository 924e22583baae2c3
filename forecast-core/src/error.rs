use std::{io, path::PathBuf};

use thiserror::Error;

/// Rejection of raw city input. Never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a city name.")]
    EmptyInput,

    #[error("City name may only contain letters, spaces, hyphens and apostrophes.")]
    InvalidCharacters,

    #[error("City name must be at least {min} character(s) long.", min = crate::query::MIN_CITY_LEN)]
    TooShort,

    #[error("City name must be at most {max} characters long.", max = crate::query::MAX_CITY_LEN)]
    TooLong,
}

/// Classified failure of a weather lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out or was aborted")]
    Timeout,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("city not found")]
    CityNotFound,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("rate limited")]
    RateLimited,

    #[error("weather service error (status {0})")]
    ServerError(u16),

    #[error("unexpected HTTP status {0}")]
    UnknownHttpStatus(u16),

    #[error("malformed response from weather service")]
    MalformedResponse,
}

impl FetchError {
    /// Maps an HTTP status (or the API's embedded `cod`) to an error.
    /// Returns `None` for 2xx.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            200..=299 => None,
            404 => Some(Self::CityNotFound),
            401 => Some(Self::InvalidApiKey),
            429 => Some(Self::RateLimited),
            500 | 502 | 503 => Some(Self::ServerError(code)),
            other => Some(Self::UnknownHttpStatus(other)),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            // Request URLs carry the API key.
            Self::NetworkError(err.without_url().to_string())
        }
    }

    /// The single message shown to the user for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout => "Request timed out. Please check your connection and try again.",
            Self::NetworkError(_) => "Network error. Please check your internet connection.",
            Self::CityNotFound => "City not found. Please check the spelling and try again.",
            Self::InvalidApiKey => "Invalid API key. Please check your configuration.",
            Self::RateLimited => "Too many requests. Please wait a moment and try again.",
            Self::ServerError(_) => {
                "Weather service is temporarily unavailable. Please try again later."
            }
            Self::UnknownHttpStatus(_) => "Unexpected response from the weather service.",
            Self::MalformedResponse => "Received invalid data from the weather service.",
        }
    }

    /// Whether retrying the same query has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::NetworkError(_) | Self::RateLimited | Self::ServerError(_)
        )
    }
}

/// Fatal configuration problems, surfaced before any lookup runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "{env} is not set. Set it, or run `forecast configure` to store your OpenWeatherMap API key.",
        env = crate::config::API_KEY_ENV
    )]
    MissingApiKey,

    #[error("The configured API key is still the placeholder value. Replace it with a valid OpenWeatherMap API key.")]
    PlaceholderApiKey,

    #[error("Invalid API base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(FetchError::from_status(200), None);
        assert_eq!(FetchError::from_status(404), Some(FetchError::CityNotFound));
        assert_eq!(FetchError::from_status(401), Some(FetchError::InvalidApiKey));
        assert_eq!(FetchError::from_status(429), Some(FetchError::RateLimited));
        for code in [500, 502, 503] {
            assert_eq!(FetchError::from_status(code), Some(FetchError::ServerError(code)));
        }
        assert_eq!(FetchError::from_status(504), Some(FetchError::UnknownHttpStatus(504)));
        assert_eq!(FetchError::from_status(418), Some(FetchError::UnknownHttpStatus(418)));
    }

    #[test]
    fn every_kind_has_a_distinct_message() {
        let kinds = [
            FetchError::Timeout,
            FetchError::NetworkError("refused".into()),
            FetchError::CityNotFound,
            FetchError::InvalidApiKey,
            FetchError::RateLimited,
            FetchError::ServerError(500),
            FetchError::UnknownHttpStatus(418),
            FetchError::MalformedResponse,
        ];
        let mut messages: Vec<_> = kinds.iter().map(FetchError::user_message).collect();
        messages.sort_unstable();
        messages.dedup();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn network_message_does_not_depend_on_detail() {
        let a = FetchError::NetworkError("dns".into());
        let b = FetchError::NetworkError("refused".into());
        assert_eq!(a.user_message(), b.user_message());
    }

    #[test]
    fn retryable_kinds() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::ServerError(503).is_retryable());
        assert!(!FetchError::CityNotFound.is_retryable());
        assert!(!FetchError::InvalidApiKey.is_retryable());
    }
}
