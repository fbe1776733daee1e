//! Weather-specific error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("City already tracked: {0}")]
    DuplicateCity(String),

    #[error("Unknown city: {0}")]
    UnknownCity(String),

    #[error("Invalid temperature unit: {0}")]
    InvalidUnit(String),
}

impl WeatherError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::FetchFailed(_) => "Failed to fetch weather data",
            WeatherError::DuplicateCity(_) => "This city is already in your dashboard!",
            WeatherError::UnknownCity(_) => "That city is not available. Pick one from the list.",
            WeatherError::InvalidUnit(_) => "Unknown temperature unit. Use C or F.",
        }
    }

    /// True if calling refresh again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WeatherError::FetchFailed(_))
    }
}
