use serde::Serialize;
use serde_json::Value;

use crate::error::FetchError;

/// A current-weather payload that passed the minimum shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeather(Value);

impl RawWeather {
    /// Parses and re-validates a 2xx response body.
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let value: Value =
            serde_json::from_str(body).map_err(|_| FetchError::MalformedResponse)?;
        Self::from_value(value)
    }

    /// Requires an object with a `name` string plus `main` and `sys` objects,
    /// then honours an embedded application code (`cod`) if one is present.
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let obj = value.as_object().ok_or(FetchError::MalformedResponse)?;

        let has_shape = obj.get("name").is_some_and(Value::is_string)
            && obj.get("main").is_some_and(Value::is_object)
            && obj.get("sys").is_some_and(Value::is_object);
        if !has_shape {
            return Err(FetchError::MalformedResponse);
        }

        if let Some(err) = obj.get("cod").and_then(app_code).and_then(FetchError::from_status) {
            return Err(err);
        }

        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// `cod` arrives as either a number or a numeric string.
fn app_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Display-ready weather. `None` marks a value the payload did not provide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    pub city_name: Option<String>,
    pub country_code: Option<String>,
    pub temperature_c: Option<f64>,
    pub temperature_f: Option<i64>,
    pub feels_like_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub pressure_atm: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub visibility_km: Option<f64>,
    pub clouds_pct: Option<u8>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction: Option<&'static str>,
    pub condition_main: Option<String>,
    pub condition_description: Option<String>,
    pub condition_icon: &'static str,
    pub sunrise_local: Option<String>,
    pub sunset_local: Option<String>,
    pub theme: Theme,
}

/// Weather groups reported in `weather[].main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
    Other,
}

impl Condition {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Mist" => Self::Mist,
            "Smoke" => Self::Smoke,
            "Haze" => Self::Haze,
            "Dust" => Self::Dust,
            "Fog" => Self::Fog,
            "Sand" => Self::Sand,
            "Ash" => Self::Ash,
            "Squall" => Self::Squall,
            "Tornado" => Self::Tornado,
            _ => Self::Other,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Clouds => "☁️",
            Self::Rain => "🌧️",
            Self::Drizzle => "🌦️",
            Self::Thunderstorm => "⛈️",
            Self::Snow => "❄️",
            Self::Mist | Self::Haze | Self::Fog => "🌫️",
            Self::Smoke => "💨",
            Self::Dust | Self::Sand => "🏜️",
            Self::Ash => "🌋",
            Self::Squall => "🌬️",
            Self::Tornado => "🌪️",
            Self::Other => "🌡️",
        }
    }
}

/// Background theme picked from the current temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Freezing,
    Cold,
    Mild,
    Warm,
    Hot,
    Unknown,
}

impl Theme {
    pub fn from_celsius(temp: Option<f64>) -> Self {
        match temp {
            None => Self::Unknown,
            Some(t) if t.is_nan() => Self::Unknown,
            Some(t) if t < 0.0 => Self::Freezing,
            Some(t) if t < 10.0 => Self::Cold,
            Some(t) if t < 20.0 => Self::Mild,
            Some(t) if t < 30.0 => Self::Warm,
            Some(_) => Self::Hot,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freezing => "freezing",
            Self::Cold => "cold",
            Self::Mild => "mild",
            Self::Warm => "warm",
            Self::Hot => "hot",
            Self::Unknown => "unknown",
        }
    }
}
