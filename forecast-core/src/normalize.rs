//! Pure conversions from an OpenWeatherMap payload to [`WeatherResult`].

use chrono::DateTime;
use serde_json::Value;

use crate::model::{Condition, RawWeather, Theme, WeatherResult};

const STANDARD_ATMOSPHERE_HPA: f64 = 1013.25;
const MPS_TO_KMH: f64 = 3.6;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Builds a display record from any JSON value. Never fails: absent or
/// mistyped fields become `None`.
pub fn normalize(raw: &Value) -> WeatherResult {
    let temperature_c = number(raw, &["main", "temp"]);
    let condition = raw.get("weather").and_then(|w| w.get(0));
    let condition_main = condition.and_then(|c| text(c, &["main"]));
    let offset = integer(raw, &["timezone"]);

    WeatherResult {
        city_name: text(raw, &["name"]),
        country_code: text(raw, &["sys", "country"]),
        temperature_c,
        temperature_f: temperature_c.and_then(celsius_to_fahrenheit),
        feels_like_c: number(raw, &["main", "feels_like"]),
        temp_min_c: number(raw, &["main", "temp_min"]),
        temp_max_c: number(raw, &["main", "temp_max"]),
        pressure_atm: number(raw, &["main", "pressure"])
            .map(|hpa| round_to(hpa / STANDARD_ATMOSPHERE_HPA, 2)),
        humidity_pct: number(raw, &["main", "humidity"]).and_then(percent),
        visibility_km: number(raw, &["visibility"]).map(|m| round_to(m / 1000.0, 1)),
        clouds_pct: number(raw, &["clouds", "all"]).and_then(percent),
        wind_speed_kmh: number(raw, &["wind", "speed"]).map(|mps| round_to(mps * MPS_TO_KMH, 1)),
        wind_direction: number(raw, &["wind", "deg"]).and_then(compass_point),
        condition_icon: Condition::from_main(condition_main.as_deref().unwrap_or_default())
            .glyph(),
        condition_main,
        condition_description: condition.and_then(|c| text(c, &["description"])),
        sunrise_local: integer(raw, &["sys", "sunrise"]).and_then(|ts| local_clock(ts, offset?)),
        sunset_local: integer(raw, &["sys", "sunset"]).and_then(|ts| local_clock(ts, offset?)),
        theme: Theme::from_celsius(temperature_c),
    }
}

impl From<&RawWeather> for WeatherResult {
    fn from(raw: &RawWeather) -> Self {
        normalize(raw.as_value())
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> Option<i64> {
    let f = (celsius * 9.0 / 5.0 + 32.0).round();
    f.is_finite().then_some(f as i64)
}

/// 16-point compass label; 0° and 360° are both "N".
pub fn compass_point(deg: f64) -> Option<&'static str> {
    if !deg.is_finite() {
        return None;
    }
    let idx = ((deg / 22.5).round() as i64).rem_euclid(16) as usize;
    Some(COMPASS_POINTS[idx])
}

/// Formats a UTC unix timestamp as "HH:MM" at the given offset from UTC.
pub fn local_clock(unix_utc: i64, offset_secs: i64) -> Option<String> {
    let shifted = unix_utc.checked_add(offset_secs)?;
    DateTime::from_timestamp(shifted, 0).map(|t| t.format("%H:%M").to_string())
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn percent(value: f64) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.round().clamp(0.0, 100.0) as u8)
}

fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(raw, |cur, key| cur.get(*key))
}

fn number(raw: &Value, path: &[&str]) -> Option<f64> {
    lookup(raw, path)?.as_f64()
}

fn integer(raw: &Value, path: &[&str]) -> Option<i64> {
    let value = lookup(raw, path)?;
    value.as_i64().or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn text(raw: &Value, path: &[&str]) -> Option<String> {
    lookup(raw, path)?.as_str().map(str::to_owned)
}
