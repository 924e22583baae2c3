use std::fmt::Write as _;

use chrono::NaiveTime;
use forecast_core::WeatherResult;

const UNAVAILABLE: &str = "N/A";

/// Title line with a 12-hour clock, e.g. `Weather Forecast  🕐 03:07 PM`.
pub fn header(app_name: &str, now: NaiveTime) -> String {
    format!("{app_name}  🕐 {}", now.format("%I:%M %p"))
}

pub fn card(w: &WeatherResult) -> String {
    let place = match (&w.city_name, &w.country_code) {
        (Some(city), Some(country)) => format!("{city}, {country}"),
        (Some(city), None) => city.clone(),
        (None, _) => "Unknown location".to_string(),
    };

    let condition = match (&w.condition_main, &w.condition_description) {
        (Some(main), Some(desc)) => format!("{main} ({desc})"),
        (Some(main), None) => main.clone(),
        (None, Some(desc)) => desc.clone(),
        (None, None) => UNAVAILABLE.to_string(),
    };

    let temperature = match (w.temperature_c, w.temperature_f) {
        (Some(c), Some(f)) => format!("{c:.1} °C / {f} °F"),
        _ => UNAVAILABLE.to_string(),
    };

    let wind = match (w.wind_speed_kmh, w.wind_direction) {
        (Some(speed), Some(dir)) => format!("{speed:.1} km/h {dir}"),
        (Some(speed), None) => format!("{speed:.1} km/h"),
        (None, _) => UNAVAILABLE.to_string(),
    };

    let rows = [
        ("Condition", condition),
        ("Temperature", temperature),
        ("Feels like", show(w.feels_like_c, |v| format!("{v:.1} °C"))),
        ("Min / Max", min_max(w.temp_min_c, w.temp_max_c)),
        ("Pressure", show(w.pressure_atm, |v| format!("{v:.2} atm"))),
        ("Humidity", show(w.humidity_pct, |v| format!("{v} %"))),
        ("Visibility", show(w.visibility_km, |v| format!("{v:.1} km"))),
        ("Cloud cover", show(w.clouds_pct, |v| format!("{v} %"))),
        ("Wind", wind),
        ("Sunrise", show(w.sunrise_local.as_deref(), str::to_owned)),
        ("Sunset", show(w.sunset_local.as_deref(), str::to_owned)),
        ("Theme", w.theme.as_str().to_owned()),
    ];

    let mut out = format!("{} {place}\n", w.condition_icon);
    for (label, value) in rows {
        let _ = writeln!(out, "  {:<13}{value}", format!("{label}:"));
    }
    out
}

fn show<T>(value: Option<T>, fmt: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| UNAVAILABLE.to_string(), fmt)
}

fn min_max(min: Option<f64>, max: Option<f64>) -> String {
    format!(
        "{} / {}",
        show(min, |v| format!("{v:.1} °C")),
        show(max, |v| format!("{v:.1} °C"))
    )
}
