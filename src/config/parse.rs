//! Environment variable parsing utilities.

use std::str::FromStr;
use std::time::Duration;

use super::ConfigError;

/// Get environment variable with default value.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable (None if empty or missing).
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Parse environment variable with type conversion.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

/// Parse a raw value, reporting failures against `key`.
pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
        key: key.into(),
        value: value.into(),
        error: e.to_string(),
    })
}

/// Parse duration string (e.g., "500ms", "30s", "2m", "1h", "1d").
/// Returns None for "off" and for any zero duration ("0", "0s", "0ms").
pub fn parse_duration(s: &str) -> Result<Option<Duration>, String> {
    let s = s.trim().to_lowercase();

    if s == "off" || s == "0" || s.is_empty() {
        return Ok(None);
    }

    if let Some(num) = s.strip_suffix("ms") {
        return parse_number(num).map(|n| non_zero(Duration::from_millis(n)));
    }

    let (num, multiplier) = match s.as_bytes()[s.len() - 1] {
        b's' => (&s[..s.len() - 1], 1),
        b'm' => (&s[..s.len() - 1], 60),
        b'h' => (&s[..s.len() - 1], 3600),
        b'd' => (&s[..s.len() - 1], 86400),
        _ => (s.as_str(), 1),
    };

    let secs = parse_number(num)?
        .checked_mul(multiplier)
        .ok_or_else(|| format!("invalid duration number: {} is too large", num))?;
    Ok(non_zero(Duration::from_secs(secs)))
}

/// Socket timeouts reject zero, so a zero duration means "disabled".
fn non_zero(duration: Duration) -> Option<Duration> {
    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}

fn parse_number(num: &str) -> Result<u64, String> {
    num.parse()
        .map_err(|_| format!("invalid duration number: {}", num))
}

/// Parse environment variable as duration.
pub fn env_duration(key: &str, default: &str) -> Result<Option<Duration>, ConfigError> {
    let value = env_or(key, default);
    parse_duration(&value).map_err(|e| ConfigError::Parse {
        key: key.into(),
        value,
        error: e,
    })
}
