//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_APPLICATION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap()
});

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "APPLICATION_ID" => {
            if !RE_APPLICATION_ID.is_match(value) {
                return Err("must be a dotted identifier like 'com.example.app'".into());
            }
        }
        "MAX_NOTIFICATION_LINES" => validate_int_range(value, 1, 20)?,
        "SUPPRESSED_POLICY" => {
            if value != "drop" && value != "record" {
                return Err("must be 'drop' or 'record'".into());
            }
        }
        "NEW_MESSAGES_TEMPLATE" | "MORE_MESSAGES_TEMPLATE" => {
            if !value.contains("{count}") {
                return Err("must contain '{count}'".into());
            }
        }
        "NOTIFICATION_OUTPUT" => {
            if value != "stdout" && value != "log" {
                return Err("must be 'stdout' or 'log'".into());
            }
        }
        "LOG_ALWAYS" => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i32, max: i32) -> Result<(), String> {
    let v: i32 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
