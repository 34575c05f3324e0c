//! Field checks applied to command params before anything reaches the API.
//!
//! Inputs are rejected, never repaired: silently dropping a `Z` suffix would
//! shift an event by the local UTC offset.

use chrono_tz::Tz;
use morgen_core::model::{LocalDateTime, LocalDateTimeError};
use morgen_core::{MorgenError, MorgenResult};

pub const MAX_RANGE_DAYS: i64 = 180;

const LOCAL_EXAMPLE: &str = "2023-03-01T10:00:00";

/// `YYYY-MM-DDTHH:mm:ss`, with no zone marker and no fractional seconds.
pub fn local_datetime(value: &str, field: &str) -> MorgenResult<LocalDateTime> {
    if value.is_empty() {
        return Err(MorgenError::validation(format!("'{field}' cannot be empty")));
    }

    let parsed = value.parse::<LocalDateTime>();
    let separator = |i: usize, c: u8| value.as_bytes().get(i) == Some(&c);
    let shaped = value.len() == 19
        && separator(4, b'-')
        && separator(7, b'-')
        && separator(10, b'T')
        && separator(13, b':')
        && separator(16, b':');

    match parsed {
        Ok(dt) if shaped => Ok(dt),
        Err(LocalDateTimeError::UtcSuffix) => Err(MorgenError::validation(format!(
            "Invalid {field} format: '{value}'. Remove the 'Z' suffix - use LocalDateTime format (e.g., '{LOCAL_EXAMPLE}'). The timezone should be specified separately in the timeZone parameter."
        ))),
        Err(LocalDateTimeError::Offset) => Err(MorgenError::validation(format!(
            "Invalid {field} format: '{value}'. Remove the timezone offset - use LocalDateTime format (e.g., '{LOCAL_EXAMPLE}'). The timezone should be specified separately in the timeZone parameter."
        ))),
        _ => Err(MorgenError::validation(format!(
            "Invalid {field} format: '{value}'. Expected LocalDateTime format: YYYY-MM-DDTHH:mm:ss (e.g., '{LOCAL_EXAMPLE}')"
        ))),
    }
}

/// ISO 8601 duration such as `PT1H30M` or `P1D`.
pub fn duration(value: &str) -> MorgenResult<()> {
    if value.is_empty() {
        return Err(MorgenError::validation("'duration' cannot be empty"));
    }
    if value == "P" || value == "PT" {
        return Err(MorgenError::validation(format!(
            "Invalid duration: '{value}'. Duration must specify a time value. Examples: 'PT1H' (1 hour), 'PT30M' (30 minutes)"
        )));
    }
    iso8601::duration(value).map(|_| ()).map_err(|_| {
        MorgenError::validation(format!(
            "Invalid duration format: '{value}'. Use ISO 8601 duration format. Examples: 'PT1H' (1 hour), 'PT30M' (30 minutes), 'PT1H30M' (1.5 hours), 'P1D' (1 day)"
        ))
    })
}

/// IANA zone name. Common abbreviations get a pointer to the right zone.
pub fn timezone(value: &str) -> MorgenResult<()> {
    if value.is_empty() {
        return Err(MorgenError::validation(
            "'time_zone' cannot be an empty string (omit it for floating events)",
        ));
    }
    if value.parse::<Tz>().is_ok() {
        return Ok(());
    }

    let upper = value.to_ascii_uppercase();
    let suggestions: &[&str] = match upper.as_str() {
        "EST" | "PST" | "CST" | "MST" | "EDT" | "PDT" | "CDT" | "MDT" => &[
            "America/New_York (Eastern)",
            "America/Chicago (Central)",
            "America/Denver (Mountain)",
            "America/Los_Angeles (Pacific)",
        ],
        "CET" | "CEST" => &["Europe/Berlin", "Europe/Paris", "Europe/Rome"],
        u if u.starts_with("GMT") || u.starts_with("UTC") => &["UTC", "Etc/GMT", "Europe/London"],
        _ => &[],
    };

    let mut msg = format!("Invalid timezone: '{value}'. Use IANA timezone format.");
    if suggestions.is_empty() {
        msg.push_str(" Examples: 'Europe/Berlin', 'America/New_York', 'Asia/Tokyo', 'UTC'");
    } else {
        msg.push_str(&format!(" Did you mean: {}?", suggestions.join(", ")));
    }
    Err(MorgenError::validation(msg))
}

/// `local@domain.tld`, without whitespace. Deliverability is not checked.
pub fn email(value: &str) -> MorgenResult<()> {
    if value.is_empty() {
        return Err(MorgenError::validation("Email address cannot be empty"));
    }

    let well_formed = !value.chars().any(char::is_whitespace)
        && value.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty())
        });

    if well_formed {
        Ok(())
    } else {
        Err(MorgenError::validation(format!(
            "Invalid email format: '{value}'. Expected format: 'user@domain.com'"
        )))
    }
}

/// `#RRGGBB`
pub fn hex_color(value: &str) -> MorgenResult<()> {
    if value.is_empty() {
        return Err(MorgenError::validation("Color cannot be empty"));
    }

    let well_formed = value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit());

    if well_formed {
        Ok(())
    } else {
        Err(MorgenError::validation(format!(
            "Invalid color format: '{value}'. Use hex format: '#RRGGBB' (e.g., '#FF5733', '#7EF2FC')"
        )))
    }
}

pub fn date_range(start: LocalDateTime, end: LocalDateTime) -> MorgenResult<()> {
    if end <= start {
        return Err(MorgenError::validation(format!(
            "'end' ({end}) must be after 'start' ({start})"
        )));
    }

    let days = (end.naive() - start.naive()).num_days();
    if days > MAX_RANGE_DAYS {
        return Err(MorgenError::validation(format!(
            "Date range too large: {days} days. Maximum allowed is {MAX_RANGE_DAYS} days (~6 months). The Morgen API recommends retrieving no more than 2 months at a time."
        )));
    }
    Ok(())
}
