//! Wire types for the Morgen v3 API.

mod calendar;
mod event;
mod time;

pub use calendar::*;
pub use event::*;
pub use time::{LocalDateTime, LocalDateTimeError};

use serde::Deserialize;

/// Every successful response body is wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// A connected calendar account (Google, Microsoft, CalDAV, ...).
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub integration_id: String,
    #[serde(default)]
    pub provider_user_id: Option<String>,
    #[serde(default)]
    pub provider_user_display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountsList {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarsList {
    pub calendars: Vec<Calendar>,
}

#[derive(Debug, Deserialize)]
pub struct EventsList {
    pub events: Vec<Event>,
}
