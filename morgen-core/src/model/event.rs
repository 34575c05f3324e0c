//! Event types, following Morgen's JSCalendar-flavoured schema.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::time::LocalDateTime;

/// An event (or an expanded occurrence of a recurring one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    pub calendar_id: String,
    pub account_id: String,
    #[serde(default)]
    pub integration_id: String,
    #[serde(default)]
    pub master_event_id: Option<String>,
    #[serde(default)]
    pub recurrence_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: LocalDateTime,
    #[serde(default)]
    pub time_zone: Option<String>,
    pub duration: String,
    #[serde(default)]
    pub show_without_time: bool,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub free_busy_status: Option<String>,
    #[serde(default)]
    pub locations: Option<BTreeMap<String, Location>>,
    #[serde(default)]
    pub participants: Option<BTreeMap<String, Participant>>,
    #[serde(default)]
    pub recurrence_rules: Option<Vec<RecurrenceRule>>,
    #[serde(default)]
    pub alerts: Option<BTreeMap<String, Alert>>,
    #[serde(default)]
    pub use_default_alerts: bool,
    #[serde(rename = "morgen.so:metadata", default)]
    pub metadata: Option<EventMetadata>,
    #[serde(rename = "morgen.so:derived", default)]
    pub derived: Option<EventDerived>,
}

impl Event {
    pub fn virtual_room_url(&self) -> Option<&str> {
        self.derived
            .as_ref()
            .and_then(|d| d.virtual_room.as_ref())
            .and_then(|r| r.url.as_deref())
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rules.is_some() || self.master_event_id.is_some()
    }

    /// The instant the event starts, for ordering across time zones.
    ///
    /// Floating events (no `timeZone`) and unknown zones are read as UTC. A
    /// wall-clock time skipped by a DST change is also read as UTC.
    pub fn start_instant(&self) -> DateTime<Utc> {
        let naive = self.start.naive();
        self.time_zone
            .as_deref()
            .and_then(|tz| tz.parse::<Tz>().ok())
            .and_then(|tz| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "@type", default = "Location::kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    fn kind() -> String {
        "Location".to_string()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Location {
            kind: Self::kind(),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantRoles {
    pub attendee: bool,
    pub owner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "@type", default = "Participant::kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<ParticipantRoles>,
    #[serde(default)]
    pub account_owner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participation_status: Option<String>,
}

impl Participant {
    fn kind() -> String {
        "Participant".to_string()
    }

    /// An invited attendee, named after the local part of their address.
    pub fn attendee(email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email);
        Participant {
            kind: Self::kind(),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            roles: Some(ParticipantRoles {
                attendee: true,
                owner: false,
            }),
            account_owner: false,
            participation_status: Some("needs-action".to_string()),
        }
    }

    pub fn is_organizer(&self) -> bool {
        self.roles.as_ref().is_some_and(|r| r.owner)
    }
}

/// Fires `offset` relative to the event start or end, e.g. `-PT15M`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetTrigger {
    #[serde(rename = "@type", default = "OffsetTrigger::kind")]
    pub kind: String,
    pub offset: String,
    #[serde(default = "OffsetTrigger::start")]
    pub relative_to: String,
}

impl OffsetTrigger {
    fn kind() -> String {
        "OffsetTrigger".to_string()
    }

    fn start() -> String {
        "start".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "@type", default = "Alert::kind")]
    pub kind: String,
    pub trigger: OffsetTrigger,
    #[serde(default = "Alert::display")]
    pub action: String,
}

impl Alert {
    fn kind() -> String {
        "Alert".to_string()
    }

    fn display() -> String {
        "display".to_string()
    }
}

/// Morgen's own annotations on an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_day: Option<Vec<NDay>>,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NDay {
    pub day: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDerived {
    #[serde(default)]
    pub virtual_room: Option<VirtualRoom>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualRoom {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreeBusyStatus {
    Free,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
    Secret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VirtualRoomProvider {
    Default,
    GoogleMeet,
    MicrosoftTeams,
}

/// How an update or delete applies to a recurring series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesUpdateMode {
    #[default]
    Single,
    Future,
    All,
}

impl SeriesUpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesUpdateMode::Single => "single",
            SeriesUpdateMode::Future => "future",
            SeriesUpdateMode::All => "all",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreateRequest {
    pub account_id: String,
    pub calendar_id: String,
    pub title: String,
    pub start: LocalDateTime,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub show_without_time: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<BTreeMap<String, Location>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<BTreeMap<String, Participant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_busy_status: Option<FreeBusyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<BTreeMap<String, Alert>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_default_alerts: Option<bool>,
    #[serde(
        rename = "morgen.so:requestVirtualRoom",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_virtual_room: Option<VirtualRoomProvider>,
}

/// Partial update. Unset fields are left untouched upstream.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdateRequest {
    pub id: String,
    pub account_id: String,
    pub calendar_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<LocalDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_without_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(empty)` removes every location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<BTreeMap<String, Location>>,
    /// A `None` value removes that participant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<BTreeMap<String, Option<Participant>>>,
    /// A `None` value removes that alert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<BTreeMap<String, Option<Alert>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_default_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_busy_status: Option<FreeBusyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Privacy>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDeleteRequest {
    pub id: String,
    pub account_id: String,
    pub calendar_id: String,
}

/// IDs assigned to a newly created event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    pub calendar_id: String,
    pub account_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCreateResponse {
    pub event: CreatedEvent,
}
