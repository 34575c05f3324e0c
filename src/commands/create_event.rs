use std::collections::BTreeMap;

use morgen_core::model::{
    EventCreateRequest, FreeBusyStatus, Location, Participant, Privacy, VirtualRoomProvider,
};
use morgen_core::{MorgenError, MorgenResult};
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::parse_params;
use crate::validate;

#[derive(Debug, Deserialize)]
struct CreateEventParams {
    calendar_id: String,
    title: String,
    start: String,
    duration: String,
    time_zone: Option<String>,
    #[serde(default)]
    is_all_day: bool,
    description: Option<String>,
    location: Option<String>,
    participants: Option<Vec<String>>,
    free_busy_status: Option<FreeBusyStatus>,
    privacy: Option<Privacy>,
    request_virtual_room: Option<VirtualRoomProvider>,
}

/// Attendee entries keyed by address.
pub fn participants_map(emails: &[String]) -> MorgenResult<BTreeMap<String, Participant>> {
    emails
        .iter()
        .map(|email| {
            validate::email(email)?;
            Ok((email.clone(), Participant::attendee(email)))
        })
        .collect()
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: CreateEventParams = parse_params(params)?;

    if params.title.trim().is_empty() {
        return Err(MorgenError::validation("'title' cannot be empty"));
    }
    let start = validate::local_datetime(&params.start, "start")?;
    validate::duration(&params.duration)?;
    if let Some(tz) = &params.time_zone {
        validate::timezone(tz)?;
    }
    let participants = match params.participants.as_deref() {
        Some(emails) if !emails.is_empty() => Some(participants_map(emails)?),
        _ => None,
    };
    let locations = params
        .location
        .filter(|l| !l.is_empty())
        .map(|name| BTreeMap::from([("1".to_string(), Location::named(name))]));

    let (calendar_id, key) = bridge.resolve_calendar(&params.calendar_id)?;
    let request = EventCreateRequest {
        account_id: key.account_id,
        calendar_id,
        title: params.title,
        start,
        duration: params.duration,
        time_zone: params.time_zone,
        show_without_time: params.is_all_day,
        description: params.description,
        locations,
        participants,
        free_busy_status: Some(params.free_busy_status.unwrap_or(FreeBusyStatus::Busy)),
        privacy: Some(params.privacy.unwrap_or(Privacy::Public)),
        alerts: None,
        use_default_alerts: None,
        request_virtual_room: params.request_virtual_room,
    };

    let created = bridge.client.create_event(&request).await?;
    let id = bridge.registry.issue(&created.id);
    let calendar_id = bridge.registry.issue(&created.calendar_id);
    let account_id = bridge.registry.issue(&created.account_id);

    tracing::info!(event = %id, "created event");
    Ok(serde_json::json!({
        "message": "Event created successfully.",
        "event": {
            "id": id,
            "calendarId": calendar_id,
            "accountId": account_id,
        },
    }))
}
