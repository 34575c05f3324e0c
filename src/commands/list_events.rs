use std::collections::BTreeMap;

use futures_util::future::try_join_all;
use morgen_core::model::{Event, LocalDateTime};
use morgen_core::{MorgenError, MorgenResult, VirtualId};
use serde::{Deserialize, Serialize};

use crate::bridge::Bridge;
use crate::commands::parse_params;
use crate::validate;

#[derive(Debug, Deserialize)]
struct ListEventsParams {
    calendar_ids: Option<Vec<String>>,
    start: String,
    end: String,
    #[serde(default)]
    compact: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    id: VirtualId,
    calendar_id: VirtualId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    start: LocalDateTime,
    duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
    is_all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    free_busy_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    privacy: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<LocationView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    participants: Vec<ParticipantView>,
    is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurrence_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    master_event_id: Option<VirtualId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    virtual_room_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompactEventView {
    id: VirtualId,
    calendar_id: VirtualId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    start: LocalDateTime,
    duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
    is_all_day: bool,
}

#[derive(Debug, Serialize)]
struct LocationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantView {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    is_organizer: bool,
}

/// Upstream calendar IDs to query, keyed by the account that owns them.
type AccountGroups = BTreeMap<String, Vec<String>>;

fn push_grouped(groups: &mut AccountGroups, account_id: String, calendar_id: String) {
    let calendars = groups.entry(account_id).or_default();
    if !calendars.contains(&calendar_id) {
        calendars.push(calendar_id);
    }
}

/// Resolve caller-supplied calendars and group them by their embedded account.
///
/// Every entry must decode as a calendar ID; nothing is sent upstream otherwise.
fn group_requested(bridge: &Bridge, virtual_ids: &[String]) -> MorgenResult<AccountGroups> {
    let mut groups = AccountGroups::new();
    for virtual_id in virtual_ids {
        let (calendar_id, key) = bridge.resolve_calendar(virtual_id)?;
        push_grouped(&mut groups, key.account_id, calendar_id);
    }
    Ok(groups)
}

/// Every readable calendar of every account.
async fn group_all(bridge: &Bridge) -> MorgenResult<AccountGroups> {
    let mut groups = AccountGroups::new();
    for calendar in bridge.client.list_calendars().await? {
        let readable = calendar.my_rights.as_ref().is_none_or(|r| r.may_read_items);
        if readable {
            push_grouped(&mut groups, calendar.account_id, calendar.id);
        }
    }
    Ok(groups)
}

fn full_view(event: Event, id: VirtualId, calendar_id: VirtualId, bridge: &Bridge) -> EventView {
    let is_recurring = event.is_recurring();
    let virtual_room_url = event.virtual_room_url().map(String::from);
    EventView {
        id,
        calendar_id,
        title: event.title,
        description: event.description,
        start: event.start,
        duration: event.duration,
        time_zone: event.time_zone,
        is_all_day: event.show_without_time,
        free_busy_status: event.free_busy_status,
        privacy: event.privacy,
        locations: event
            .locations
            .unwrap_or_default()
            .into_values()
            .map(|l| LocationView { name: l.name })
            .collect(),
        participants: event
            .participants
            .unwrap_or_default()
            .into_values()
            .map(|p| ParticipantView {
                is_organizer: p.is_organizer(),
                name: p.name,
                email: p.email,
                status: p.participation_status,
            })
            .collect(),
        is_recurring,
        recurrence_id: event.recurrence_id,
        master_event_id: event
            .master_event_id
            .as_deref()
            .map(|m| bridge.registry.issue(m)),
        virtual_room_url,
    }
}

fn compact_view(event: Event, id: VirtualId, calendar_id: VirtualId) -> CompactEventView {
    CompactEventView {
        id,
        calendar_id,
        title: event.title,
        start: event.start,
        duration: event.duration,
        time_zone: event.time_zone,
        is_all_day: event.show_without_time,
    }
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: ListEventsParams = parse_params(params)?;
    let start = validate::local_datetime(&params.start, "start")?;
    let end = validate::local_datetime(&params.end, "end")?;
    validate::date_range(start, end)?;

    let groups = match &params.calendar_ids {
        Some(requested) if requested.is_empty() => {
            return Err(MorgenError::validation(
                "'calendar_ids' cannot be empty. Omit it to query every calendar.",
            ));
        }
        Some(requested) => group_requested(bridge, requested)?,
        None => group_all(bridge).await?,
    };

    let per_account = try_join_all(groups.iter().map(|(account_id, calendar_ids)| {
        bridge
            .client
            .list_events(account_id, calendar_ids, start, end)
    }))
    .await?;

    let mut events: Vec<Event> = per_account.into_iter().flatten().collect();
    events.sort_by_cached_key(Event::start_instant);

    // Every upstream call has returned; only now are tokens handed out.
    let event_ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    let calendar_ids: Vec<&str> = events.iter().map(|e| e.calendar_id.as_str()).collect();
    let virtual_ids = bridge.registry.issue_all(&event_ids);
    let virtual_calendar_ids = bridge.registry.issue_all(&calendar_ids);

    let count = events.len();
    tracing::info!(count, accounts = groups.len(), "listed events");

    let pairs = events
        .into_iter()
        .zip(virtual_ids.into_iter().zip(virtual_calendar_ids));
    let events = if params.compact {
        serde_json::to_value(
            pairs
                .map(|(event, (id, calendar_id))| compact_view(event, id, calendar_id))
                .collect::<Vec<_>>(),
        )?
    } else {
        serde_json::to_value(
            pairs
                .map(|(event, (id, calendar_id))| full_view(event, id, calendar_id, bridge))
                .collect::<Vec<_>>(),
        )?
    };

    Ok(serde_json::json!({ "count": count, "events": events }))
}
