use std::collections::BTreeMap;

use morgen_core::model::{
    EventUpdateRequest, FreeBusyStatus, Location, Privacy, SeriesUpdateMode,
};
use morgen_core::{MorgenError, MorgenResult};
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::parse_params;
use crate::validate;

/// Fields of a single event update. Also the item type of `batch_update_events`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventParams {
    pub event_id: String,
    pub title: Option<String>,
    pub start: Option<String>,
    pub duration: Option<String>,
    pub time_zone: Option<String>,
    pub is_all_day: Option<bool>,
    pub description: Option<String>,
    /// An empty string removes every location.
    pub location: Option<String>,
    pub free_busy_status: Option<FreeBusyStatus>,
    pub privacy: Option<Privacy>,
    pub series_update_mode: Option<SeriesUpdateMode>,
}

impl UpdateEventParams {
    /// Validate the fields and address the event through its virtual ID.
    pub fn into_request(self, bridge: &Bridge) -> MorgenResult<EventUpdateRequest> {
        let timing_given = [
            self.start.is_some(),
            self.duration.is_some(),
            self.time_zone.is_some(),
            self.is_all_day.is_some(),
        ]
        .into_iter()
        .filter(|given| *given)
        .count();
        if timing_given != 0 && timing_given != 4 {
            return Err(MorgenError::validation(
                "When updating timing fields (start, duration, time_zone, is_all_day), all four must be provided together.",
            ));
        }

        let start = self
            .start
            .as_deref()
            .map(|s| validate::local_datetime(s, "start"))
            .transpose()?;
        if let Some(duration) = &self.duration {
            validate::duration(duration)?;
        }
        if let Some(tz) = &self.time_zone {
            validate::timezone(tz)?;
        }

        let locations = self.location.map(|name| {
            if name.is_empty() {
                BTreeMap::new()
            } else {
                BTreeMap::from([("1".to_string(), Location::named(name))])
            }
        });

        let event = bridge.resolve_event(&self.event_id)?;
        Ok(EventUpdateRequest {
            id: event.event_id,
            account_id: event.account_id,
            calendar_id: event.calendar_id,
            title: self.title,
            start,
            duration: self.duration,
            time_zone: self.time_zone,
            show_without_time: self.is_all_day,
            description: self.description,
            locations,
            participants: None,
            alerts: None,
            use_default_alerts: None,
            free_busy_status: self.free_busy_status,
            privacy: self.privacy,
        })
    }
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: UpdateEventParams = parse_params(params)?;
    let event_id = params.event_id.clone();
    let mode = params.series_update_mode.unwrap_or_default();

    let request = params.into_request(bridge)?;
    bridge.client.update_event(&request, mode).await?;

    tracing::info!(event = %event_id, mode = mode.as_str(), "updated event");
    Ok(serde_json::json!({
        "message": "Event updated successfully.",
        "eventId": event_id,
        "seriesUpdateMode": mode,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn update_router(recorded: Recorded) -> Router {
        Router::new().route(
            "/v3/events/update",
            post(
                move |Query(q): Query<HashMap<String, String>>,
                      Json(body): Json<serde_json::Value>| async move {
                    recorded.lock().push(json!({ "query": q, "body": body }));
                    StatusCode::OK
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_update_derives_owners_from_event_id() {
        let recorded: Recorded = Arc::default();
        let bridge = bridge_for(update_router(Arc::clone(&recorded))).await;
        let event = bridge.registry.issue(EVENT_ID);

        let data = handle(
            &bridge,
            json!({
                "event_id": event.as_str(),
                "title": "Renamed",
                "location": "",
                "series_update_mode": "all"
            }),
        )
        .await
        .unwrap();

        assert_eq!(data["eventId"], event.as_str());
        assert_eq!(data["seriesUpdateMode"], "all");

        let sent = recorded.lock()[0].clone();
        assert_eq!(sent["query"]["seriesUpdateMode"], "all");
        assert_eq!(
            sent["body"],
            json!({
                "id": EVENT_ID,
                "accountId": ACCOUNT_ID,
                "calendarId": CALENDAR_ID,
                "title": "Renamed",
                "locations": {}
            })
        );
    }

    #[tokio::test]
    async fn test_timing_fields_travel_together() {
        let recorded: Recorded = Arc::default();
        let bridge = bridge_for(update_router(Arc::clone(&recorded))).await;
        let event = bridge.registry.issue(EVENT_ID);

        let err = handle(
            &bridge,
            json!({ "event_id": event.as_str(), "start": "2023-03-01T11:00:00" }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("all four must be provided"));
        assert!(recorded.lock().is_empty());

        handle(
            &bridge,
            json!({
                "event_id": event.as_str(),
                "start": "2023-03-01T11:00:00",
                "duration": "PT30M",
                "time_zone": "Europe/Berlin",
                "is_all_day": false
            }),
        )
        .await
        .unwrap();

        let sent = recorded.lock()[0].clone();
        assert_eq!(sent["query"]["seriesUpdateMode"], "single");
        assert_eq!(sent["body"]["start"], "2023-03-01T11:00:00");
        assert_eq!(sent["body"]["showWithoutTime"], false);
    }
}
