use morgen_core::MorgenResult;
use morgen_core::model::{EventDeleteRequest, SeriesUpdateMode};
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::parse_params;

#[derive(Debug, Deserialize)]
struct DeleteEventParams {
    event_id: String,
    #[serde(default)]
    series_update_mode: SeriesUpdateMode,
}

/// Delete one event addressed by its virtual ID.
pub async fn delete_one(bridge: &Bridge, event_id: &str, mode: SeriesUpdateMode) -> MorgenResult<()> {
    let event = bridge.resolve_event(event_id)?;
    let request = EventDeleteRequest {
        id: event.event_id,
        account_id: event.account_id,
        calendar_id: event.calendar_id,
    };
    bridge.client.delete_event(&request, mode).await
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: DeleteEventParams = parse_params(params)?;
    let mode = params.series_update_mode;

    delete_one(bridge, &params.event_id, mode).await?;

    tracing::info!(event = %params.event_id, mode = mode.as_str(), "deleted event");
    Ok(serde_json::json!({
        "message": "Event deleted successfully.",
        "eventId": params.event_id,
        "seriesUpdateMode": mode,
    }))
}
