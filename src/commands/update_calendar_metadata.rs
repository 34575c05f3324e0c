use morgen_core::model::{CalendarMetadata, CalendarUpdateRequest};
use morgen_core::{MorgenError, MorgenResult};
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::parse_params;
use crate::validate;

#[derive(Debug, Deserialize)]
struct UpdateCalendarMetadataParams {
    calendar_id: String,
    busy: Option<bool>,
    override_color: Option<String>,
    override_name: Option<String>,
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: UpdateCalendarMetadataParams = parse_params(params)?;

    let metadata = CalendarMetadata {
        busy: params.busy,
        override_color: params.override_color,
        override_name: params.override_name,
    };
    if metadata.is_empty() {
        return Err(MorgenError::validation(
            "At least one of busy, override_color, or override_name must be provided.",
        ));
    }
    if let Some(color) = &metadata.override_color {
        validate::hex_color(color)?;
    }

    let (calendar_id, key) = bridge.resolve_calendar(&params.calendar_id)?;
    let request = CalendarUpdateRequest {
        id: calendar_id,
        account_id: key.account_id,
        metadata,
    };
    bridge.client.update_calendar_metadata(&request).await?;

    Ok(serde_json::json!({
        "message": "Calendar metadata updated successfully.",
        "calendarId": params.calendar_id,
        "updated": request.metadata,
    }))
}
