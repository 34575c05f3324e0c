use morgen_core::model::{Calendar, CalendarMetadata, CalendarRights};
use morgen_core::{MorgenResult, VirtualId};
use serde::Serialize;

use crate::bridge::Bridge;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarView {
    id: VirtualId,
    account_id: VirtualId,
    integration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CalendarMetadata>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Permissions {
    can_read: bool,
    can_write: bool,
    can_delete: bool,
}

impl From<&CalendarRights> for Permissions {
    fn from(rights: &CalendarRights) -> Self {
        Permissions {
            can_read: rights.may_read_items,
            can_write: rights.may_write_all,
            can_delete: rights.may_delete,
        }
    }
}

fn view(calendar: Calendar, id: VirtualId, account_id: VirtualId) -> CalendarView {
    CalendarView {
        id,
        account_id,
        integration_id: calendar.integration_id,
        name: calendar.name,
        color: calendar.color,
        sort_order: calendar.sort_order,
        permissions: calendar.my_rights.as_ref().map(Permissions::from),
        metadata: calendar.metadata,
    }
}

pub async fn handle(bridge: &Bridge) -> MorgenResult<serde_json::Value> {
    let calendars = bridge.client.list_calendars().await?;

    let ids: Vec<&str> = calendars.iter().map(|c| c.id.as_str()).collect();
    let account_ids: Vec<&str> = calendars.iter().map(|c| c.account_id.as_str()).collect();
    let virtual_ids = bridge.registry.issue_all(&ids);
    let virtual_account_ids = bridge.registry.issue_all(&account_ids);

    let views: Vec<CalendarView> = calendars
        .into_iter()
        .zip(virtual_ids.into_iter().zip(virtual_account_ids))
        .map(|(calendar, (id, account_id))| view(calendar, id, account_id))
        .collect();

    tracing::info!(count = views.len(), "listed calendars");
    Ok(serde_json::json!({ "count": views.len(), "calendars": views }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_calendars_are_virtualized_and_nulls_dropped() {
        let router = Router::new().route(
            "/v3/calendars/list",
            get(|| async {
                Json(json!({ "data": { "calendars": [{
                    "id": CALENDAR_ID,
                    "accountId": ACCOUNT_ID,
                    "integrationId": "google",
                    "name": "Work",
                    "color": "#4285f4",
                    "sortOrder": 1,
                    "myRights": { "mayReadItems": true, "mayWriteAll": true, "mayDelete": false },
                    "morgen.so:metadata": { "busy": true }
                }, {
                    "id": TEAM_CALENDAR_ID,
                    "accountId": ACCOUNT_ID,
                    "integrationId": "google"
                }]}}))
            }),
        );
        let bridge = bridge_for(router).await;

        let data = handle(&bridge).await.unwrap();
        assert_eq!(data["count"], 2);

        let work = &data["calendars"][0];
        let team = &data["calendars"][1];
        assert_ne!(work["id"], team["id"]);
        assert_eq!(work["accountId"], team["accountId"]);
        assert_eq!(
            bridge.registry.resolve(work["id"].as_str().unwrap()).unwrap(),
            CALENDAR_ID
        );
        assert_eq!(
            bridge.registry.resolve(team["accountId"].as_str().unwrap()).unwrap(),
            ACCOUNT_ID
        );
        assert_eq!(
            work["permissions"],
            json!({ "canRead": true, "canWrite": true, "canDelete": false })
        );
        assert_eq!(work["metadata"], json!({ "busy": true }));

        assert!(team.get("name").is_none());
        assert!(team.get("permissions").is_none());
        assert!(team.get("metadata").is_none());
    }
}
