use morgen_core::{MorgenResult, VirtualId};
use serde::Serialize;

use crate::bridge::Bridge;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountView {
    id: VirtualId,
    integration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

pub async fn handle(bridge: &Bridge) -> MorgenResult<serde_json::Value> {
    let accounts = bridge.client.list_accounts().await?;

    let ids: Vec<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
    let virtual_ids = bridge.registry.issue_all(&ids);

    let views: Vec<AccountView> = accounts
        .into_iter()
        .zip(virtual_ids)
        .map(|(account, id)| AccountView {
            id,
            integration_id: account.integration_id,
            email: account.provider_user_id,
            display_name: account.provider_user_display_name,
        })
        .collect();

    tracing::info!(count = views.len(), "listed accounts");
    Ok(serde_json::json!({ "count": views.len(), "accounts": views }))
}
