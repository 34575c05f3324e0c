use morgen_core::MorgenResult;
use morgen_core::model::SeriesUpdateMode;
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::update_event::UpdateEventParams;
use crate::commands::{batch_view, check_batch_size, parse_params};

#[derive(Debug, Deserialize)]
struct BatchUpdateParams {
    updates: Vec<UpdateEventParams>,
    /// Applies to items that do not set their own mode.
    #[serde(default)]
    series_update_mode: SeriesUpdateMode,
}

pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: BatchUpdateParams = parse_params(params)?;
    check_batch_size(params.updates.len(), "updates")?;
    let default_mode = params.series_update_mode;

    let items = params
        .updates
        .into_iter()
        .map(|update| (update.event_id.clone(), update))
        .collect();
    let result = bridge
        .batch
        .run(items, move |update: UpdateEventParams| async move {
            let mode = update.series_update_mode.unwrap_or(default_mode);
            let request = update.into_request(bridge)?;
            bridge.client.update_event(&request, mode).await
        })
        .await;

    batch_view(result)
}
