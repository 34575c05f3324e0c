use morgen_core::MorgenResult;
use morgen_core::model::SeriesUpdateMode;
use serde::Deserialize;

use crate::bridge::Bridge;
use crate::commands::delete_event::delete_one;
use crate::commands::{batch_view, check_batch_size, parse_params};

#[derive(Debug, Deserialize)]
struct BatchDeleteParams {
    event_ids: Vec<String>,
    #[serde(default)]
    series_update_mode: SeriesUpdateMode,
}

/// Each ID is deleted independently; earlier deletions stand when later ones fail.
pub async fn handle(bridge: &Bridge, params: serde_json::Value) -> MorgenResult<serde_json::Value> {
    let params: BatchDeleteParams = parse_params(params)?;
    check_batch_size(params.event_ids.len(), "event_ids")?;
    let mode = params.series_update_mode;

    let items = params
        .event_ids
        .into_iter()
        .map(|id| (id.clone(), id))
        .collect();
    let result = bridge
        .batch
        .run(items, move |event_id: String| async move {
            delete_one(bridge, &event_id, mode).await
        })
        .await;

    batch_view(result)
}
