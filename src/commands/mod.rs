pub mod batch_delete_events;
pub mod batch_update_events;
pub mod create_event;
pub mod delete_event;
pub mod describe;
pub mod list_accounts;
pub mod list_calendars;
pub mod list_events;
pub mod update_calendar_metadata;
pub mod update_event;

use morgen_core::protocol::{Command, Request, Response};
use morgen_core::{BatchResult, MorgenError, MorgenResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::bridge::Bridge;

pub const MAX_BATCH_SIZE: usize = 50;

/// Run one request to completion and render the response line.
///
/// The handler future is dropped when the command's timeout expires.
/// Handlers only touch the registry after their last upstream call, so an
/// expired command leaves no tokens behind.
pub async fn dispatch(bridge: &Bridge, request: Request) -> String {
    let command = request.command;
    let span = tracing::info_span!("command", name = command.name());

    let outcome = tokio::time::timeout(command.timeout(), run(bridge, command, request.params))
        .instrument(span)
        .await;

    match outcome {
        Ok(Ok(data)) => Response::success(data),
        Ok(Err(err)) => {
            tracing::warn!(command = command.name(), kind = ?err.kind(), "{err}");
            Response::error(&err)
        }
        Err(_) => {
            let err = MorgenError::timeout(format!(
                "{} did not finish within {} seconds",
                command.name(),
                command.timeout().as_secs()
            ));
            tracing::warn!(command = command.name(), "{err}");
            Response::error(&err)
        }
    }
}

async fn run(
    bridge: &Bridge,
    command: Command,
    params: serde_json::Value,
) -> MorgenResult<serde_json::Value> {
    match command {
        Command::ListAccounts => list_accounts::handle(bridge).await,
        Command::ListCalendars => list_calendars::handle(bridge).await,
        Command::UpdateCalendarMetadata => update_calendar_metadata::handle(bridge, params).await,
        Command::ListEvents => list_events::handle(bridge, params).await,
        Command::CreateEvent => create_event::handle(bridge, params).await,
        Command::UpdateEvent => update_event::handle(bridge, params).await,
        Command::DeleteEvent => delete_event::handle(bridge, params).await,
        Command::BatchDeleteEvents => batch_delete_events::handle(bridge, params).await,
        Command::BatchUpdateEvents => batch_update_events::handle(bridge, params).await,
        Command::Describe => describe::handle(),
    }
}

/// Deserialize command params. A missing `params` is read as `{}`.
pub fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> MorgenResult<T> {
    let params = if params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| MorgenError::validation(format!("Invalid params: {e}")))
}

pub fn check_batch_size(len: usize, what: &str) -> MorgenResult<()> {
    if len == 0 {
        return Err(MorgenError::validation(format!("'{what}' cannot be empty")));
    }
    if len > MAX_BATCH_SIZE {
        return Err(MorgenError::validation(format!(
            "Too many items in '{what}': {len}. At most {MAX_BATCH_SIZE} are allowed per batch."
        )));
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchItemOk {
    event_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchItemFailed {
    event_id: String,
    kind: morgen_core::ErrorKind,
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchView {
    succeeded: Vec<BatchItemOk>,
    failed: Vec<BatchItemFailed>,
    succeeded_count: usize,
    failed_count: usize,
}

/// Render a batch result keyed by the caller's event IDs.
pub fn batch_view(result: BatchResult) -> MorgenResult<serde_json::Value> {
    let view = BatchView {
        succeeded_count: result.succeeded.len(),
        failed_count: result.failed.len(),
        succeeded: result
            .succeeded
            .into_iter()
            .map(|s| BatchItemOk { event_id: s.id })
            .collect(),
        failed: result
            .failed
            .into_iter()
            .map(|f| BatchItemFailed {
                event_id: f.id,
                kind: f.kind,
                error: f.error,
            })
            .collect(),
    };
    Ok(serde_json::to_value(view)?)
}
