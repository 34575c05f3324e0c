//! morgen-bridge - exposes Morgen accounts, calendars and events over a
//! JSON line protocol.
//!
//! One request per line on stdin, one response per line on stdout, in the
//! same order. Logs go to stderr, filtered by `MORGEN_LOG` (default `info`).
//!
//! Every identifier exchanged with the caller is a 7-character virtual ID.
//! The mapping to Morgen's IDs is held in memory only, so after a restart
//! callers must list accounts, calendars or events again.

mod bridge;
mod commands;
mod validate;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::stream::FuturesOrdered;
use morgen_core::protocol::{Request, Response};
use morgen_core::{MorgenConfig, MorgenError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::bridge::Bridge;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MORGEN_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = MorgenConfig::load().context("Failed to load configuration")?;
    let bridge = Bridge::from_config(&config).context("Failed to start Morgen client")?;
    tracing::info!(base_url = %config.base_url, "morgen-bridge ready");

    serve(
        &bridge,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Requests read ahead of the oldest unanswered one.
const MAX_IN_FLIGHT: usize = 16;

/// Answer requests until the input closes.
///
/// Requests run concurrently, so a slow `list_events` does not hold up the
/// lines behind it. Responses are written in request order.
async fn serve<R, W>(bridge: &Bridge, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut in_flight = FuturesOrdered::new();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open && in_flight.len() < MAX_IN_FLIGHT => {
                match line.context("Failed to read stdin")? {
                    // Skip empty lines
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => in_flight.push_back(respond(bridge, line)),
                    None => input_open = false,
                }
            }
            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            else => break,
        }
    }

    tracing::info!("input closed, shutting down");
    Ok(())
}

async fn respond(bridge: &Bridge, line: String) -> String {
    match serde_json::from_str::<Request>(&line) {
        Ok(request) => commands::dispatch(bridge, request).await,
        Err(e) => Response::error(&MorgenError::validation(format!(
            "Failed to parse request: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Notify;

    async fn roundtrip(bridge: &Bridge, input: &str) -> Vec<serde_json::Value> {
        let mut output = Vec::new();
        serve(bridge, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_response_per_request_line() {
        let router = Router::new().route(
            "/v3/calendars/list",
            get(|| async {
                Json(json!({ "data": { "calendars": [
                    { "id": CALENDAR_ID, "accountId": ACCOUNT_ID, "name": "Work" }
                ]}}))
            }),
        );
        let bridge = bridge_for(router).await;

        let responses = roundtrip(
            &bridge,
            "{\"command\":\"list_calendars\"}\n\nnot json\n{\"command\":\"describe\",\"params\":{}}\n",
        )
        .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["status"], "success");
        assert_eq!(responses[0]["data"]["calendars"][0]["name"], "Work");
        assert_eq!(responses[1]["status"], "error");
        assert_eq!(responses[1]["error"]["kind"], "validation");
        assert_eq!(responses[2]["status"], "success");
    }

    #[tokio::test]
    async fn test_tokens_from_listing_are_usable_later() {
        let router = Router::new()
            .route(
                "/v3/calendars/list",
                get(|| async {
                    Json(json!({ "data": { "calendars": [
                        { "id": CALENDAR_ID, "accountId": ACCOUNT_ID }
                    ]}}))
                }),
            )
            .route(
                "/v3/calendars/update",
                axum::routing::post(|| async { Json(json!({})) }),
            );
        let bridge = bridge_for(router).await;

        let listed = roundtrip(&bridge, "{\"command\":\"list_calendars\"}\n").await;
        let token = listed[0]["data"]["calendars"][0]["id"].as_str().unwrap();

        let request = json!({
            "command": "update_calendar_metadata",
            "params": { "calendar_id": token, "busy": false }
        });
        let updated = roundtrip(&bridge, &format!("{request}\n")).await;
        assert_eq!(updated[0]["status"], "success");
        assert_eq!(updated[0]["data"]["calendarId"], token);
    }

    #[tokio::test]
    async fn test_slow_request_does_not_block_later_ones() {
        let released = Arc::new(Notify::new());
        let wait = Arc::clone(&released);
        let router = Router::new()
            .route(
                "/v3/integrations/accounts/list",
                get(move || {
                    let wait = Arc::clone(&wait);
                    async move {
                        // Finishes only once the calendars request has been served.
                        wait.notified().await;
                        Json(json!({ "data": { "accounts": [{ "id": ACCOUNT_ID }] } }))
                    }
                }),
            )
            .route(
                "/v3/calendars/list",
                get(move || {
                    let released = Arc::clone(&released);
                    async move {
                        released.notify_one();
                        Json(json!({ "data": { "calendars": [] } }))
                    }
                }),
            );
        let bridge = bridge_for(router).await;

        let responses = roundtrip(
            &bridge,
            "{\"command\":\"list_accounts\"}\n{\"command\":\"list_calendars\"}\n",
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["status"], "success", "{}", responses[0]);
        assert_eq!(responses[0]["data"]["count"], 1);
        assert_eq!(responses[1]["status"], "success");
        assert_eq!(responses[1]["data"]["count"], 0);
    }
}
