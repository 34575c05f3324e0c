//! Authenticated HTTP client for the Morgen v3 API.
//!
//! One `reqwest::Client` (and so one connection pool) is built per
//! `MorgenClient` and shared by every call. Non-success statuses become
//! [`MorgenError::Upstream`]; requests that never produced a status become
//! [`MorgenError::Transport`].

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::MorgenConfig;
use crate::error::{MorgenError, MorgenResult, TransportReason};
use crate::model::{
    Account, AccountsList, ApiResponse, Calendar, CalendarUpdateRequest, CalendarsList,
    CreatedEvent, Event, EventCreateRequest, EventCreateResponse, EventDeleteRequest,
    EventUpdateRequest, EventsList, LocalDateTime, SeriesUpdateMode,
};

/// Quota state reported by the `RateLimit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset_seconds: u64,
}

impl RateLimit {
    /// All three headers must be present and numeric.
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)?
                .to_str()
                .ok()?
                .trim()
                .parse::<u64>()
                .ok()
        };
        Some(RateLimit {
            limit: read("RateLimit-Limit")?,
            remaining: read("RateLimit-Remaining")?,
            reset_seconds: read("RateLimit-Reset")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MorgenClient {
    http: reqwest::Client,
    base_url: String,
}

impl MorgenClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> MorgenResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("ApiKey {api_key}"))
            .map_err(|_| MorgenError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MorgenError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(MorgenClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &MorgenConfig) -> MorgenResult<Self> {
        Self::new(&config.api_key, &config.base_url, config.timeout())
    }

    /// GET /integrations/accounts/list
    pub async fn list_accounts(&self) -> MorgenResult<Vec<Account>> {
        let list: AccountsList = self.get("/integrations/accounts/list", &[]).await?;
        Ok(list.accounts)
    }

    /// GET /calendars/list
    pub async fn list_calendars(&self) -> MorgenResult<Vec<Calendar>> {
        let list: CalendarsList = self.get("/calendars/list", &[]).await?;
        Ok(list.calendars)
    }

    /// POST /calendars/update
    pub async fn update_calendar_metadata(&self, request: &CalendarUpdateRequest) -> MorgenResult<()> {
        self.send(Method::POST, "/calendars/update", &[], Some(request))
            .await?;
        Ok(())
    }

    /// GET /events/list for calendars of a single account.
    pub async fn list_events(
        &self,
        account_id: &str,
        calendar_ids: &[String],
        start: LocalDateTime,
        end: LocalDateTime,
    ) -> MorgenResult<Vec<Event>> {
        let calendar_ids = calendar_ids.join(",");
        let start = start.to_string();
        let end = end.to_string();
        let list: EventsList = self
            .get(
                "/events/list",
                &[
                    ("accountId", account_id),
                    ("calendarIds", &calendar_ids),
                    ("start", &start),
                    ("end", &end),
                ],
            )
            .await?;
        Ok(list.events)
    }

    /// POST /events/create
    pub async fn create_event(&self, request: &EventCreateRequest) -> MorgenResult<CreatedEvent> {
        let response = self
            .send(Method::POST, "/events/create", &[], Some(request))
            .await?;
        let created: EventCreateResponse = decode_data(response).await?;
        Ok(created.event)
    }

    /// POST /events/update
    pub async fn update_event(
        &self,
        request: &EventUpdateRequest,
        mode: SeriesUpdateMode,
    ) -> MorgenResult<()> {
        self.send(
            Method::POST,
            "/events/update",
            &[("seriesUpdateMode", mode.as_str())],
            Some(request),
        )
        .await?;
        Ok(())
    }

    /// POST /events/delete
    pub async fn delete_event(
        &self,
        request: &EventDeleteRequest,
        mode: SeriesUpdateMode,
    ) -> MorgenResult<()> {
        self.send(
            Method::POST,
            "/events/delete",
            &[("seriesUpdateMode", mode.as_str())],
            Some(request),
        )
        .await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> MorgenResult<T> {
        let response = self.send::<()>(Method::GET, path, query, None).await?;
        decode_data(response).await
    }

    /// Send one request and return the response if its status is a success.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> MorgenResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, path, "morgen request");

        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let err = error_from_response(response).await;
        tracing::warn!(status = status.as_u16(), path, "morgen rejected request");
        Err(err)
    }
}

/// Unwrap the `{"data": ...}` envelope of a success response.
async fn decode_data<T: DeserializeOwned>(response: Response) -> MorgenResult<T> {
    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str::<ApiResponse<T>>(&text)
        .map(|envelope| envelope.data)
        .map_err(|e| MorgenError::InvalidResponse(e.to_string()))
}

fn transport_error(err: reqwest::Error) -> MorgenError {
    let reason = if err.is_timeout() {
        TransportReason::Timeout
    } else if err.is_connect() {
        TransportReason::Connect
    } else {
        TransportReason::Other
    };
    tracing::warn!(%reason, "morgen request did not complete: {err}");
    MorgenError::Transport {
        reason,
        message: err.to_string(),
    }
}

async fn error_from_response(response: Response) -> MorgenError {
    let status = response.status();
    let rate_limit = RateLimit::from_headers(response.headers());
    let retry_after_raw = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string());
    let retry_after = retry_after_raw.as_deref().and_then(|v| v.parse().ok());

    let message = match status {
        StatusCode::TOO_MANY_REQUESTS => format!(
            "Rate limit exceeded. Retry after {} seconds.",
            retry_after_raw.as_deref().unwrap_or("unknown")
        ),
        StatusCode::UNAUTHORIZED => "Authentication failed. Check your API key.".to_string(),
        StatusCode::FORBIDDEN => {
            "Access forbidden. You may not have permission for this operation.".to_string()
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            message_from_body(&text)
        }
    };

    MorgenError::Upstream {
        status: status.as_u16(),
        message,
        rate_limit,
        retry_after,
    }
}

/// The body's `message` field if it is a JSON object carrying one, else the raw text.
fn message_from_body(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| text.to_string())
}
