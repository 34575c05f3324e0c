//! JSON line protocol spoken by the bridge over stdin/stdout.
//!
//! One request per line in, one response per line out. Every identifier in
//! params and results is a virtual ID.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::RateLimit;
use crate::error::{ErrorKind, MorgenError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const LONG_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListAccounts,
    ListCalendars,
    UpdateCalendarMetadata,
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    BatchDeleteEvents,
    BatchUpdateEvents,
    Describe,
}

/// Behavioural hints a caller can use to decide on confirmation and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandHints {
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub timeout_secs: u64,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::ListAccounts,
        Command::ListCalendars,
        Command::UpdateCalendarMetadata,
        Command::ListEvents,
        Command::CreateEvent,
        Command::UpdateEvent,
        Command::DeleteEvent,
        Command::BatchDeleteEvents,
        Command::BatchUpdateEvents,
        Command::Describe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::ListAccounts => "list_accounts",
            Command::ListCalendars => "list_calendars",
            Command::UpdateCalendarMetadata => "update_calendar_metadata",
            Command::ListEvents => "list_events",
            Command::CreateEvent => "create_event",
            Command::UpdateEvent => "update_event",
            Command::DeleteEvent => "delete_event",
            Command::BatchDeleteEvents => "batch_delete_events",
            Command::BatchUpdateEvents => "batch_update_events",
            Command::Describe => "describe",
        }
    }

    /// Wall-clock budget for the whole command, upstream calls included.
    pub fn timeout(&self) -> Duration {
        match self {
            Command::ListEvents | Command::BatchDeleteEvents | Command::BatchUpdateEvents => {
                LONG_TIMEOUT
            }
            _ => DEFAULT_TIMEOUT,
        }
    }

    pub fn hints(&self) -> CommandHints {
        let (read_only, destructive, idempotent) = match self {
            Command::ListAccounts
            | Command::ListCalendars
            | Command::ListEvents
            | Command::Describe => (true, false, true),
            Command::UpdateCalendarMetadata | Command::UpdateEvent => (false, false, true),
            Command::CreateEvent | Command::BatchUpdateEvents => (false, false, false),
            Command::DeleteEvent | Command::BatchDeleteEvents => (false, true, false),
        };
        CommandHints {
            read_only,
            destructive,
            idempotent,
            timeout_secs: self.timeout().as_secs(),
        }
    }
}

/// Request read from stdin.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

impl From<&MorgenError> for ErrorBody {
    fn from(err: &MorgenError) -> Self {
        let (retry_after, rate_limit) = match err {
            MorgenError::Upstream {
                retry_after,
                rate_limit,
                ..
            } => (*retry_after, *rate_limit),
            _ => (None, None),
        };
        ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
            status_code: err.status_code(),
            retry_after,
            rate_limit,
        }
    }
}

/// Response written to stdout.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: ErrorBody },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        Response::Success { data }.to_line()
    }

    fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            Err(e) => Response::<()>::error(&MorgenError::Serialization(e.to_string())),
        }
    }
}

impl Response<()> {
    pub fn error(err: &MorgenError) -> String {
        let body = ErrorBody::from(err);
        // ErrorBody holds only strings and integers.
        serde_json::to_value(&body)
            .map(|error| serde_json::json!({ "status": "error", "error": error }).to_string())
            .unwrap_or_else(|_| {
                serde_json::json!({
                    "status": "error",
                    "error": { "kind": "serialization", "message": body.message },
                })
                .to_string()
            })
    }
}
