//! Uniform response envelope for every tool invocation.
//!
//! The dispatcher produces exactly one `ResponseEnvelope` per call; the HTTP
//! layer only decides which status code to attach to it.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use http::StatusCode;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Last timestamp handed out, in microseconds since the epoch.
static LAST_STAMP_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current time, never earlier than any timestamp previously returned.
pub fn next_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    let micros = now.timestamp_micros();
    let previous = LAST_STAMP_MICROS.fetch_max(micros, Ordering::AcqRel);
    if previous > micros {
        DateTime::from_timestamp_micros(previous).unwrap_or(now)
    } else {
        now
    }
}

/// RFC 3339 rendering used on the wire.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Classification of failures raised inside the bridge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No tool registered under the requested name.
    NotFound,
    /// Parameters could not be bound to the tool (missing required argument).
    BadArguments,
    /// The upstream could not be reached or returned an unreadable body.
    Transport,
    /// Anything else. Details stay in the server log.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::BadArguments => "bad_arguments",
            Self::Transport => "transport",
            Self::Internal => "internal",
        }
    }

    /// HTTP status the transport attaches to an envelope of this kind.
    ///
    /// `Transport` failures stay at 200: like upstream errors, the envelope
    /// body carries the failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadArguments => StatusCode::BAD_REQUEST,
            Self::Transport => StatusCode::OK,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    Success {
        data: Value,
        timestamp: DateTime<Utc>,
    },
    UpstreamError {
        message: String,
        upstream_body: Option<String>,
        timestamp: DateTime<Utc>,
    },
    InternalError {
        kind: ErrorKind,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ResponseEnvelope {
    pub fn success(data: Value) -> Self {
        Self::Success {
            data,
            timestamp: next_timestamp(),
        }
    }

    pub fn upstream_error(message: impl Into<String>, upstream_body: Option<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
            upstream_body,
            timestamp: next_timestamp(),
        }
    }

    pub fn internal(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::InternalError {
            kind,
            message: message.into(),
            timestamp: next_timestamp(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. }
            | Self::UpstreamError { timestamp, .. }
            | Self::InternalError { timestamp, .. } => *timestamp,
        }
    }

    /// The error kind for internal failures, `None` otherwise.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InternalError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status code for this envelope.
    ///
    /// Upstream failures are reported with 200; callers must inspect
    /// `status` in the body to detect tool-level failure.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success { .. } | Self::UpstreamError { .. } => StatusCode::OK,
            Self::InternalError { kind, .. } => kind.status_code(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "status": "error",
                "message": "internal serialization error",
            })
        })
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Success { data, timestamp } => {
                map.serialize_entry("status", "success")?;
                map.serialize_entry("data", data)?;
                map.serialize_entry("timestamp", &format_timestamp(timestamp))?;
            }
            Self::UpstreamError {
                message,
                upstream_body,
                timestamp,
            } => {
                map.serialize_entry("status", "error")?;
                map.serialize_entry("message", message)?;
                if let Some(body) = upstream_body {
                    map.serialize_entry("error", body)?;
                }
                map.serialize_entry("timestamp", &format_timestamp(timestamp))?;
            }
            Self::InternalError {
                kind,
                message,
                timestamp,
            } => {
                map.serialize_entry("status", "error")?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("kind", kind.as_str())?;
                map.serialize_entry("timestamp", &format_timestamp(timestamp))?;
            }
        }
        map.end()
    }
}
