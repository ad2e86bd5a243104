//! JSON wire format of the session control channel.
//!
//! Every frame is an object with a `type` tag; payload fields use the
//! camelCase names the browser clients send.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::types::{SessionStatus, UserRole};

pub(crate) const INVALID_FORMAT: &str = "Invalid message format";
pub(crate) const UNKNOWN_TYPE: &str = "Unknown message type";
pub(crate) const NOT_AUTHENTICATED: &str = "Not authenticated";
pub(crate) const PROCESSING_FAILED: &str = "Failed to process message";

#[derive(Debug, Error)]
#[error("malformed control message: {0}")]
pub(crate) struct ProtocolError(#[from] serde_json::Error);

/// Client to server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClientMessage {
    Authenticate {
        token: String,
    },
    JoinSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    StudentActivity {
        #[serde(rename = "sessionId")]
        session_id: Option<String>,
        activity: ActivityReport,
    },
    ProctorAction {
        action: ProctorAction,
        #[serde(rename = "targetSessionId")]
        target_session_id: String,
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
    TimeUpdate {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "timeRemaining")]
        time_remaining: i64,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub(crate) fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Stable label for logs and metrics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Authenticate { .. } => "authenticate",
            Self::JoinSession { .. } => "join_session",
            Self::StudentActivity { .. } => "student_activity",
            Self::ProctorAction { .. } => "proctor_action",
            Self::TimeUpdate { .. } => "time_update",
            Self::Unknown => "unknown",
        }
    }
}

/// A client-observed integrity event such as a tab switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ActivityReport {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ProctorAction {
    PauseSession,
    ResumeSession,
    TerminateSession,
}

impl ProctorAction {
    pub(crate) fn target_status(self) -> SessionStatus {
        match self {
            Self::PauseSession => SessionStatus::Paused,
            Self::ResumeSession => SessionStatus::Active,
            Self::TerminateSession => SessionStatus::Terminated,
        }
    }

    /// Notification delivered to the student whose session was changed.
    pub(crate) fn notification(self) -> ServerMessage {
        match self {
            Self::PauseSession => ServerMessage::SessionPaused {
                message: "Your exam has been paused by the proctor".to_string(),
            },
            Self::ResumeSession => {
                ServerMessage::SessionResumed { message: "Your exam has been resumed".to_string() }
            }
            Self::TerminateSession => ServerMessage::SessionTerminated {
                message: "Your exam has been terminated".to_string(),
            },
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::PauseSession => "pause_session",
            Self::ResumeSession => "resume_session",
            Self::TerminateSession => "terminate_session",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AuthenticatedUser {
    pub(crate) id: String,
    pub(crate) role: UserRole,
}

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerMessage {
    Authenticated {
        #[serde(rename = "clientId")]
        client_id: String,
        user: AuthenticatedUser,
    },
    AuthError {
        message: String,
    },
    SessionJoined {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Error {
        message: String,
    },
    StudentActivity {
        #[serde(rename = "sessionId")]
        session_id: Option<String>,
        #[serde(rename = "studentId")]
        student_id: String,
        activity: ActivityReport,
    },
    SessionPaused {
        message: String,
    },
    SessionResumed {
        message: String,
    },
    SessionTerminated {
        message: String,
    },
}

impl ServerMessage {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub(crate) fn auth_error(message: impl Into<String>) -> Self {
        Self::AuthError { message: message.into() }
    }
}
