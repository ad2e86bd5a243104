//! Per-message routing for the session control channel.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;

use crate::core::security::IdentityProvider;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::FlaggedActivity;
use crate::db::types::UserRole;
use crate::realtime::protocol::{
    ActivityReport, AuthenticatedUser, ClientMessage, ProctorAction, ServerMessage,
    INVALID_FORMAT, NOT_AUTHENTICATED, PROCESSING_FAILED, UNKNOWN_TYPE,
};
use crate::realtime::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::realtime::store::{SessionStore, StoreError};
use crate::repositories::sessions::StatusUpdate;

/// Roles that receive student activity relays.
pub(crate) const STAFF_ROLES: [UserRole; 2] = [UserRole::Proctor, UserRole::Instructor];

/// Result of a proctor status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProctorOutcome {
    pub(crate) update: StatusUpdate,
    /// Student connections that received the notification (0 or 1).
    pub(crate) delivered: usize,
}

#[derive(Clone)]
pub(crate) struct ControlChannel {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ControlChannel {
    pub(crate) fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { registry, store, identity, shutdown: Arc::new(shutdown) }
    }

    pub(crate) fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub(crate) fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Asks every socket task to close.
    pub(crate) fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Handles one inbound text frame. Never fails: every problem becomes a
    /// reply on the same connection or a log line.
    pub(crate) async fn handle_text(&self, conn: &ConnectionHandle, raw: &str) {
        let message = match ClientMessage::parse(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(connection_id = %conn.id(), error = %err, "rejected control frame");
                metrics::counter!("ws_messages_total", "type" => "invalid").increment(1);
                conn.send(ServerMessage::error(INVALID_FORMAT));
                return;
            }
        };

        let kind = message.kind();
        metrics::counter!("ws_messages_total", "type" => kind).increment(1);

        match AssertUnwindSafe(self.dispatch(conn, message)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(
                    connection_id = %conn.id(),
                    message_type = kind,
                    error = %err,
                    "control message failed"
                );
                conn.send(ServerMessage::error(PROCESSING_FAILED));
            }
            Err(_) => {
                tracing::error!(
                    connection_id = %conn.id(),
                    message_type = kind,
                    "control message handler panicked"
                );
                conn.send(ServerMessage::error(PROCESSING_FAILED));
            }
        }
    }

    async fn dispatch(
        &self,
        conn: &ConnectionHandle,
        message: ClientMessage,
    ) -> Result<(), StoreError> {
        match message {
            ClientMessage::Authenticate { token } => self.authenticate(conn, &token).await,
            ClientMessage::JoinSession { session_id } => {
                self.join_session(conn, session_id).await;
                Ok(())
            }
            ClientMessage::StudentActivity { session_id, activity } => {
                self.student_activity(conn, session_id, activity).await
            }
            ClientMessage::ProctorAction { action, target_session_id, data } => {
                self.proctor_action(conn, action, &target_session_id, data).await
            }
            ClientMessage::TimeUpdate { session_id, time_remaining } => {
                self.time_update(conn, &session_id, time_remaining).await
            }
            ClientMessage::Unknown => {
                conn.send(ServerMessage::error(UNKNOWN_TYPE));
                Ok(())
            }
        }
    }

    async fn authenticate(&self, conn: &ConnectionHandle, token: &str) -> Result<(), StoreError> {
        let user_id = match self.identity.resolve(token) {
            Ok(user_id) => user_id,
            Err(err) => {
                tracing::debug!(connection_id = %conn.id(), error = %err, "token rejected");
                conn.send(ServerMessage::auth_error("Invalid token"));
                return Ok(());
            }
        };

        let user = match self.store.get_user(&user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                conn.send(ServerMessage::auth_error("User not found"));
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(connection_id = %conn.id(), %user_id, error = %err, "user lookup failed");
                conn.send(ServerMessage::auth_error("Authentication failed"));
                return Ok(());
            }
        };

        self.registry.register(conn.clone(), user.id.clone(), user.role).await;
        tracing::info!(
            connection_id = %conn.id(),
            user_id = %user.id,
            role = user.role.as_str(),
            "control channel authenticated"
        );

        conn.send(ServerMessage::Authenticated {
            client_id: format!("{}-{}", user.id, conn.id()),
            user: AuthenticatedUser { id: user.id, role: user.role },
        });
        Ok(())
    }

    // Neither existence nor ownership of the session is checked here.
    async fn join_session(&self, conn: &ConnectionHandle, session_id: String) {
        if self.registry.attach_session(conn.id(), &session_id).await {
            tracing::debug!(connection_id = %conn.id(), %session_id, "joined session");
            conn.send(ServerMessage::SessionJoined { session_id });
        } else {
            conn.send(ServerMessage::error(NOT_AUTHENTICATED));
        }
    }

    async fn student_activity(
        &self,
        conn: &ConnectionHandle,
        session_id: Option<String>,
        activity: ActivityReport,
    ) -> Result<(), StoreError> {
        let Some(client) = self.registry.get(conn.id()).await else {
            return Ok(());
        };
        if client.role != UserRole::Student {
            return Ok(());
        }

        let session_id = session_id.or(client.session_id);
        if let Some(session_id) = session_id.as_deref() {
            let entry = FlaggedActivity {
                kind: activity.kind.clone(),
                data: activity.data.clone(),
                timestamp: format_primitive(primitive_now_utc()),
                student_id: client.user_id.clone(),
            };
            if !self.store.add_flagged_activity(session_id, entry).await? {
                tracing::warn!(%session_id, user_id = %client.user_id, "activity for unknown session");
            }
        }

        let relay = ServerMessage::StudentActivity {
            session_id,
            student_id: client.user_id,
            activity,
        };
        let delivered = self.registry.broadcast_to_roles(&STAFF_ROLES, &relay).await;
        metrics::counter!("ws_notifications_delivered_total").increment(delivered as u64);
        Ok(())
    }

    async fn proctor_action(
        &self,
        conn: &ConnectionHandle,
        action: ProctorAction,
        target_session_id: &str,
        data: Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        let Some(client) = self.registry.get(conn.id()).await else {
            return Ok(());
        };
        if !client.role.is_proctoring_staff() {
            return Ok(());
        }
        tracing::info!(
            user_id = %client.user_id,
            session_id = %target_session_id,
            action = action.as_str(),
            data = ?data,
            "proctor action requested"
        );

        let outcome = self.apply_proctor_action(action, target_session_id).await?;
        match outcome.update {
            StatusUpdate::Applied => {}
            StatusUpdate::NotFound => {
                conn.send(ServerMessage::error("Session not found"));
            }
            StatusUpdate::Rejected(current) => {
                conn.send(ServerMessage::error(format!(
                    "Session is already {}",
                    current.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Persists the status behind `action` and, when it was applied,
    /// notifies the student joined to the session. Shared by the socket and
    /// the proctor REST endpoints.
    pub(crate) async fn apply_proctor_action(
        &self,
        action: ProctorAction,
        session_id: &str,
    ) -> Result<ProctorOutcome, StoreError> {
        let update = self.store.update_session_status(session_id, action.target_status()).await?;

        let delivered = match update {
            StatusUpdate::Applied => {
                self.registry.send_to_session_student(session_id, action.notification()).await
            }
            StatusUpdate::NotFound | StatusUpdate::Rejected(_) => 0,
        };
        metrics::counter!("ws_notifications_delivered_total").increment(delivered as u64);

        tracing::info!(
            %session_id,
            action = action.as_str(),
            ?update,
            delivered,
            "proctor action processed"
        );
        Ok(ProctorOutcome { update, delivered })
    }

    async fn time_update(
        &self,
        conn: &ConnectionHandle,
        session_id: &str,
        time_remaining: i64,
    ) -> Result<(), StoreError> {
        let Some(client) = self.registry.get(conn.id()).await else {
            return Ok(());
        };
        if client.role != UserRole::Student {
            return Ok(());
        }

        let seconds = i32::try_from(time_remaining.max(0)).unwrap_or(i32::MAX);
        if !self.store.update_session_time(session_id, seconds).await? {
            tracing::debug!(%session_id, "time update for unknown session");
        }
        Ok(())
    }

    /// Drops the registry entry of a closed socket.
    pub(crate) async fn disconnect(&self, id: ConnectionId) {
        if let Some(connection) = self.registry.remove(id).await {
            tracing::info!(
                connection_id = %id,
                user_id = %connection.user_id,
                "control channel connection removed"
            );
        }
    }
}
