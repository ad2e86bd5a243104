//! Live connection table shared by every socket task of one server.

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::db::types::UserRole;
use crate::realtime::protocol::ServerMessage;

pub(crate) type ConnectionId = Uuid;

/// Sending side of one socket's outbound queue.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id: Uuid::new_v4(), tx }, rx)
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a frame; false once the socket writer is gone.
    pub(crate) fn send(&self, message: ServerMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Connection {
    pub(crate) handle: ConnectionHandle,
    pub(crate) user_id: String,
    pub(crate) role: UserRole,
    pub(crate) session_id: Option<String>,
}

/// Authenticated connections in registration order.
///
/// Lookups are linear scans; a server holds at most a few hundred sockets.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    entries: RwLock<Vec<Connection>>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records the identity behind `handle`. Re-authenticating on the same
    /// socket replaces the previous entry and drops its joined session.
    pub(crate) async fn register(&self, handle: ConnectionHandle, user_id: String, role: UserRole) {
        let mut entries = self.entries.write().await;
        let connection = Connection { handle, user_id, role, session_id: None };
        match entries.iter_mut().find(|entry| entry.handle.id == connection.handle.id) {
            Some(existing) => *existing = connection,
            None => entries.push(connection),
        }
    }

    /// Binds the connection to an exam session; false when it never
    /// authenticated.
    pub(crate) async fn attach_session(&self, id: ConnectionId, session_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|entry| entry.handle.id == id) {
            Some(entry) => {
                entry.session_id = Some(session_id.to_string());
                true
            }
            None => false,
        }
    }

    pub(crate) async fn remove(&self, id: ConnectionId) -> Option<Connection> {
        let mut entries = self.entries.write().await;
        let index = entries.iter().position(|entry| entry.handle.id == id)?;
        Some(entries.remove(index))
    }

    pub(crate) async fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.entries.read().await.iter().find(|entry| entry.handle.id == id).cloned()
    }

    pub(crate) async fn find_by_roles(&self, roles: &[UserRole]) -> Vec<Connection> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| roles.contains(&entry.role))
            .cloned()
            .collect()
    }

    pub(crate) async fn find_by_session(&self, session_id: &str) -> Vec<Connection> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect()
    }

    /// Sends to every connection holding one of `roles`; returns how many
    /// queues accepted the frame.
    pub(crate) async fn broadcast_to_roles(
        &self,
        roles: &[UserRole],
        message: &ServerMessage,
    ) -> usize {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| roles.contains(&entry.role))
            .filter(|entry| entry.handle.send(message.clone()))
            .count()
    }

    /// Delivers to the first student joined to `session_id`, if any.
    pub(crate) async fn send_to_session_student(
        &self,
        session_id: &str,
        message: ServerMessage,
    ) -> usize {
        let entries = self.entries.read().await;
        let student = entries.iter().find(|entry| {
            entry.role == UserRole::Student && entry.session_id.as_deref() == Some(session_id)
        });
        match student {
            Some(entry) if entry.handle.send(message) => 1,
            _ => 0,
        }
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping() -> ServerMessage {
        ServerMessage::error("ping")
    }

    #[tokio::test]
    async fn register_replaces_entry_for_same_handle() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = ConnectionHandle::channel();

        registry.register(handle.clone(), "s1".into(), UserRole::Student).await;
        assert!(registry.attach_session(handle.id(), "sess-1").await);
        registry.register(handle.clone(), "p1".into(), UserRole::Proctor).await;

        assert_eq!(registry.len().await, 1);
        let entry = registry.get(handle.id()).await.expect("entry");
        assert_eq!(entry.user_id, "p1");
        assert_eq!(entry.role, UserRole::Proctor);
        assert_eq!(entry.session_id, None);
    }

    #[tokio::test]
    async fn attach_requires_registration() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = ConnectionHandle::channel();
        assert!(!registry.attach_session(handle.id(), "sess-1").await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn remove_drops_only_that_connection() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = ConnectionHandle::channel();
        let (second, _rx2) = ConnectionHandle::channel();
        registry.register(first.clone(), "s1".into(), UserRole::Student).await;
        registry.register(second.clone(), "s2".into(), UserRole::Student).await;

        let removed = registry.remove(first.id()).await.expect("removed");
        assert_eq!(removed.user_id, "s1");
        assert!(registry.remove(first.id()).await.is_none());
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(second.id()).await.is_some());
    }

    #[tokio::test]
    async fn broadcast_counts_live_recipients_only() {
        let registry = ConnectionRegistry::new();
        let (proctor, mut proctor_rx) = ConnectionHandle::channel();
        let (instructor, instructor_rx) = ConnectionHandle::channel();
        let (student, mut student_rx) = ConnectionHandle::channel();
        registry.register(proctor, "p1".into(), UserRole::Proctor).await;
        registry.register(instructor, "i1".into(), UserRole::Instructor).await;
        registry.register(student, "s1".into(), UserRole::Student).await;

        drop(instructor_rx);
        let delivered = registry
            .broadcast_to_roles(&[UserRole::Proctor, UserRole::Instructor], &ping())
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(proctor_rx.try_recv().ok(), Some(ping()));
        assert!(student_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn session_student_lookup_skips_staff_and_other_sessions() {
        let registry = ConnectionRegistry::new();
        let (proctor, mut proctor_rx) = ConnectionHandle::channel();
        let (other, mut other_rx) = ConnectionHandle::channel();
        let (student, mut student_rx) = ConnectionHandle::channel();
        registry.register(proctor.clone(), "p1".into(), UserRole::Proctor).await;
        registry.register(other.clone(), "s2".into(), UserRole::Student).await;
        registry.register(student.clone(), "s1".into(), UserRole::Student).await;
        registry.attach_session(proctor.id(), "sess-1").await;
        registry.attach_session(other.id(), "sess-2").await;
        registry.attach_session(student.id(), "sess-1").await;

        assert_eq!(registry.find_by_session("sess-1").await.len(), 2);
        assert_eq!(registry.send_to_session_student("sess-1", ping()).await, 1);
        assert_eq!(student_rx.try_recv().ok(), Some(ping()));
        assert!(proctor_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_err());

        assert_eq!(registry.send_to_session_student("sess-9", ping()).await, 0);
    }

    #[tokio::test]
    async fn find_by_roles_filters() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::channel();
        let (b, _rb) = ConnectionHandle::channel();
        registry.register(a, "a1".into(), UserRole::Admin).await;
        registry.register(b, "s1".into(), UserRole::Student).await;

        let admins = registry.find_by_roles(&[UserRole::Admin]).await;
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].user_id, "a1");
        assert!(registry.find_by_roles(&[UserRole::Proctor]).await.is_empty());
    }
}
