use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::core::security::{IdentityProvider, JwtKeys, SecurityError};
use crate::realtime::channel::ControlChannel;
use crate::realtime::registry::ConnectionRegistry;
use crate::realtime::store::{PgSessionStore, SessionStore};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    keys: JwtKeys,
    channel: ControlChannel,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool) -> Result<Self, SecurityError> {
        let store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db.clone()));
        Self::with_store(settings, db, store)
    }

    /// Builds the state around an explicit session store, one registry per
    /// instance.
    pub(crate) fn with_store(
        settings: Settings,
        db: PgPool,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, SecurityError> {
        let keys = JwtKeys::from_settings(&settings)?;
        let identity: Arc<dyn IdentityProvider> = Arc::new(keys.clone());
        let channel = ControlChannel::new(Arc::new(ConnectionRegistry::new()), store, identity);

        Ok(Self { inner: Arc::new(InnerState { settings, db, keys, channel }) })
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn keys(&self) -> &JwtKeys {
        &self.inner.keys
    }

    pub(crate) fn channel(&self) -> &ControlChannel {
        &self.inner.channel
    }
}
