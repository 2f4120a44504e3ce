//! Process-wide session handle.
//!
//! The session (identity provider + remote service) is built lazily on first
//! use and then shared read-only by every call site.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::CoreConfig;
use crate::error::ChatError;
use crate::models::Identity;
use crate::service::{HttpChatService, SharedService};

/// Source of the current principal. Login/logout are side effects owned by
/// the identity provider; this core only reads the resulting identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Identity;

    async fn login(&self) -> Result<Identity, ChatError>;

    async fn logout(&self) -> Result<(), ChatError>;
}

/// Serves a preconfigured principal. Logging out falls back to anonymous.
pub struct StaticIdentityProvider {
    configured: Identity,
    current: RwLock<Identity>,
}

impl StaticIdentityProvider {
    pub fn new(configured: Identity) -> Self {
        Self {
            current: RwLock::new(configured.clone()),
            configured,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn current_identity(&self) -> Identity {
        self.current.read().clone()
    }

    async fn login(&self) -> Result<Identity, ChatError> {
        *self.current.write() = self.configured.clone();
        Ok(self.configured.clone())
    }

    async fn logout(&self) -> Result<(), ChatError> {
        *self.current.write() = Identity::anonymous();
        Ok(())
    }
}

pub struct Session {
    config: CoreConfig,
    identity: Arc<dyn IdentityProvider>,
    service: SharedService,
}

impl Session {
    pub fn new(
        config: CoreConfig,
        identity: Arc<dyn IdentityProvider>,
        service: SharedService,
    ) -> Self {
        Self {
            config,
            identity,
            service,
        }
    }

    /// Session against the HTTP gateway described by `config`.
    pub fn connect(config: CoreConfig) -> Result<Self, ChatError> {
        let identity = config.identity.clone().unwrap_or_default();
        let service = HttpChatService::new(&config, identity.clone())
            .map_err(|e| ChatError::Session(e.to_string()))?;
        info!(host = %config.host, canister = %config.canister_id, "session ready");
        Ok(Self::new(
            config,
            Arc::new(StaticIdentityProvider::new(identity)),
            Arc::new(service),
        ))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn service(&self) -> SharedService {
        self.service.clone()
    }

    pub fn identity_provider(&self) -> Arc<dyn IdentityProvider> {
        self.identity.clone()
    }

    pub fn identity(&self) -> Identity {
        self.identity.current_identity()
    }
}

/// Once-only async initializer for a shared session.
pub struct SessionCell {
    cell: OnceCell<Arc<Session>>,
}

impl SessionCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Return the session, building it with `init` if this is the first
    /// call. Concurrent first callers wait on the same initialization; a
    /// failed `init` leaves the cell empty so a later call can retry.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<Session>, ChatError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session, ChatError>>,
    {
        self.cell
            .get_or_try_init(|| async move { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<Session>> {
        self.cell.get().cloned()
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_SESSION: SessionCell = SessionCell::new();

/// The process-wide session cell.
pub fn global() -> &'static SessionCell {
    &GLOBAL_SESSION
}
