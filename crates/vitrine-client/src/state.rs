//! Application state shared by the headless client.
//!
//! [`AppState`] owns the long-lived handles (local database, gateway client,
//! event bridge) and wires the realtime pieces together once a session is
//! known.

use std::sync::{Arc, Mutex};

use tracing::info;

use vitrine_net::{pump, spawn_socket, ApiClient, EventBridge, SocketConfig, SocketHandle};
use vitrine_shared::types::{ShopId, UserId, UserType};
use vitrine_store::{Database, StoredSession};

use crate::badges::BadgeStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::reconciler::Reconciler;
use crate::session::SessionManager;

pub struct AppState {
    pub config: ClientConfig,

    /// Local SQLite store holding the session entries and settings.
    pub db: Arc<Mutex<Database>>,

    /// Gateway client; carries the bearer token once signed in.
    pub api: ApiClient,

    pub sessions: SessionManager,

    /// Fan-out point for realtime notifications.
    pub bridge: EventBridge,

    /// Badge counters for the signed-in user. Zeroed on logout.
    pub badges: BadgeStore,
}

/// Handles returned by [`AppState::start_realtime`].
pub struct Realtime {
    pub socket: SocketHandle,
    pub reconciler: Reconciler<ApiClient>,
}

impl AppState {
    /// Open the local store and build the gateway client. URL overrides
    /// saved in the settings row win over the environment.
    pub fn open(mut config: ClientConfig) -> Result<Self> {
        let db = match &config.data_dir {
            Some(dir) => Database::open_in_dir(dir)?,
            None => Database::new()?,
        };

        let settings = db.get_settings()?;
        config.apply_settings(&settings);

        let api = ApiClient::new(&config.api_base_url)?;
        let db = Arc::new(Mutex::new(db));
        let sessions = SessionManager::new(Arc::clone(&db), api.clone(), config.session_max_age)?;

        info!(api = %config.api_base_url, socket = %config.socket_url, "Client state opened");

        Ok(Self {
            config,
            db,
            api,
            sessions,
            bridge: EventBridge::new(),
            badges: BadgeStore::new(UserId::new("")),
        })
    }

    /// Restore the stored session, or sign in with the configured
    /// credentials when there is none.
    pub async fn sign_in(&self) -> Result<StoredSession> {
        if let Some(session) = self.sessions.restore()? {
            return Ok(session);
        }
        match &self.config.credentials {
            Some(creds) => self.sessions.login(&creds.email, &creds.password).await,
            None => Err(ClientError::NoSession),
        }
    }

    /// Spawn the socket task and its pump, and build the reconciler for
    /// `session`.
    pub fn start_realtime(&self, session: &StoredSession) -> Result<Realtime> {
        let mut socket_config =
            SocketConfig::new(self.config.socket_url.clone()).with_token(session.auth_token.clone());
        socket_config.reconnect_initial = self.config.reconnect_initial;
        socket_config.reconnect_max = self.config.reconnect_max;

        let (socket, notifications) = spawn_socket(socket_config)?;
        tokio::spawn(pump(self.bridge.clone(), notifications));

        self.badges.reset(session.user.id.clone());
        let reconciler = Reconciler::new(Arc::new(self.api.clone()), self.badges.clone(), shop_of(session))
            .with_socket(socket.clone())
            .with_typing_timeout(self.config.typing_timeout);

        Ok(Realtime { socket, reconciler })
    }

    /// Sign out and zero every badge so the next account starts clean.
    pub fn logout(&self) -> Result<()> {
        self.sessions.logout()?;
        self.badges.reset(UserId::new(""));
        Ok(())
    }
}

/// The shop whose inbox and orders the session watches.
fn shop_of(session: &StoredSession) -> Option<ShopId> {
    match session.user_type {
        UserType::Shop => session.shop.as_ref().map(|s| s.id.clone()),
        UserType::User | UserType::Admin => None,
    }
}
