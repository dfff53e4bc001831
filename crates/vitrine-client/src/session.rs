//! Sign-in, restore and sign-out.
//!
//! The gateway's bearer token and the persisted session entries always move
//! together: a session is saved only after the backend accepted the
//! credentials, and logging out clears both.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use vitrine_net::{ApiClient, Registration, ShopRegistration};
use vitrine_shared::models::AuthResponse;
use vitrine_store::{Database, StoredSession};

use crate::error::{ClientError, Result};

pub struct SessionManager {
    db: Arc<Mutex<Database>>,
    api: ApiClient,
    max_age: chrono::Duration,
}

fn lock(db: &Mutex<Database>) -> MutexGuard<'_, Database> {
    match db.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SessionManager {
    pub fn new(db: Arc<Mutex<Database>>, api: ApiClient, max_age: Duration) -> Result<Self> {
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| ClientError::Config(format!("session max age: {e}")))?;
        Ok(Self { db, api, max_age })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<StoredSession> {
        let auth = self.api.login(email, password).await?;
        self.establish(auth)
    }

    pub async fn register(&self, registration: &Registration) -> Result<StoredSession> {
        let auth = self.api.register(registration).await?;
        self.establish(auth)
    }

    pub async fn register_shop(&self, registration: &ShopRegistration) -> Result<StoredSession> {
        let auth = self.api.register_shop(registration).await?;
        self.establish(auth)
    }

    fn establish(&self, auth: AuthResponse) -> Result<StoredSession> {
        let session = StoredSession {
            user_type: auth.resolved_user_type(),
            auth_token: auth.token,
            user: auth.user,
            shop: auth.shop,
            session_timestamp: Utc::now(),
        };

        lock(&self.db).save_session(&session)?;
        self.api.set_token(Some(session.auth_token.clone()));

        info!(user = %session.user.id, user_type = %session.user_type, "Signed in");
        Ok(session)
    }

    /// Reload the stored session. Sessions older than the max age are
    /// cleared and reported as absent.
    pub fn restore(&self) -> Result<Option<StoredSession>> {
        let db = lock(&self.db);
        let Some(session) = db.load_session()? else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_expired(now, self.max_age) {
            let removed = db.clear_session()?;
            warn!(
                user = %session.user.id,
                age_secs = session.age(now).num_seconds(),
                removed,
                "Stored session expired"
            );
            return Ok(None);
        }
        drop(db);

        self.api.set_token(Some(session.auth_token.clone()));
        info!(user = %session.user.id, "Session restored");
        Ok(Some(session))
    }

    pub fn logout(&self) -> Result<()> {
        let removed = lock(&self.db).clear_session()?;
        self.api.set_token(None);
        info!(removed, "Signed out");
        Ok(())
    }
}
