pub mod badges;
pub mod config;
pub mod error;
pub mod ledger;
pub mod reconciler;
pub mod session;
pub mod source;
pub mod state;
pub mod typing;
pub mod unread;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use vitrine_shared::constants::APP_NAME;

use crate::config::ClientConfig;
use crate::reconciler::RECONCILER_EVENTS;
use crate::state::{AppState, Realtime};

pub use badges::{BadgeSnapshot, BadgeStore};
pub use error::ClientError;
pub use reconciler::{CommandOutcome, Reconciler};
pub use source::UnreadSource;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("vitrine_client=debug,vitrine_net=debug,vitrine_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Sign in, connect the realtime socket and log badge totals until Ctrl-C.
pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    info!("Starting {APP_NAME} badge watcher");

    let state = AppState::open(config).context("failed to open local state")?;
    let session = state
        .sign_in()
        .await
        .context("sign-in failed (set VITRINE_EMAIL and VITRINE_PASSWORD when no session is stored)")?;
    info!(user = %session.user.name, user_type = %session.user_type, "Session ready");

    // Subscribe before the socket starts so the first `Connected` is seen.
    let subscription = state.bridge.subscribe(RECONCILER_EVENTS);
    let Realtime { socket, reconciler } = state.start_realtime(&session)?;
    let mut badges = reconciler.badges().subscribe();

    reconciler.refresh_all().await;
    let driver = tokio::spawn(reconciler.run(subscription));

    loop {
        let snapshot = *badges.borrow_and_update();
        info!(
            messages = snapshot.messages,
            notifications = snapshot.notifications,
            orders = snapshot.orders,
            "Badges"
        );

        tokio::select! {
            changed = badges.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    if let Err(e) = socket.shutdown().await {
        debug!(error = %e, "Socket task already stopped");
    }
    driver.abort();
    Ok(())
}
