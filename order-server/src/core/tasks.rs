//! Background tasks

use crate::core::ServerState;
use std::time::Duration;

/// Spawn the periodic revocation purge
///
/// Deletes markers for tokens that have expired anyway, keeping the
/// revocation table bounded by the number of logouts within one token
/// lifetime.
pub fn spawn_revocation_purge(state: &ServerState) {
    let store = state.revocation_store.clone();
    let interval = Duration::from_secs(state.config.revocation_purge_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "Revocation purge completed");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Revocation purge failed"),
            }
        }
    });
}
