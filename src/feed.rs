//! Client-side feed cache that polls the HTTP API.
//!
//! The cache holds the most recent full list fetched from the access layer
//! plus this consumer's local read flags. All views derive from the cached
//! snapshot without further network calls until the next refresh.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::Result;
use tokio::{sync::watch, task::JoinHandle, time};
use tracing::{debug, warn};

use crate::{model::Circular, views};

#[derive(Debug, Default)]
struct FeedState {
    circulars: Vec<Circular>,
    // read-state is client-local; the server's readBy log is a separate,
    // institution-wide record
    read_ids: HashSet<String>,
}

/// Shared cache of the last fetched circular list.
#[derive(Clone)]
pub struct Feed {
    state: Arc<Mutex<FeedState>>,
    api_url: String,
    client: reqwest::Client,
}

impl Feed {
    /// Create an empty cache polling `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::default())),
            api_url: api_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the full list once and replace the snapshot.
    ///
    /// On failure the previous snapshot is left untouched so consumers keep
    /// a stale-but-available view.
    pub async fn refresh(&self) -> Result<usize> {
        let url = format!("{}/circulars", self.api_url.trim_end_matches('/'));
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let circulars: Vec<Circular> = resp.json().await?;
        let mut state = self.state();
        state.circulars = circulars;
        Ok(state.circulars.len())
    }

    /// Clone of the cached list, in server order (newest first).
    pub fn snapshot(&self) -> Vec<Circular> {
        self.state().circulars.clone()
    }

    /// Flag a circular as read for this consumer only.
    pub fn mark_read(&self, id: &str) {
        self.state().read_ids.insert(id.to_string());
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.state().read_ids.contains(id)
    }

    /// Ids this consumer has flagged as read.
    pub fn read_ids(&self) -> HashSet<String> {
        self.state().read_ids.clone()
    }

    /// Cached circulars this consumer has not read yet.
    pub fn unread_count(&self) -> usize {
        let state = self.state();
        views::unread_count(&state.circulars, &state.read_ids)
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle used to stop the polling task deterministically.
pub struct FeedHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Signal the poller to exit and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the polling loop: fetch immediately, then refresh on a fixed
/// interval until stopped.
pub fn spawn(feed: Feed, interval: Duration) -> FeedHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match feed.refresh().await {
                        Ok(n) => debug!("feed refresh: {n} circulars"),
                        Err(e) => warn!("feed refresh failed, keeping cached list: {e:#}"),
                    }
                }
                _ = stop_rx.changed() => break,
            }
        }
    });
    FeedHandle { stop_tx, task }
}
