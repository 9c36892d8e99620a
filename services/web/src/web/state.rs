//! services/web/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::error::WebError;
use englishhub_core::ai::AiPanel;
use englishhub_core::cache::{QueryCache, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A panel untouched for this long is forgotten.
pub const PANEL_IDLE: Duration = Duration::from_secs(30 * 60);
/// Most panels kept at once; the least recently used goes first.
pub const PANEL_CAPACITY: usize = 1024;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    /// One connection pool for every outbound backend call.
    pub http: reqwest::Client,
    pub cache: Arc<QueryCache>,
    /// AI panels keyed by credential, so one user's actions never overlap.
    panels: Mutex<Panels>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Result<Self, WebError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let cache = QueryCache::with_limits(config.cache_ttl, config.cache_capacity);
        Ok(Self {
            config,
            http,
            cache: Arc::new(cache),
            panels: Mutex::new(Panels::new(PANEL_IDLE, PANEL_CAPACITY)),
        })
    }

    pub async fn panel(&self, scope: Scope) -> Arc<AiPanel> {
        self.panels.lock().await.get(scope, Instant::now())
    }

    /// Forgets the panel of a credential that was signed out.
    pub async fn drop_panel(&self, scope: Scope) {
        self.panels.lock().await.remove(&scope);
    }
}

//=========================================================================================
// Panels
//=========================================================================================

/// Per-credential AI panels with idle expiry and a size cap.
struct Panels {
    entries: HashMap<Scope, (Arc<AiPanel>, Instant)>,
    idle: Duration,
    capacity: usize,
}

impl Panels {
    fn new(idle: Duration, capacity: usize) -> Self {
        Self { entries: HashMap::new(), idle, capacity: capacity.max(1) }
    }

    fn get(&mut self, scope: Scope, now: Instant) -> Arc<AiPanel> {
        self.prune(now);
        if !self.entries.contains_key(&scope) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(scope, _)| *scope);
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        let entry = self.entries.entry(scope).or_insert_with(|| (Arc::default(), now));
        entry.1 = now;
        entry.0.clone()
    }

    fn prune(&mut self, now: Instant) {
        let idle = self.idle;
        self.entries
            .retain(|_, (_, used)| now.saturating_duration_since(*used) < idle);
    }

    fn remove(&mut self, scope: &Scope) {
        self.entries.remove(scope);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
