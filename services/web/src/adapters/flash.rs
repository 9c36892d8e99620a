//! services/web/src/adapters/flash.rs
//!
//! Notifications that survive one redirect.
//!
//! Messages raised while handling a request are either rendered into the
//! page that request returns, or, when the response is a redirect, carried to
//! the next page in a short-lived `flash` cookie holding base64-encoded JSON.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use englishhub_core::ports::{Notification, Notifier};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

pub const FLASH_COOKIE: &str = "flash";

pub fn encode(notifications: &[Notification]) -> Option<String> {
    let json = serde_json::to_vec(notifications)
        .map_err(|e| warn!("Could not encode flash messages: {}", e))
        .ok()?;
    Some(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a flash cookie. Tampered or truncated values decode to nothing.
pub fn decode(value: &str) -> Vec<Notification> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn flash_cookie(value: &str) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60", FLASH_COOKIE, value)
}

/// Collects the notifications of one request, seeded with any carried over from the last one.
#[derive(Default)]
pub struct FlashNotifier {
    pending: Mutex<Vec<Notification>>,
}

impl FlashNotifier {
    pub fn new(carried: Vec<Notification>) -> Self {
        Self { pending: Mutex::new(carried) }
    }

    /// Takes every pending message, for display in the page being rendered.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for FlashNotifier {
    fn notify(&self, notification: Notification) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
