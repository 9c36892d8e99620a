//! services/web/src/adapters/cookies.rs
//!
//! Browser cookies as the credential store.
//!
//! The token is read from the request's `Cookie` header. Writes and removals
//! are recorded as `Set-Cookie` values that the session middleware attaches
//! to the response.

use axum::http::{header, HeaderMap};
use englishhub_core::ports::{CredentialPolicy, CredentialStore, ACCESS_TOKEN_COOKIE};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Finds the value of cookie `name` in a `Cookie` header value.
pub fn find_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|c| {
        let (key, value) = c.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Looks `name` up across every `Cookie` header of a request.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| find_cookie(v, name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn credential_cookie(token: &str, policy: &CredentialPolicy) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        policy.name,
        token,
        chrono::Duration::days(policy.max_age_days).num_seconds()
    );
    if policy.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str(if policy.same_site_strict { "; SameSite=Strict" } else { "; SameSite=Lax" });
    cookie
}

pub fn expired_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0", name)
}

#[derive(Default)]
struct Jar {
    token: Option<String>,
    changes: Vec<String>,
}

/// The access-token cookie of one request/response pair.
#[derive(Clone, Default)]
pub struct CookieStore {
    jar: Arc<Mutex<Jar>>,
}

impl CookieStore {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = request_cookie(headers, ACCESS_TOKEN_COOKIE);
        Self { jar: Arc::new(Mutex::new(Jar { token, changes: Vec::new() })) }
    }

    /// Drains the `Set-Cookie` values produced so far.
    pub fn take_changes(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().changes)
    }

    fn lock(&self) -> MutexGuard<'_, Jar> {
        self.jar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for CookieStore {
    fn load(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn persist(&self, token: &str, policy: &CredentialPolicy) {
        let mut jar = self.lock();
        jar.token = Some(token.to_string());
        jar.changes.push(credential_cookie(token, policy));
    }

    fn remove(&self) -> bool {
        let mut jar = self.lock();
        let present = jar.token.take().is_some();
        if present {
            jar.changes.push(expired_cookie(ACCESS_TOKEN_COOKIE));
        }
        present
    }
}
