//! crates/englishhub_core/src/session.rs
//!
//! Session state: whether a bearer credential is present, and the
//! login/register/logout flows that set and clear it.
//!
//! "Authenticated" is derived directly from the credential store. Every
//! persist/clear publishes the new value on a watch channel, and every read
//! re-checks the store, so observers never see a stale flag.

use crate::cache::{Invalidate, QueryCache, QueryKey, Scope};
use crate::domain::{Id, Role, User};
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::ports::{
    AuthApi, CredentialPolicy, CredentialStore, Notification, Notifier, PortError, PortResult,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

//=========================================================================================
// Navigation targets
//=========================================================================================

/// The views a flow can send the user to once it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Profile,
    Lessons,
    Lesson(Id),
    CreateLesson,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Lessons => "/lessons".to_string(),
            Route::Lesson(id) => format!("/lessons/{id}"),
            Route::CreateLesson => "/create-lesson".to_string(),
        }
    }
}

//=========================================================================================
// Credentials
//=========================================================================================

/// The credential store plus an observable "is authenticated" flag.
pub struct Credentials {
    store: Box<dyn CredentialStore>,
    signal: watch::Sender<bool>,
}

impl Credentials {
    pub fn new(store: impl CredentialStore + 'static) -> Self {
        let present = store.load().is_some();
        let (signal, _) = watch::channel(present);
        Self { store: Box::new(store), signal }
    }

    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.refresh()
    }

    /// Observers are woken whenever credential presence flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    pub fn persist(&self, token: &str, policy: &CredentialPolicy) {
        self.store.persist(token, policy);
        self.refresh();
    }

    /// Removes the credential if present. Returns whether one was removed.
    pub fn clear(&self) -> bool {
        let removed = self.store.remove();
        self.refresh();
        removed
    }

    /// A digest of the current token, used to key per-user cache entries.
    pub fn scope(&self) -> Scope {
        match self.store.load() {
            Some(token) => Scope::of_token(&token),
            None => Scope::Anonymous,
        }
    }

    fn refresh(&self) -> bool {
        let present = self.store.load().is_some();
        self.signal.send_if_modified(|current| {
            if *current == present {
                false
            } else {
                *current = present;
                true
            }
        });
        present
    }
}

//=========================================================================================
// Session flows
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The form failed client-side validation; nothing was sent.
    #[error("the form has invalid fields")]
    Invalid(FieldErrors),
    /// The backend refused the request or could not be reached.
    #[error("request rejected: {0}")]
    Rejected(#[from] PortError),
}

pub struct Session {
    credentials: Arc<Credentials>,
    auth: Arc<dyn AuthApi>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
}

impl Session {
    pub fn new(
        credentials: Arc<Credentials>,
        auth: Arc<dyn AuthApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { credentials, auth, cache, notifier }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.credentials.subscribe()
    }

    /// Signs in and persists the returned token. Navigates home on success.
    pub async fn login(&self, form: &LoginForm) -> Result<Route, SessionError> {
        form.validate().map_err(SessionError::Invalid)?;

        match self.auth.login(form).await {
            Ok(response) => {
                self.credentials
                    .persist(&response.access_token, &CredentialPolicy::default());
                info!("User signed in.");
                self.notifier.notify(Notification::success("Logged in successfully"));
                Ok(Route::Home)
            }
            Err(e) => {
                warn!("Login rejected: {}", e);
                self.notifier.notify(Notification::error("Invalid email or password"));
                Err(e.into())
            }
        }
    }

    /// Creates an account. Navigates to the login view on success.
    pub async fn register(&self, form: &RegisterForm) -> Result<Route, SessionError> {
        form.validate().map_err(SessionError::Invalid)?;

        match self.auth.register(form).await {
            Ok(user) => {
                info!("Registered account {}", user.id);
                self.notifier.notify(Notification::success("Registered successfully"));
                Ok(Route::Login)
            }
            Err(e) => {
                warn!("Registration failed: {}", e);
                self.notifier.notify(Notification::error("Registration failed"));
                Err(e.into())
            }
        }
    }

    /// Drops the local credential. The backend is not told.
    pub async fn logout(&self) -> Route {
        let scope = self.credentials.scope();
        self.credentials.clear();
        self.cache.evict(Invalidate::Scope(scope)).await;
        self.notifier.notify(Notification::success("Logged out successfully"));
        Route::Login
    }

    /// The signed-in user, or `None` when there is no usable credential.
    pub async fn profile(&self) -> PortResult<Option<User>> {
        if !self.credentials.is_authenticated() {
            return Ok(None);
        }
        let auth = self.auth.clone();
        let key = QueryKey::Profile(self.credentials.scope());
        match self.cache.fetch(key, || async move { auth.profile().await }).await {
            Ok(user) => Ok(Some(user)),
            Err(PortError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether the current user holds one of `allowed`. Notifies when not.
    pub async fn authorize(&self, allowed: &[Role]) -> bool {
        let permitted = match self.profile().await {
            Ok(Some(user)) => allowed.contains(&user.role),
            Ok(None) => false,
            Err(e) => {
                warn!("Could not load profile for role check: {}", e);
                false
            }
        };
        if !permitted {
            self.notifier
                .notify(Notification::error("You do not have permission to access this page"));
        }
        permitted
    }
}
