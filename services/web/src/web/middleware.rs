//! services/web/src/web/middleware.rs
//!
//! Per-request session context and the teacher-only route guard.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use englishhub_core::domain::{Id, Role, User};
use englishhub_core::queries::{CommentQueries, LessonQueries};
use englishhub_core::session::{Credentials, Session};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::cookies::{expired_cookie, request_cookie};
use crate::adapters::flash::{self, FlashNotifier, FLASH_COOKIE};
use crate::adapters::{CookieStore, HttpBackend};
use crate::web::state::AppState;
use crate::web::views::{self, Page};

//=========================================================================================
// RequestContext
//=========================================================================================

/// Everything a handler needs to act on behalf of the browser that sent the request.
#[derive(Clone)]
pub struct RequestContext {
    pub credentials: Arc<Credentials>,
    pub backend: Arc<HttpBackend>,
    pub notifier: Arc<FlashNotifier>,
    cookies: CookieStore,
    had_flash: bool,
}

impl RequestContext {
    pub fn new(state: &AppState, headers: &HeaderMap) -> Self {
        let cookies = CookieStore::from_headers(headers);
        let carried = request_cookie(headers, FLASH_COOKIE);
        let had_flash = carried.is_some();
        let carried = carried.map(|value| flash::decode(&value)).unwrap_or_default();

        let credentials = Arc::new(Credentials::new(cookies.clone()));
        let backend = Arc::new(HttpBackend::new(
            state.http.clone(),
            state.config.api_base(),
            state.config.response_delay,
            credentials.clone(),
        ));

        Self {
            credentials,
            backend,
            notifier: Arc::new(FlashNotifier::new(carried)),
            cookies,
            had_flash,
        }
    }

    pub fn session(&self, state: &AppState) -> Session {
        Session::new(
            self.credentials.clone(),
            self.backend.clone(),
            state.cache.clone(),
            self.notifier.clone(),
        )
    }

    pub fn lessons(&self, state: &AppState) -> LessonQueries {
        LessonQueries::new(
            self.backend.clone(),
            state.cache.clone(),
            self.notifier.clone(),
            self.credentials.scope(),
        )
    }

    pub fn comments(&self, state: &AppState, lesson_id: Id) -> CommentQueries {
        CommentQueries::new(
            self.backend.clone(),
            state.cache.clone(),
            self.notifier.clone(),
            lesson_id,
        )
    }

    /// The signed-in user, if any. Failures degrade to "signed out".
    pub async fn user(&self, state: &AppState) -> Option<User> {
        self.session(state).profile().await.unwrap_or_else(|e| {
            warn!("Could not load profile: {}", e);
            None
        })
    }

    /// Renders `body` inside the site layout, consuming every pending notification.
    pub async fn render(&self, state: &AppState, title: &str, body: String) -> Html<String> {
        let user = self.user(state).await;
        Html(views::layout(&Page {
            title: title.to_string(),
            user,
            flash: self.notifier.drain(),
            body,
        }))
    }

    /// Attaches credential changes and undelivered notifications to the response.
    fn finish(&self, response: &mut Response) {
        let mut cookies = self.cookies.take_changes();

        let undelivered = self.notifier.drain();
        if !undelivered.is_empty() {
            if let Some(value) = flash::encode(&undelivered) {
                cookies.push(flash::flash_cookie(&value));
            }
        } else if self.had_flash {
            cookies.push(expired_cookie(FLASH_COOKIE));
        }

        for cookie in cookies {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("Dropping unencodable cookie: {}", e),
            }
        }
    }
}

//=========================================================================================
// Middleware
//=========================================================================================

/// Builds the `RequestContext` for every request and writes its cookies back afterwards.
pub async fn session_context(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::new(&state, req.headers());
    debug!(authenticated = ctx.credentials.is_authenticated(), "request context ready");
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;
    ctx.finish(&mut response);
    response
}

/// Lets only teachers through. Everyone else is sent home with an error notification.
pub async fn require_teacher(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        warn!("require_teacher ran without a request context");
        return Redirect::to("/").into_response();
    };

    if ctx.session(&state).authorize(&[Role::Teacher]).await {
        next.run(req).await
    } else {
        Redirect::to("/").into_response()
    }
}
