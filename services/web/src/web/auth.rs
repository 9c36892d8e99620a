//! services/web/src/web/auth.rs
//!
//! Login, registration, logout and the profile page.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use englishhub_core::domain::Role;
use englishhub_core::forms::{FieldErrors, LoginForm, RegisterForm};
use englishhub_core::session::SessionError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::web::middleware::RequestContext;
use crate::web::state::AppState;
use crate::web::views;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

impl From<RegisterInput> for RegisterForm {
    fn from(input: RegisterInput) -> Self {
        RegisterForm {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_string(),
            password: input.password,
            confirm_password: input.confirm_password,
            role: input.role.parse::<Role>().ok(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    if ctx.credentials.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    let body = views::login_form(&LoginForm::default(), &FieldErrors::default());
    ctx.render(&state, "Log in", body).await.into_response()
}

/// POST /login - validates locally, then exchanges the credentials for a token cookie.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<LoginForm>,
) -> Response {
    let errors = match ctx.session(&state).login(&form).await {
        Ok(route) => return Redirect::to(&route.path()).into_response(),
        Err(SessionError::Invalid(errors)) => errors,
        Err(SessionError::Rejected(_)) => FieldErrors::default(),
    };
    let body = views::login_form(&form, &errors);
    ctx.render(&state, "Log in", body).await.into_response()
}

/// GET /register
pub async fn register_page(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    if ctx.credentials.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    let body = views::register_form(&RegisterForm::default(), &FieldErrors::default());
    ctx.render(&state, "Register", body).await.into_response()
}

/// POST /register
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(input): Form<RegisterInput>,
) -> Response {
    let form = RegisterForm::from(input);
    let errors = match ctx.session(&state).register(&form).await {
        Ok(route) => return Redirect::to(&route.path()).into_response(),
        Err(SessionError::Invalid(errors)) => errors,
        Err(SessionError::Rejected(_)) => FieldErrors::default(),
    };
    let body = views::register_form(&form, &errors);
    ctx.render(&state, "Register", body).await.into_response()
}

/// POST /logout - forgets the credential locally; the backend is not told.
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Redirect {
    let scope = ctx.credentials.scope();
    let route = ctx.session(&state).logout().await;
    state.drop_panel(scope).await;
    Redirect::to(&route.path())
}

/// GET /profile
pub async fn profile_page(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let user = ctx.user(&state).await;
    let mine = match &user {
        Some(_) => ctx.lessons(&state).mine().await.unwrap_or_else(|e| {
            warn!("Could not load the user's lessons: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    let body = views::profile(user.as_ref(), &mine);
    ctx.render(&state, "Profile", body).await.into_response()
}
