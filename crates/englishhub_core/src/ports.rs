//! crates/englishhub_core/src/ports.rs
//!
//! Defines the service contracts (traits) between the front-end core and the
//! outside world: the REST backend, the place the bearer credential lives, and
//! the surface that shows transient notifications to the user.

use crate::domain::{
    Comment, ExerciseRequest, ExerciseSet, GrammarCheck, Id, Lesson, LessonPage, LoginResponse,
    Summary, User, VocabularyList,
};
use crate::forms::{CommentForm, CommentPatch, LessonForm, LessonPatch, LoginForm, RegisterForm};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the transport (HTTP status, decoding, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Backend Ports (one per REST resource)
//=========================================================================================

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, form: &RegisterForm) -> PortResult<User>;

    async fn login(&self, credentials: &LoginForm) -> PortResult<LoginResponse>;

    async fn profile(&self) -> PortResult<User>;

    async fn logout(&self) -> PortResult<()>;
}

#[async_trait]
pub trait LessonApi: Send + Sync {
    async fn list(&self, page: u32, limit: u32) -> PortResult<LessonPage>;

    async fn get(&self, id: &Id) -> PortResult<Lesson>;

    async fn create(&self, form: &LessonForm) -> PortResult<Lesson>;

    async fn update(&self, id: &Id, patch: &LessonPatch) -> PortResult<Lesson>;

    async fn delete(&self, id: &Id) -> PortResult<()>;

    async fn like(&self, id: &Id) -> PortResult<()>;

    async fn search(&self, query: &str) -> PortResult<Vec<Lesson>>;

    async fn my_lessons(&self) -> PortResult<Vec<Lesson>>;
}

#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list_for_lesson(&self, lesson_id: &Id) -> PortResult<Vec<Comment>>;

    async fn create(&self, lesson_id: &Id, form: &CommentForm) -> PortResult<Comment>;

    async fn update(&self, id: &Id, patch: &CommentPatch) -> PortResult<Comment>;

    async fn delete(&self, id: &Id) -> PortResult<()>;

    async fn like(&self, id: &Id) -> PortResult<()>;
}

#[async_trait]
pub trait AiApi: Send + Sync {
    async fn check_grammar(&self, text: &str) -> PortResult<GrammarCheck>;

    async fn generate_exercise(&self, request: &ExerciseRequest) -> PortResult<ExerciseSet>;

    async fn generate_vocabulary(&self) -> PortResult<VocabularyList>;

    async fn generate_summary(&self) -> PortResult<Summary>;
}

//=========================================================================================
// Credential Store
//=========================================================================================

/// How the bearer credential is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub name: &'static str,
    pub max_age_days: i64,
    pub secure: bool,
    pub same_site_strict: bool,
}

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            name: ACCESS_TOKEN_COOKIE,
            max_age_days: 60,
            secure: true,
            same_site_strict: true,
        }
    }
}

/// Where the opaque bearer token lives between requests.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;

    fn persist(&self, token: &str, policy: &CredentialPolicy);

    /// Removes the credential, returning whether one was present.
    fn remove(&self) -> bool;
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message shown to the user after a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
