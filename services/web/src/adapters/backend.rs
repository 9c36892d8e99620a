//! services/web/src/adapters/backend.rs
//!
//! The REST backend, reached over HTTP with `reqwest`.
//!
//! Every request carries `Authorization: Bearer <token>` when a credential is
//! stored. Every successful response is followed by the configured artificial
//! delay before it is handed back.

use async_trait::async_trait;
use englishhub_core::domain::{
    Comment, ExerciseRequest, ExerciseSet, GrammarCheck, Id, Lesson, LessonPage, LoginResponse,
    Summary, User, VocabularyList,
};
use englishhub_core::forms::{
    CommentForm, CommentPatch, LessonForm, LessonPatch, LoginForm, RegisterForm,
};
use englishhub_core::ports::{AiApi, AuthApi, CommentApi, LessonApi, PortError, PortResult};
use englishhub_core::session::Credentials;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpBackend {
    client: Client,
    base_url: String,
    delay: Duration,
    credentials: Arc<Credentials>,
}

impl HttpBackend {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        delay: Duration,
        credentials: Arc<Credentials>,
    ) -> Self {
        Self { client, base_url: base_url.into(), delay, credentials }
    }

    /// Builds a request for `base_url` followed by `segments`, each encoded as
    /// exactly one path segment.
    fn request(&self, method: Method, segments: &[&str]) -> PortResult<RequestBuilder> {
        let url = endpoint(&self.base_url, segments)?;
        let builder = self.client.request(method, url);
        Ok(match self.credentials.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let request = builder.build().map_err(|e| PortError::Unexpected(e.to_string()))?;
        let target = format!("{} {}", request.method(), request.url().path());
        debug!("backend request: {}", target);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("backend {} answered {}", target, status);
            return Err(map_status(status, &target, &body));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let response = self.send(builder).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed backend response: {}", e)))?;
        unwrap_envelope(body)
            .map_err(|e| PortError::Unexpected(format!("Malformed backend response: {}", e)))
    }

    async fn empty(&self, builder: RequestBuilder) -> PortResult<()> {
        self.send(builder).await.map(|_| ())
    }
}

fn endpoint(base_url: &str, segments: &[&str]) -> PortResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| PortError::Unexpected(format!("Invalid backend URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| PortError::Unexpected(format!("Invalid backend URL {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// An identifier taken from a route, usable as a single path segment.
/// Empty and dot segments cannot name a resource.
fn segment(id: &Id) -> PortResult<&str> {
    match id.as_str() {
        "" | "." | ".." => Err(PortError::NotFound(format!("resource {:?}", id.as_str()))),
        value => Ok(value),
    }
}

/// Bodies arrive either bare or wrapped as `{ "data": ... }`. A body with a
/// `data` key is always treated as wrapped.
fn unwrap_envelope<T: DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            serde_json::from_value(map.remove("data").unwrap_or(Value::Null))
        }
        other => serde_json::from_value(other),
    }
}

/// 401/403 are authorization failures, 404 is a missing resource, anything else is unexpected.
pub fn map_status(status: StatusCode, target: &str, body: &str) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(target.to_string()),
        _ => {
            let detail = backend_message(body).unwrap_or_else(|| status.to_string());
            PortError::Unexpected(format!("{} failed: {}", target, detail))
        }
    }
}

/// Pulls a `message` field out of an error body, if there is one.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

//=========================================================================================
// Port implementations
//=========================================================================================

#[async_trait]
impl AuthApi for HttpBackend {
    async fn register(&self, form: &RegisterForm) -> PortResult<User> {
        self.json(self.request(Method::POST, &["auth", "register"])?.json(form)).await
    }

    async fn login(&self, credentials: &LoginForm) -> PortResult<LoginResponse> {
        self.json(self.request(Method::POST, &["auth", "login"])?.json(credentials)).await
    }

    async fn profile(&self) -> PortResult<User> {
        self.json(self.request(Method::GET, &["auth", "profile"])?).await
    }

    async fn logout(&self) -> PortResult<()> {
        self.empty(self.request(Method::POST, &["auth", "logout"])?).await
    }
}

#[async_trait]
impl LessonApi for HttpBackend {
    async fn list(&self, page: u32, limit: u32) -> PortResult<LessonPage> {
        let builder = self.request(Method::GET, &["lessons"])?.query(&[("page", page), ("limit", limit)]);
        self.json(builder).await
    }

    async fn get(&self, id: &Id) -> PortResult<Lesson> {
        self.json(self.request(Method::GET, &["lessons", segment(id)?])?).await
    }

    async fn create(&self, form: &LessonForm) -> PortResult<Lesson> {
        self.json(self.request(Method::POST, &["lessons"])?.json(form)).await
    }

    async fn update(&self, id: &Id, patch: &LessonPatch) -> PortResult<Lesson> {
        self.json(self.request(Method::PATCH, &["lessons", segment(id)?])?.json(patch))
            .await
    }

    async fn delete(&self, id: &Id) -> PortResult<()> {
        self.empty(self.request(Method::DELETE, &["lessons", segment(id)?])?).await
    }

    async fn like(&self, id: &Id) -> PortResult<()> {
        self.empty(self.request(Method::POST, &["lessons", segment(id)?, "like"])?).await
    }

    async fn search(&self, query: &str) -> PortResult<Vec<Lesson>> {
        let builder = self.request(Method::GET, &["lessons", "search"])?.query(&[("q", query)]);
        self.json(builder).await
    }

    async fn my_lessons(&self) -> PortResult<Vec<Lesson>> {
        self.json(self.request(Method::GET, &["lessons", "my-lessons"])?).await
    }
}

#[async_trait]
impl CommentApi for HttpBackend {
    async fn list_for_lesson(&self, lesson_id: &Id) -> PortResult<Vec<Comment>> {
        self.json(self.request(Method::GET, &["comments", "lesson", segment(lesson_id)?])?)
            .await
    }

    async fn create(&self, lesson_id: &Id, form: &CommentForm) -> PortResult<Comment> {
        let builder = self.request(Method::POST, &["comments", "lesson", segment(lesson_id)?])?;
        self.json(builder.json(form)).await
    }

    async fn update(&self, id: &Id, patch: &CommentPatch) -> PortResult<Comment> {
        self.json(self.request(Method::PATCH, &["comments", segment(id)?])?.json(patch))
            .await
    }

    async fn delete(&self, id: &Id) -> PortResult<()> {
        self.empty(self.request(Method::DELETE, &["comments", segment(id)?])?).await
    }

    async fn like(&self, id: &Id) -> PortResult<()> {
        self.empty(self.request(Method::POST, &["comments", segment(id)?, "like"])?).await
    }
}

#[async_trait]
impl AiApi for HttpBackend {
    async fn check_grammar(&self, text: &str) -> PortResult<GrammarCheck> {
        let body = serde_json::json!({ "text": text });
        self.json(self.request(Method::POST, &["ai", "grammar-check"])?.json(&body)).await
    }

    async fn generate_exercise(&self, request: &ExerciseRequest) -> PortResult<ExerciseSet> {
        self.json(self.request(Method::POST, &["ai", "generate-exercise"])?.json(request))
            .await
    }

    async fn generate_vocabulary(&self) -> PortResult<VocabularyList> {
        self.json(self.request(Method::POST, &["ai", "generate-vocabulary"])?).await
    }

    async fn generate_summary(&self) -> PortResult<Summary> {
        self.json(self.request(Method::POST, &["ai", "generate-summary"])?).await
    }
}
