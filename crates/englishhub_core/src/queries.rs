//! crates/englishhub_core/src/queries.rs
//!
//! Cache-aware wrappers around the lesson and comment ports.
//!
//! Reads are served from the `QueryCache`. Mutations, on success, invalidate
//! every key whose data they could have changed and then emit a notification;
//! on failure they emit an error notification and leave the cache alone.

use crate::cache::{Invalidate, QueryCache, QueryKey, Scope};
use crate::domain::{Comment, Id, Lesson, LessonPage};
use crate::forms::{CommentForm, CommentPatch, FieldErrors, LessonForm, LessonPatch};
use crate::ports::{CommentApi, LessonApi, Notification, Notifier, PortError, PortResult};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 12;

//=========================================================================================
// Mutation status
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error(String),
}

/// Observable status of the most recent run of a mutation.
pub struct MutationState {
    status: watch::Sender<MutationStatus>,
}

impl Default for MutationState {
    fn default() -> Self {
        let (status, _) = watch::channel(MutationStatus::Idle);
        Self { status }
    }
}

impl MutationState {
    pub fn status(&self) -> MutationStatus {
        self.status.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.status.borrow(), MutationStatus::Pending)
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationStatus> {
        self.status.subscribe()
    }

    pub fn begin(&self) {
        self.status.send_replace(MutationStatus::Pending);
    }

    pub fn finish<T>(&self, result: &PortResult<T>) {
        let next = match result {
            Ok(_) => MutationStatus::Success,
            Err(e) => MutationStatus::Error(e.to_string()),
        };
        self.status.send_replace(next);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("the form has invalid fields")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Failed(#[from] PortError),
}

/// Shared success/failure handling for every mutation.
struct Settle<'a> {
    cache: &'a QueryCache,
    notifier: &'a dyn Notifier,
    state: &'a MutationState,
}

impl Settle<'_> {
    async fn run<T>(
        &self,
        result: PortResult<T>,
        invalidations: &[Invalidate],
        success: &str,
        failure: &str,
    ) -> PortResult<T> {
        self.state.finish(&result);
        match &result {
            Ok(_) => {
                for target in invalidations {
                    self.cache.invalidate(target.clone()).await;
                }
                self.notifier.notify(Notification::success(success));
            }
            Err(e) => {
                error!("{}: {}", failure, e);
                self.notifier.notify(Notification::error(failure));
            }
        }
        result
    }
}

//=========================================================================================
// Lessons
//=========================================================================================

pub struct LessonQueries {
    api: Arc<dyn LessonApi>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    scope: Scope,
    state: MutationState,
}

impl LessonQueries {
    pub fn new(
        api: Arc<dyn LessonApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        scope: Scope,
    ) -> Self {
        Self { api, cache, notifier, scope, state: MutationState::default() }
    }

    pub fn mutation(&self) -> &MutationState {
        &self.state
    }

    fn settle(&self) -> Settle<'_> {
        Settle { cache: &self.cache, notifier: self.notifier.as_ref(), state: &self.state }
    }

    pub async fn page(&self, page: u32, limit: u32) -> PortResult<LessonPage> {
        let api = self.api.clone();
        self.cache
            .fetch(QueryKey::Lessons { page, limit }, || async move { api.list(page, limit).await })
            .await
    }

    pub async fn lesson(&self, id: &Id) -> PortResult<Lesson> {
        let api = self.api.clone();
        let owned = id.clone();
        self.cache
            .fetch(QueryKey::Lesson(id.clone()), || async move { api.get(&owned).await })
            .await
    }

    /// Blank queries resolve to nothing without a request.
    pub async fn search(&self, query: &str) -> PortResult<Vec<Lesson>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let api = self.api.clone();
        let owned = query.to_string();
        self.cache
            .fetch(QueryKey::LessonSearch(query.to_string()), || async move {
                api.search(&owned).await
            })
            .await
    }

    pub async fn mine(&self) -> PortResult<Vec<Lesson>> {
        let api = self.api.clone();
        self.cache
            .fetch(QueryKey::MyLessons(self.scope), || async move { api.my_lessons().await })
            .await
    }

    pub async fn create(&self, form: &LessonForm) -> Result<Lesson, MutationError> {
        form.validate().map_err(MutationError::Invalid)?;
        self.state.begin();
        let result = self.api.create(form).await;
        let lesson = self
            .settle()
            .run(
                result,
                &[Invalidate::LessonLists, Invalidate::MyLessons],
                "Lesson created successfully!",
                "Failed to create lesson!",
            )
            .await?;
        Ok(lesson)
    }

    pub async fn update(&self, id: &Id, patch: &LessonPatch) -> PortResult<Lesson> {
        self.state.begin();
        let result = self.api.update(id, patch).await;
        self.settle()
            .run(
                result,
                &[Invalidate::LessonLists, Invalidate::Lesson(id.clone()), Invalidate::MyLessons],
                "Lesson updated successfully!",
                "Failed to update lesson!",
            )
            .await
    }

    pub async fn delete(&self, id: &Id) -> PortResult<()> {
        self.state.begin();
        let result = self.api.delete(id).await;
        self.settle()
            .run(
                result,
                &[Invalidate::LessonLists, Invalidate::Lesson(id.clone()), Invalidate::MyLessons],
                "Lesson deleted successfully!",
                "Failed to delete lesson!",
            )
            .await
    }

    pub async fn like(&self, id: &Id) -> PortResult<()> {
        self.state.begin();
        let result = self.api.like(id).await;
        self.settle()
            .run(
                result,
                &[Invalidate::LessonLists, Invalidate::Lesson(id.clone())],
                "Lesson liked!",
                "Failed to like lesson!",
            )
            .await
    }
}

//=========================================================================================
// Comments
//=========================================================================================

/// Comment reads and writes for one lesson.
pub struct CommentQueries {
    api: Arc<dyn CommentApi>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    lesson_id: Id,
    state: MutationState,
}

impl CommentQueries {
    pub fn new(
        api: Arc<dyn CommentApi>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        lesson_id: Id,
    ) -> Self {
        Self { api, cache, notifier, lesson_id, state: MutationState::default() }
    }

    pub fn mutation(&self) -> &MutationState {
        &self.state
    }

    fn settle(&self) -> Settle<'_> {
        Settle { cache: &self.cache, notifier: self.notifier.as_ref(), state: &self.state }
    }

    fn invalidations(&self) -> [Invalidate; 1] {
        [Invalidate::Comments(self.lesson_id.clone())]
    }

    pub async fn list(&self) -> PortResult<Vec<Comment>> {
        let api = self.api.clone();
        let lesson_id = self.lesson_id.clone();
        self.cache
            .fetch(QueryKey::Comments(self.lesson_id.clone()), || async move {
                api.list_for_lesson(&lesson_id).await
            })
            .await
    }

    pub async fn create(&self, form: &CommentForm) -> PortResult<Comment> {
        self.state.begin();
        let result = self.api.create(&self.lesson_id, form).await;
        self.settle()
            .run(
                result,
                &self.invalidations(),
                "Comment posted successfully!",
                "Failed to post comment!",
            )
            .await
    }

    pub async fn update(&self, id: &Id, patch: &CommentPatch) -> PortResult<Comment> {
        self.state.begin();
        let result = self.api.update(id, patch).await;
        self.settle()
            .run(
                result,
                &self.invalidations(),
                "Comment updated successfully!",
                "Failed to update comment!",
            )
            .await
    }

    pub async fn delete(&self, id: &Id) -> PortResult<()> {
        self.state.begin();
        let result = self.api.delete(id).await;
        self.settle()
            .run(
                result,
                &self.invalidations(),
                "Comment deleted successfully!",
                "Failed to delete comment!",
            )
            .await
    }

    pub async fn like(&self, id: &Id) -> PortResult<()> {
        self.state.begin();
        let result = self.api.like(id).await;
        self.settle()
            .run(result, &self.invalidations(), "Comment liked!", "Failed to like comment!")
            .await
    }
}
