//! In-memory fakes of every port, shared by the unit tests of this crate.

use crate::domain::{
    Comment, ExerciseRequest, ExerciseSet, GrammarCheck, Id, Lesson, LessonLevel, LessonPage,
    LessonType, LoginResponse, Role, Summary, User, VocabularyList, VocabularyWord,
};
use crate::forms::{CommentForm, CommentPatch, LessonForm, LessonPatch, LoginForm, RegisterForm};
use crate::ports::{
    AiApi, AuthApi, CommentApi, CredentialPolicy, CredentialStore, LessonApi, Notification,
    Notifier, PortError, PortResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn user(id: &str, role: Role) -> User {
    User {
        id: Id::from(id),
        username: format!("user-{id}"),
        email: format!("{id}@example.com"),
        avatar: None,
        role,
        created_at: day(0),
    }
}

pub fn lesson(id: &str, title: &str, likes: u64, created_day: i64) -> Lesson {
    Lesson {
        id: Id::from(id),
        title: title.to_string(),
        description: String::new(),
        content: String::new(),
        lesson_type: LessonType::Grammar,
        level: LessonLevel::Beginner,
        author: user("teacher", Role::Teacher),
        likes,
        bookmarks: 0,
        comments: Vec::new(),
        tags: Vec::new(),
        created_at: day(created_day),
        updated_at: day(created_day),
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub token: Mutex<Option<String>>,
    pub policy: Mutex<Option<CredentialPolicy>>,
}

impl MemoryStore {
    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_string())), policy: Mutex::new(None) }
    }

    /// Simulates the cookie vanishing behind the application's back.
    pub fn expire(&self) {
        self.token.lock().unwrap().take();
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn persist(&self, token: &str, policy: &CredentialPolicy) {
        *self.token.lock().unwrap() = Some(token.to_string());
        *self.policy.lock().unwrap() = Some(policy.clone());
    }

    fn remove(&self) -> bool {
        self.token.lock().unwrap().take().is_some()
    }
}

impl CredentialStore for Arc<MemoryStore> {
    fn load(&self) -> Option<String> {
        self.as_ref().load()
    }

    fn persist(&self, token: &str, policy: &CredentialPolicy) {
        self.as_ref().persist(token, policy)
    }

    fn remove(&self) -> bool {
        self.as_ref().remove()
    }
}

/// A backend that keeps everything in memory and records every call by path.
#[derive(Default)]
pub struct FakeBackend {
    pub lessons: Mutex<Vec<Lesson>>,
    pub comments: Mutex<Vec<Comment>>,
    pub accounts: Mutex<Vec<(String, String, User)>>,
    pub signed_in: Mutex<Option<User>>,
    pub calls: Mutex<Vec<String>>,
    pub failing: Mutex<bool>,
}

impl FakeBackend {
    pub fn with_account(email: &str, password: &str, role: Role) -> Self {
        let backend = Self::default();
        let mut account = user("u1", role);
        account.email = email.to_string();
        backend
            .accounts
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string(), account));
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_from_now_on(&self) {
        *self.failing.lock().unwrap() = true;
    }

    fn record(&self, call: impl Into<String>) -> PortResult<()> {
        self.calls.lock().unwrap().push(call.into());
        if *self.failing.lock().unwrap() {
            return Err(PortError::Unexpected("backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn register(&self, form: &RegisterForm) -> PortResult<User> {
        self.record("POST /auth/register")?;
        let mut account = user(&form.username, form.role.unwrap_or(Role::Student));
        account.email = form.email.clone();
        self.accounts
            .lock()
            .unwrap()
            .push((form.email.clone(), form.password.clone(), account.clone()));
        Ok(account)
    }

    async fn login(&self, credentials: &LoginForm) -> PortResult<LoginResponse> {
        self.record("POST /auth/login")?;
        let accounts = self.accounts.lock().unwrap();
        let (_, _, account) = accounts
            .iter()
            .find(|(email, password, _)| {
                *email == credentials.email && *password == credentials.password
            })
            .ok_or(PortError::Unauthorized)?;
        *self.signed_in.lock().unwrap() = Some(account.clone());
        Ok(LoginResponse { access_token: format!("token-{}", account.id), user: None })
    }

    async fn profile(&self) -> PortResult<User> {
        self.record("GET /auth/profile")?;
        self.signed_in.lock().unwrap().clone().ok_or(PortError::Unauthorized)
    }

    async fn logout(&self) -> PortResult<()> {
        self.record("POST /auth/logout")
    }
}

#[async_trait]
impl LessonApi for FakeBackend {
    async fn list(&self, page: u32, limit: u32) -> PortResult<LessonPage> {
        self.record(format!("GET /lessons?page={page}&limit={limit}"))?;
        let lessons = self.lessons.lock().unwrap().clone();
        Ok(LessonPage {
            total: Some(lessons.len() as u64),
            lessons,
            page: Some(page),
            limit: Some(limit),
            total_pages: None,
        })
    }

    async fn get(&self, id: &Id) -> PortResult<Lesson> {
        self.record(format!("GET /lessons/{id}"))?;
        self.lessons
            .lock()
            .unwrap()
            .iter()
            .find(|lesson| &lesson.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("lesson {id}")))
    }

    async fn create(&self, form: &LessonForm) -> PortResult<Lesson> {
        self.record("POST /lessons")?;
        let mut lessons = self.lessons.lock().unwrap();
        let mut created = lesson(&format!("n{}", lessons.len() + 1), &form.title, 0, 10);
        created.description = form.description.clone();
        created.content = form.content.clone();
        created.tags = form.tags.clone();
        lessons.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &Id, patch: &LessonPatch) -> PortResult<Lesson> {
        self.record(format!("PATCH /lessons/{id}"))?;
        let mut lessons = self.lessons.lock().unwrap();
        let lesson = lessons
            .iter_mut()
            .find(|lesson| &lesson.id == id)
            .ok_or_else(|| PortError::NotFound(format!("lesson {id}")))?;
        if let Some(title) = &patch.title {
            lesson.title = title.clone();
        }
        Ok(lesson.clone())
    }

    async fn delete(&self, id: &Id) -> PortResult<()> {
        self.record(format!("DELETE /lessons/{id}"))?;
        self.lessons.lock().unwrap().retain(|lesson| &lesson.id != id);
        Ok(())
    }

    async fn like(&self, id: &Id) -> PortResult<()> {
        self.record(format!("POST /lessons/{id}/like"))?;
        if let Some(lesson) = self.lessons.lock().unwrap().iter_mut().find(|l| &l.id == id) {
            lesson.likes += 1;
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> PortResult<Vec<Lesson>> {
        self.record(format!("GET /lessons/search?q={query}"))?;
        let needle = query.to_lowercase();
        Ok(self
            .lessons
            .lock()
            .unwrap()
            .iter()
            .filter(|lesson| lesson.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn my_lessons(&self) -> PortResult<Vec<Lesson>> {
        self.record("GET /lessons/my-lessons")?;
        Ok(self.lessons.lock().unwrap().clone())
    }
}

#[async_trait]
impl CommentApi for FakeBackend {
    async fn list_for_lesson(&self, lesson_id: &Id) -> PortResult<Vec<Comment>> {
        self.record(format!("GET /comments/lesson/{lesson_id}"))?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| &comment.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn create(&self, lesson_id: &Id, form: &CommentForm) -> PortResult<Comment> {
        self.record(format!("POST /comments/lesson/{lesson_id}"))?;
        let mut comments = self.comments.lock().unwrap();
        let comment = Comment {
            id: Id::new(format!("c{}", comments.len() + 1)),
            content: form.content.clone(),
            author: user("u1", Role::Student),
            lesson_id: lesson_id.clone(),
            created_at: day(5),
            likes: 0,
        };
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, id: &Id, patch: &CommentPatch) -> PortResult<Comment> {
        self.record(format!("PATCH /comments/{id}"))?;
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| PortError::NotFound(format!("comment {id}")))?;
        if let Some(content) = &patch.content {
            comment.content = content.clone();
        }
        Ok(comment.clone())
    }

    async fn delete(&self, id: &Id) -> PortResult<()> {
        self.record(format!("DELETE /comments/{id}"))?;
        self.comments.lock().unwrap().retain(|comment| &comment.id != id);
        Ok(())
    }

    async fn like(&self, id: &Id) -> PortResult<()> {
        self.record(format!("POST /comments/{id}/like"))
    }
}

#[async_trait]
impl AiApi for FakeBackend {
    async fn check_grammar(&self, text: &str) -> PortResult<GrammarCheck> {
        self.record("POST /ai/grammar-check")?;
        Ok(GrammarCheck {
            original_text: text.to_string(),
            corrected_text: Some(text.replace("goed", "went")),
            corrections: Vec::new(),
            suggestions: vec!["Use the irregular past form.".into()],
        })
    }

    async fn generate_exercise(&self, request: &ExerciseRequest) -> PortResult<ExerciseSet> {
        self.record("POST /ai/generate-exercise")?;
        Ok(ExerciseSet {
            level: Some(request.level),
            source_content: request.content.clone(),
            ..Default::default()
        })
    }

    async fn generate_vocabulary(&self) -> PortResult<VocabularyList> {
        self.record("POST /ai/generate-vocabulary")?;
        Ok(VocabularyList {
            words: vec![VocabularyWord {
                word: "went".into(),
                definition: "past of go".into(),
                example: "I went home.".into(),
                level: Some(LessonLevel::Beginner),
            }],
            source_text: String::new(),
        })
    }

    async fn generate_summary(&self) -> PortResult<Summary> {
        self.record("POST /ai/generate-summary")?;
        Ok(Summary { summary: "A short lesson.".into(), ..Default::default() })
    }
}
