//! Shared helpers for the web integration tests: an in-process REST backend
//! served over a real socket, and a front-end configured to talk to it.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use web_lib::config::Config;
use web_lib::web::{router, state::AppState};

pub const PASSWORD: &str = "secret1";
pub const TEACHER_EMAIL: &str = "teacher@example.com";
pub const STUDENT_EMAIL: &str = "student@example.com";
pub const TEACHER_TOKEN: &str = "token-t1";
pub const STUDENT_TOKEN: &str = "token-s1";

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

//=========================================================================================
// Fake REST backend
//=========================================================================================

#[derive(Default)]
pub struct BackendData {
    pub users: Vec<(String, Value)>,
    pub lessons: Vec<Value>,
    pub comments: Vec<Value>,
    /// `"METHOD /path"` of every request, in arrival order.
    pub calls: Vec<String>,
    /// `Authorization` header of every request, in arrival order.
    pub auth_headers: Vec<Option<String>>,
    pub last_search: Option<String>,
    pub last_exercise_request: Option<Value>,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub data: Arc<Mutex<BackendData>>,
    pub origin: String,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<String> {
        self.data.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.data.lock().unwrap().auth_headers.clone()
    }
}

type Shared = Arc<Mutex<BackendData>>;

fn user_json(id: &str, username: &str, email: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "username": username,
        "email": email,
        "role": role,
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

fn lesson_json(id: u64, title: &str, kind: &str, level: &str, likes: u64, day: u32) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {}", title.to_lowercase()),
        "content": format!("**{}** lesson body", title),
        "type": kind,
        "level": level,
        "author": user_json("t1", "teacher", TEACHER_EMAIL, "teacher"),
        "likes": likes,
        "tags": ["english"],
        "createdAt": format!("2024-01-{:02}T00:00:00Z", day),
        "updatedAt": format!("2024-01-{:02}T00:00:00Z", day)
    })
}

fn seed() -> BackendData {
    BackendData {
        users: vec![
            (TEACHER_TOKEN.to_string(), user_json("t1", "teacher", TEACHER_EMAIL, "teacher")),
            (STUDENT_TOKEN.to_string(), user_json("s1", "student", STUDENT_EMAIL, "student")),
        ],
        lessons: vec![
            lesson_json(1, "Past Tense", "grammar", "beginner", 5, 1),
            lesson_json(2, "Travel Vocabulary", "vocabulary", "intermediate", 2, 2),
            lesson_json(3, "Podcast Listening", "listening", "advanced", 9, 3),
        ],
        comments: vec![json!({
            "id": 50,
            "content": "Where do I start?",
            "author": user_json("s1", "student", STUDENT_EMAIL, "student"),
            "lessonId": 2,
            "createdAt": "2024-01-05T00:00:00Z",
            "likes": 0
        })],
        ..Default::default()
    }
}

fn record(data: &Shared, call: String, headers: &HeaderMap) {
    let mut data = data.lock().unwrap();
    data.calls.push(call);
    data.auth_headers.push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
}

fn caller(data: &Shared, headers: &HeaderMap) -> Option<Value> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .to_string();
    let data = data.lock().unwrap();
    data.users.iter().find(|(t, _)| *t == token).map(|(_, user)| user.clone())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

async fn login(State(data): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&data, "POST /auth/login".into(), &headers);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let known = data
        .lock()
        .unwrap()
        .users
        .iter()
        .find(|(_, user)| user["email"] == email)
        .map(|(token, _)| token.clone());
    match known {
        Some(token) if password == PASSWORD => {
            Json(json!({ "data": { "accessToken": token } })).into_response()
        }
        _ => unauthorized(),
    }
}

async fn register(State(data): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&data, "POST /auth/register".into(), &headers);
    if body.get("confirmPassword").is_some() || body.get("confirm_password").is_some() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "unexpected field" })))
            .into_response();
    }
    let user = user_json(
        "n1",
        body["username"].as_str().unwrap_or_default(),
        body["email"].as_str().unwrap_or_default(),
        body["role"].as_str().unwrap_or("student"),
    );
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn profile(State(data): State<Shared>, headers: HeaderMap) -> Response {
    record(&data, "GET /auth/profile".into(), &headers);
    match caller(&data, &headers) {
        Some(user) => Json(json!({ "data": user })).into_response(),
        None => unauthorized(),
    }
}

async fn logout(State(data): State<Shared>, headers: HeaderMap) -> StatusCode {
    record(&data, "POST /auth/logout".into(), &headers);
    StatusCode::NO_CONTENT
}

async fn list_lessons(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: u64 = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit: u64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(12);
    record(&data, format!("GET /lessons?page={}&limit={}", page, limit), &headers);
    let lessons = data.lock().unwrap().lessons.clone();
    let total = lessons.len() as u64;
    Json(json!({
        "data": {
            "lessons": lessons,
            "total": total,
            "page": page,
            "limit": limit,
            "totalPages": total.div_ceil(limit).max(1)
        }
    }))
}

async fn search_lessons(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    record(&data, "GET /lessons/search".into(), &headers);
    let q = params.get("q").cloned().unwrap_or_default();
    let mut data = data.lock().unwrap();
    data.last_search = Some(q.clone());
    let needle = q.to_lowercase();
    let found: Vec<Value> = data
        .lessons
        .iter()
        .filter(|l| l["title"].as_str().unwrap_or_default().to_lowercase().contains(&needle))
        .cloned()
        .collect();
    Json(Value::Array(found))
}

async fn my_lessons(State(data): State<Shared>, headers: HeaderMap) -> Response {
    record(&data, "GET /lessons/my-lessons".into(), &headers);
    let Some(user) = caller(&data, &headers) else {
        return unauthorized();
    };
    let mine: Vec<Value> = data
        .lock()
        .unwrap()
        .lessons
        .iter()
        .filter(|l| l["author"]["_id"] == user["_id"])
        .cloned()
        .collect();
    Json(json!({ "data": mine })).into_response()
}

fn lesson_index(data: &BackendData, id: &str) -> Option<usize> {
    data.lessons.iter().position(|l| l["id"].to_string() == id)
}

async fn get_lesson(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    record(&data, format!("GET /lessons/{}", id), &headers);
    let data = data.lock().unwrap();
    match lesson_index(&data, &id) {
        Some(i) => Json(json!({ "data": data.lessons[i] })).into_response(),
        None => not_found(),
    }
}

async fn create_lesson(State(data): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&data, "POST /lessons".into(), &headers);
    let Some(user) = caller(&data, &headers) else {
        return unauthorized();
    };
    let mut data = data.lock().unwrap();
    let id = data.lessons.len() as u64 + 1;
    let mut lesson = lesson_json(
        id,
        body["title"].as_str().unwrap_or_default(),
        body["type"].as_str().unwrap_or("grammar"),
        body["level"].as_str().unwrap_or("beginner"),
        0,
        20,
    );
    lesson["description"] = body["description"].clone();
    lesson["content"] = body["content"].clone();
    lesson["tags"] = body["tags"].clone();
    lesson["author"] = user;
    data.lessons.push(lesson.clone());
    (StatusCode::CREATED, Json(lesson)).into_response()
}

async fn update_lesson(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&data, format!("PATCH /lessons/{}", id), &headers);
    if caller(&data, &headers).is_none() {
        return unauthorized();
    }
    let mut data = data.lock().unwrap();
    let Some(i) = lesson_index(&data, &id) else {
        return not_found();
    };
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            data.lessons[i][key] = value;
        }
    }
    Json(json!({ "data": data.lessons[i] })).into_response()
}

async fn delete_lesson(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    record(&data, format!("DELETE /lessons/{}", id), &headers);
    let mut data = data.lock().unwrap();
    match lesson_index(&data, &id) {
        Some(i) => {
            data.lessons.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(),
    }
}

async fn like_lesson(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    record(&data, format!("POST /lessons/{}/like", id), &headers);
    if caller(&data, &headers).is_none() {
        return unauthorized();
    }
    let mut data = data.lock().unwrap();
    match lesson_index(&data, &id) {
        Some(i) => {
            let likes = data.lessons[i]["likes"].as_u64().unwrap_or(0);
            data.lessons[i]["likes"] = json!(likes + 1);
            StatusCode::CREATED.into_response()
        }
        None => not_found(),
    }
}

async fn list_comments(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Json<Value> {
    record(&data, format!("GET /comments/lesson/{}", id), &headers);
    let comments: Vec<Value> = data
        .lock()
        .unwrap()
        .comments
        .iter()
        .filter(|c| c["lessonId"].to_string() == id)
        .cloned()
        .collect();
    Json(Value::Array(comments))
}

async fn create_comment(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&data, format!("POST /comments/lesson/{}", id), &headers);
    let Some(user) = caller(&data, &headers) else {
        return unauthorized();
    };
    let lesson_id: u64 = id.parse().unwrap_or(0);
    let mut data = data.lock().unwrap();
    let comment = json!({
        "id": data.comments.len() as u64 + 100,
        "content": body["content"],
        "author": user,
        "lessonId": lesson_id,
        "createdAt": chrono::Utc::now().to_rfc3339(),
        "likes": 0
    });
    data.comments.push(comment.clone());
    (StatusCode::CREATED, Json(comment)).into_response()
}

fn comment_index(data: &BackendData, id: &str) -> Option<usize> {
    data.comments.iter().position(|c| c["id"].to_string() == id)
}

async fn update_comment(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    record(&data, format!("PATCH /comments/{}", id), &headers);
    if caller(&data, &headers).is_none() {
        return unauthorized();
    }
    let mut data = data.lock().unwrap();
    match comment_index(&data, &id) {
        Some(i) => {
            if let Some(content) = body.get("content") {
                data.comments[i]["content"] = content.clone();
            }
            Json(data.comments[i].clone()).into_response()
        }
        None => not_found(),
    }
}

async fn delete_comment(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    record(&data, format!("DELETE /comments/{}", id), &headers);
    if caller(&data, &headers).is_none() {
        return unauthorized();
    }
    let mut data = data.lock().unwrap();
    match comment_index(&data, &id) {
        Some(i) => {
            data.comments.remove(i);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(),
    }
}

async fn like_comment(State(data): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    record(&data, format!("POST /comments/{}/like", id), &headers);
    if caller(&data, &headers).is_none() {
        return unauthorized();
    }
    let mut data = data.lock().unwrap();
    match comment_index(&data, &id) {
        Some(i) => {
            let likes = data.comments[i]["likes"].as_u64().unwrap_or(0);
            data.comments[i]["likes"] = json!(likes + 1);
            StatusCode::CREATED.into_response()
        }
        None => not_found(),
    }
}

async fn grammar_check(State(data): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    record(&data, "POST /ai/grammar-check".into(), &headers);
    let text = body["text"].as_str().unwrap_or_default();
    let corrected = text.replace("goed", "went");
    Json(json!({
        "originalText": text,
        "correctedText": if corrected != text { Value::String(corrected) } else { Value::Null },
        "corrections": [{ "original": "goed", "corrected": "went", "explanation": "Irregular past tense" }],
        "suggestions": []
    }))
}

async fn generate_exercise(State(data): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    record(&data, "POST /ai/generate-exercise".into(), &headers);
    data.lock().unwrap().last_exercise_request = Some(body);
    Json(json!({
        "type": "multiple-choice",
        "level": "intermediate",
        "exercises": [
            { "id": 1, "question": "Past of go?", "options": ["goed", "went"], "correctAnswer": 1 }
        ]
    }))
}

async fn generate_vocabulary(State(data): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&data, "POST /ai/generate-vocabulary".into(), &headers);
    Json(json!({ "vocabulary": [{ "word": "went", "definition": "past of go", "example": "I went home." }] }))
}

async fn generate_summary(State(data): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&data, "POST /ai/generate-summary".into(), &headers);
    Json(json!({ "summary": "A lesson about the past.", "keyPoints": ["went"] }))
}

fn backend_router(data: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/profile", get(profile))
        .route("/auth/logout", post(logout))
        .route("/lessons", get(list_lessons).post(create_lesson))
        .route("/lessons/search", get(search_lessons))
        .route("/lessons/my-lessons", get(my_lessons))
        .route(
            "/lessons/{id}",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route("/lessons/{id}/like", post(like_lesson))
        .route("/comments/lesson/{id}", get(list_comments).post(create_comment))
        .route("/comments/{id}", patch(update_comment).delete(delete_comment))
        .route("/comments/{id}/like", post(like_comment))
        .route("/ai/grammar-check", post(grammar_check))
        .route("/ai/generate-exercise", post(generate_exercise))
        .route("/ai/generate-vocabulary", post(generate_vocabulary))
        .route("/ai/generate-summary", post(generate_summary));
    Router::new().nest("/api", api).with_state(data)
}

/// Spawns the fake backend on a free port and returns a handle to its data.
pub async fn spawn_backend() -> FakeBackend {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let data: Shared = Arc::new(Mutex::new(seed()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    let app = backend_router(data.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    FakeBackend { data, origin: format!("http://{addr}") }
}

//=========================================================================================
// Front-end under test
//=========================================================================================

pub fn test_config(backend: &FakeBackend) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        backend_url: backend.origin.clone(),
        log_level: tracing::Level::DEBUG,
        response_delay: Duration::ZERO,
        page_size: 12,
        request_timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_secs(60),
        cache_capacity: 1024,
    }
}

pub fn front_end(backend: &FakeBackend) -> Router {
    let state = Arc::new(AppState::new(Arc::new(test_config(backend))).unwrap());
    router(state)
}
