//! services/web/src/web/lessons.rs
//!
//! The home page, the filtered lesson list and the lesson detail page.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use chrono::Utc;
use englishhub_core::domain::{Id, Lesson};
use englishhub_core::filter::LessonFilters;
use englishhub_core::ports::PortError;
use englishhub_core::queries::DEFAULT_PAGE;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::WebError;
use crate::web::middleware::RequestContext;
use crate::web::state::AppState;
use crate::web::views::{self, LessonDetailView, LessonListView};

const LATEST_ON_HOME: usize = 6;

//=========================================================================================
// Request Types
//=========================================================================================

/// Query string of `GET /lessons`. Unknown or empty values mean "no filter".
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub lesson_type: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn filters(&self) -> LessonFilters {
        LessonFilters {
            search: self.search.as_deref().map(str::trim).unwrap_or_default().to_string(),
            lesson_type: self.lesson_type.as_deref().and_then(|v| v.parse().ok()),
            level: self.level.as_deref().and_then(|v| v.parse().ok()),
            sort_by: self
                .sort_by
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(DEFAULT_PAGE)
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /
pub async fn home_page(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let latest: Vec<Lesson> = match ctx.lessons(&state).page(DEFAULT_PAGE, state.config.page_size).await {
        Ok(page) => LessonFilters::default()
            .apply(&page.lessons)
            .into_iter()
            .take(LATEST_ON_HOME)
            .collect(),
        Err(e) => {
            warn!("Could not load the latest lessons: {}", e);
            Vec::new()
        }
    };
    let body = views::home(ctx.credentials.is_authenticated(), &latest);
    ctx.render(&state, "Home", body).await.into_response()
}

/// Pulls a requested page back inside the range the backend reports, so
/// arbitrary page numbers never reach the backend or the cache.
async fn clamp_page(state: &AppState, ctx: &RequestContext, page: u32) -> u32 {
    if page <= DEFAULT_PAGE {
        return DEFAULT_PAGE;
    }
    match ctx.lessons(state).page(DEFAULT_PAGE, state.config.page_size).await {
        Ok(first) => page.min(first.page_count()),
        Err(_) => DEFAULT_PAGE,
    }
}

/// GET /lessons - one backend page, filtered and sorted locally.
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ListParams>,
) -> Response {
    let filters = params.filters();
    let page = clamp_page(&state, &ctx, params.page()).await;

    let (lessons, page_count, error) =
        match ctx.lessons(&state).page(page, state.config.page_size).await {
            Ok(result) => (filters.apply(&result.lessons), result.page_count(), None),
            Err(e) => {
                warn!("Could not load lesson page {}: {}", page, e);
                (Vec::new(), 1, Some(e.to_string()))
            }
        };

    let body = views::lesson_list(&LessonListView {
        filters: &filters,
        lessons: &lessons,
        page,
        page_count,
        error: error.as_deref(),
    });
    ctx.render(&state, "Lessons", body).await.into_response()
}

/// GET /lessons/{id} - a missing lesson renders in place with a 404 status.
pub async fn lesson_detail(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let id = Id::new(id);
    let lessons = ctx.lessons(&state);
    let comments = ctx.comments(&state, id.clone());

    let (lesson, comment_list, viewer) =
        futures::join!(lessons.lesson(&id), comments.list(), ctx.user(&state));

    let lesson = match lesson {
        Ok(lesson) => Some(lesson),
        Err(PortError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let (comment_list, comments_error) = match comment_list {
        Ok(list) => (list, None),
        Err(e) => {
            warn!("Could not load comments for lesson {}: {}", id, e);
            (Vec::new(), Some(e.to_string()))
        }
    };

    let status = if lesson.is_some() { StatusCode::OK } else { StatusCode::NOT_FOUND };
    let title = lesson.as_ref().map(|l| l.title.clone()).unwrap_or_else(|| "Lesson not found".into());
    let body = views::lesson_detail(&LessonDetailView {
        lesson: lesson.as_ref(),
        comments: &comment_list,
        comments_error: comments_error.as_deref(),
        viewer: viewer.as_ref(),
        now: Utc::now(),
    });
    Ok((status, ctx.render(&state, &title, body).await).into_response())
}

/// POST /lessons/{id}/like - the page only shows the new count once the backend accepted it.
pub async fn like_lesson(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Redirect {
    let id = Id::new(id);
    let _ = ctx.lessons(&state).like(&id).await;
    Redirect::to(&format!("/lessons/{}", views::encode_query(id.as_str())))
}

/// POST /lessons/{id}/delete
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Redirect {
    let id = Id::new(id);
    match ctx.lessons(&state).delete(&id).await {
        Ok(()) => Redirect::to("/lessons"),
        Err(_) => Redirect::to(&format!("/lessons/{}", views::encode_query(id.as_str()))),
    }
}
