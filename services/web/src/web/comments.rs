//! services/web/src/web/comments.rs
//!
//! Comment mutations. Each one settles (invalidating the lesson's comment list
//! and raising a notification) and then sends the browser back to the lesson.

use axum::{
    extract::{Path, State},
    response::Redirect,
    Extension, Form,
};
use englishhub_core::domain::Id;
use englishhub_core::forms::{CommentForm, CommentPatch};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::web::middleware::RequestContext;
use crate::web::state::AppState;
use crate::web::views;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CommentInput {
    pub content: String,
}

/// Comment actions post the owning lesson along, so the redirect knows where to go.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CommentAction {
    pub lesson_id: String,
    pub content: String,
}

fn back_to(lesson_id: &Id) -> Redirect {
    Redirect::to(&format!("/lessons/{}", views::encode_query(lesson_id.as_str())))
}

/// POST /lessons/{id}/comments - blank comments are ignored without a request.
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(lesson_id): Path<String>,
    Form(input): Form<CommentInput>,
) -> Redirect {
    let lesson_id = Id::new(lesson_id);
    match CommentForm::new(&input.content) {
        Some(form) => {
            let _ = ctx.comments(&state, lesson_id.clone()).create(&form).await;
        }
        None => debug!("Ignoring blank comment on lesson {}", lesson_id),
    }
    back_to(&lesson_id)
}

/// POST /comments/{id}/like
pub async fn like_comment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(action): Form<CommentAction>,
) -> Redirect {
    let lesson_id = Id::new(action.lesson_id);
    let _ = ctx.comments(&state, lesson_id.clone()).like(&Id::new(id)).await;
    back_to(&lesson_id)
}

/// POST /comments/{id}/delete
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(action): Form<CommentAction>,
) -> Redirect {
    let lesson_id = Id::new(action.lesson_id);
    let _ = ctx.comments(&state, lesson_id.clone()).delete(&Id::new(id)).await;
    back_to(&lesson_id)
}

/// POST /comments/{id}/edit - a blank edit leaves the comment as it was.
pub async fn edit_comment(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Form(action): Form<CommentAction>,
) -> Redirect {
    let lesson_id = Id::new(action.lesson_id);
    if let Some(form) = CommentForm::new(&action.content) {
        let patch = CommentPatch { content: Some(form.content) };
        let _ = ctx
            .comments(&state, lesson_id.clone())
            .update(&Id::new(id), &patch)
            .await;
    }
    back_to(&lesson_id)
}
