//! services/web/src/web/authoring.rs
//!
//! The teacher-only create-lesson page and its side panel: markup preview and
//! the AI tools. Every panel button posts the whole draft, so nothing typed is
//! lost between round trips.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use englishhub_core::ai::{AiAction, AiGuardError, AiResult};
use englishhub_core::forms::{parse_tags, FieldErrors, LessonForm};
use englishhub_core::ports::{Notification, Notifier};
use englishhub_core::queries::MutationError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::web::middleware::RequestContext;
use crate::web::state::AppState;
use crate::web::views::{self, CreateLessonView};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct DraftInput {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub lesson_type: String,
    pub level: String,
    pub tags: String,
    /// Which panel button was pressed.
    pub panel: String,
}

impl DraftInput {
    pub fn draft(&self) -> LessonForm {
        let defaults = LessonForm::default();
        LessonForm {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            content: self.content.clone(),
            lesson_type: self.lesson_type.parse().unwrap_or(defaults.lesson_type),
            level: self.level.parse().unwrap_or(defaults.level),
            tags: parse_tags(&self.tags),
        }
    }
}

/// What a panel button asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Preview,
    Edit,
    Close,
    Apply,
    Run(AiAction),
}

impl PanelCommand {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "preview" => Some(PanelCommand::Preview),
            "edit" => Some(PanelCommand::Edit),
            "close" => Some(PanelCommand::Close),
            "apply" => Some(PanelCommand::Apply),
            other => other.parse().ok().map(PanelCommand::Run),
        }
    }
}

struct Draft<'a> {
    form: &'a LessonForm,
    tags: &'a str,
    errors: &'a FieldErrors,
    preview: bool,
    result: Option<&'a AiResult>,
    notice: Option<&'a str>,
}

async fn render(state: &AppState, ctx: &RequestContext, draft: Draft<'_>) -> Response {
    let body = views::create_lesson(&CreateLessonView {
        draft: draft.form,
        tags: draft.tags,
        errors: draft.errors,
        preview: draft.preview,
        result: draft.result,
        notice: draft.notice,
    });
    ctx.render(state, "Create lesson", body).await.into_response()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /create-lesson
pub async fn create_lesson_page(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let panel = state.panel(ctx.credentials.scope()).await;
    let result = panel.result();
    let draft = Draft {
        form: &LessonForm::default(),
        tags: "",
        errors: &FieldErrors::default(),
        preview: false,
        result: result.as_ref(),
        notice: None,
    };
    render(&state, &ctx, draft).await
}

/// POST /create-lesson - publishes the draft and opens the new lesson.
pub async fn create_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(input): Form<DraftInput>,
) -> Response {
    let form = input.draft();
    let errors = match ctx.lessons(&state).create(&form).await {
        Ok(lesson) => {
            info!("Lesson {} published", lesson.id);
            state.panel(ctx.credentials.scope()).await.close();
            let path = format!("/lessons/{}", views::encode_query(lesson.id.as_str()));
            return Redirect::to(&path).into_response();
        }
        Err(MutationError::Invalid(errors)) => errors,
        Err(MutationError::Failed(_)) => FieldErrors::default(),
    };

    let panel = state.panel(ctx.credentials.scope()).await;
    let result = panel.result();
    let draft = Draft {
        form: &form,
        tags: &input.tags,
        errors: &errors,
        preview: false,
        result: result.as_ref(),
        notice: None,
    };
    render(&state, &ctx, draft).await
}

/// POST /create-lesson/panel - preview toggle, AI actions and "apply changes".
pub async fn panel_handler(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(input): Form<DraftInput>,
) -> Response {
    let mut form = input.draft();
    let panel = state.panel(ctx.credentials.scope()).await;
    let mut preview = false;
    let mut notice: Option<String> = None;

    match PanelCommand::parse(&input.panel) {
        Some(PanelCommand::Preview) => preview = true,
        Some(PanelCommand::Edit) | None => {}
        Some(PanelCommand::Close) => panel.close(),
        Some(PanelCommand::Apply) => {
            let corrected = panel.result().and_then(|r| r.correction().map(str::to_string));
            match corrected {
                Some(text) => {
                    form.content = text;
                    ctx.notifier.notify(Notification::success("Corrections applied to the lesson"));
                }
                None => warn!("Apply pressed without a grammar correction on the panel"),
            }
            panel.close();
        }
        Some(PanelCommand::Run(action)) => {
            let ai = ctx.backend.clone();
            if let Err(e) = panel.run(ai.as_ref(), action, &form.content).await {
                notice = Some(e.to_string());
                if let AiGuardError::Busy(running) = e {
                    info!("AI action {} refused while {} runs", action.as_str(), running.as_str());
                }
            }
        }
    }

    let result = panel.result();
    let draft = Draft {
        form: &form,
        tags: &input.tags,
        errors: &FieldErrors::default(),
        preview,
        result: result.as_ref(),
        notice: notice.as_deref(),
    };
    render(&state, &ctx, draft).await
}
