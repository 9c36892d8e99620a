//! services/web/src/web/views.rs
//!
//! HTML rendering. Every value that came from a user or from the backend goes
//! through `escape_html` (or the markup renderer, which escapes first).

use chrono::{DateTime, Utc};
use englishhub_core::ai::{AiAction, AiPayload, AiResult};
use englishhub_core::domain::{
    Comment, ExerciseSet, GrammarCheck, Lesson, LessonLevel, LessonType, Role, Summary, User,
    VocabularyList,
};
use englishhub_core::filter::{LessonFilters, SortKey};
use englishhub_core::forms::{FieldErrors, LessonForm, LoginForm, RegisterForm};
use englishhub_core::markup::{escape_html as esc, render_preview, time_ago};
use englishhub_core::ports::{Notification, NotificationLevel};
use std::fmt::Write;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#f8fafc;color:#111827}\
nav{display:flex;gap:1rem;align-items:center;padding:1rem 2rem;background:#fff;border-bottom:1px solid #e5e7eb}\
nav .spacer{flex:1}main{max-width:64rem;margin:2rem auto;padding:0 1rem}\
.flash{padding:.75rem 1rem;border-radius:.5rem;margin-bottom:1rem}\
.flash-success{background:#dcfce7}.flash-error{background:#fee2e2}\
.cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(18rem,1fr));gap:1rem}\
.card{background:#fff;border:1px solid #e5e7eb;border-radius:.75rem;padding:1rem}\
.error{color:#b91c1c;font-size:.875rem}.muted{color:#6b7280}\
.inline{display:inline}label{display:block;margin-top:.75rem}";

fn date(at: &DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|message| format!(r#"<p class="error">{}</p>"#, esc(message)))
        .unwrap_or_default()
}

fn selected(is: bool) -> &'static str {
    if is {
        " selected"
    } else {
        ""
    }
}

/// Percent-encodes a query-string component.
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

//=========================================================================================
// Layout
//=========================================================================================

pub struct Page {
    pub title: String,
    pub user: Option<User>,
    pub flash: Vec<Notification>,
    pub body: String,
}

pub fn layout(page: &Page) -> String {
    let mut nav = String::from(r#"<a href="/"><strong>EnglishHub</strong></a><a href="/lessons">Lessons</a>"#);
    match &page.user {
        Some(user) => {
            if user.role == Role::Teacher {
                nav.push_str(r#"<a href="/create-lesson">Create lesson</a>"#);
            }
            let _ = write!(
                nav,
                r#"<span class="spacer"></span><a href="/profile">{}</a><form class="inline" method="post" action="/logout"><button type="submit">Log out</button></form>"#,
                esc(&user.username)
            );
        }
        None => nav.push_str(
            r#"<span class="spacer"></span><a href="/login">Log in</a><a href="/register">Register</a>"#,
        ),
    }

    let mut flash = String::new();
    for notification in &page.flash {
        let class = match notification.level {
            NotificationLevel::Success => "flash-success",
            NotificationLevel::Error => "flash-error",
        };
        let _ = write!(
            flash,
            r#"<div class="flash {}" role="status">{}</div>"#,
            class,
            esc(&notification.message)
        );
    }

    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{} | EnglishHub</title><style>{}</style></head><body><nav>{}</nav><main>{}{}</main></body></html>"#,
        esc(&page.title),
        STYLE,
        nav,
        flash,
        page.body
    )
}

/// A standalone page for failures that happen outside any handler's layout.
pub fn error_page(title: &str, message: &str) -> String {
    layout(&Page {
        title: title.to_string(),
        user: None,
        flash: Vec::new(),
        body: format!(
            r#"<h1>{}</h1><p class="muted">{}</p><p><a href="/">Back to home</a></p>"#,
            esc(title),
            esc(message)
        ),
    })
}

//=========================================================================================
// Lessons
//=========================================================================================

pub fn lesson_card(lesson: &Lesson) -> String {
    format!(
        r#"<article class="card"><h3><a href="/lessons/{id}">{title}</a></h3><p>{description}</p><p class="muted">{kind} · {level} · by {author}</p><p class="muted">♥ {likes} · {comments} comments · {created}</p></article>"#,
        id = encode_query(lesson.id.as_str()),
        title = esc(&lesson.title),
        description = esc(&lesson.description),
        kind = lesson.lesson_type.label(),
        level = lesson.level.label(),
        author = esc(&lesson.author.username),
        likes = lesson.likes,
        comments = lesson.comments.len(),
        created = date(&lesson.created_at),
    )
}

fn cards(lessons: &[Lesson], empty: &str) -> String {
    if lessons.is_empty() {
        return format!(r#"<p class="muted">{}</p>"#, esc(empty));
    }
    let items: String = lessons.iter().map(lesson_card).collect();
    format!(r#"<div class="cards">{}</div>"#, items)
}

pub fn home(signed_in: bool, latest: &[Lesson]) -> String {
    let start = if signed_in { "/lessons" } else { "/register" };
    let stats = [("50K+", "Lessons"), ("100K+", "Learners"), ("5K+", "Teachers"), ("4.8/5", "Rating")];
    let stats: String = stats
        .iter()
        .map(|(number, label)| format!(r#"<div class="card"><h2>{}</h2><p class="muted">{}</p></div>"#, number, label))
        .collect();

    format!(
        r#"<section><h1>Learn English with the community</h1><p>Share lessons, learn from each other and grow your English skills together.</p><p><a href="{start}">Start learning</a> · <a href="/lessons">Browse lessons</a></p></section><section class="cards">{stats}</section><section><h2>Latest lessons</h2>{latest}</section>"#,
        start = start,
        stats = stats,
        latest = cards(latest, "No lessons have been published yet."),
    )
}

pub struct LessonListView<'a> {
    pub filters: &'a LessonFilters,
    pub lessons: &'a [Lesson],
    pub page: u32,
    pub page_count: u32,
    pub error: Option<&'a str>,
}

fn filter_query(filters: &LessonFilters) -> String {
    let mut query = String::new();
    if !filters.search.is_empty() {
        let _ = write!(query, "&search={}", encode_query(&filters.search));
    }
    if let Some(kind) = filters.lesson_type {
        let _ = write!(query, "&type={}", kind.as_str());
    }
    if let Some(level) = filters.level {
        let _ = write!(query, "&level={}", level.as_str());
    }
    if filters.sort_by != SortKey::default() {
        let _ = write!(query, "&sortBy={}", filters.sort_by.as_str());
    }
    query
}

/// Page links shown on either side of the current page.
const PAGE_WINDOW: u32 = 2;

fn pagination(filters: &LessonFilters, page: u32, page_count: u32) -> String {
    if page_count <= 1 {
        return String::new();
    }
    let page = page.clamp(1, page_count);
    let query = filter_query(filters);
    let link = |n: u32| format!(r#"<a href="/lessons?page={}{}">{}</a> "#, n, query, n);

    let mut links = String::from(r#"<nav aria-label="pagination">"#);
    if page > 1 {
        let _ = write!(links, r#"<a href="/lessons?page={}{}">Previous</a> "#, page - 1, query);
    }
    let first = page.saturating_sub(PAGE_WINDOW).max(1);
    let last = page.saturating_add(PAGE_WINDOW).min(page_count);
    if first > 1 {
        links.push_str(&link(1));
        if first > 2 {
            links.push_str("… ");
        }
    }
    for n in first..=last {
        if n == page {
            let _ = write!(links, r#"<strong aria-current="page">{}</strong> "#, n);
        } else {
            links.push_str(&link(n));
        }
    }
    if last < page_count {
        if last < page_count - 1 {
            links.push_str("… ");
        }
        links.push_str(&link(page_count));
    }
    if page < page_count {
        let _ = write!(links, r#"<a href="/lessons?page={}{}">Next</a>"#, page + 1, query);
    }
    links.push_str("</nav>");
    links
}

pub fn lesson_list(view: &LessonListView<'_>) -> String {
    let filters = view.filters;
    let types: String = LessonType::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                kind.as_str(),
                selected(filters.lesson_type == Some(*kind)),
                kind.label()
            )
        })
        .collect();
    let levels: String = LessonLevel::ALL
        .iter()
        .map(|level| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                level.as_str(),
                selected(filters.level == Some(*level)),
                level.label()
            )
        })
        .collect();
    let sorts: String = SortKey::ALL
        .iter()
        .map(|key| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                key.as_str(),
                selected(filters.sort_by == *key),
                key.label()
            )
        })
        .collect();

    let results = match view.error {
        Some(message) => format!(r#"<p class="error">Could not load lessons: {}</p>"#, esc(message)),
        None => cards(view.lessons, "No lessons match these filters."),
    };

    format!(
        r#"<h1>Lessons</h1><form method="get" action="/lessons"><input type="search" name="search" placeholder="Search lessons" value="{search}"><select name="type"><option value="">All types</option>{types}</select><select name="level"><option value="">All levels</option>{levels}</select><select name="sortBy">{sorts}</select><button type="submit">Apply</button></form><p class="muted">{count} lessons on this page</p>{results}{pages}"#,
        search = esc(&filters.search),
        types = types,
        levels = levels,
        sorts = sorts,
        count = view.lessons.len(),
        results = results,
        pages = pagination(filters, view.page, view.page_count),
    )
}

pub struct LessonDetailView<'a> {
    pub lesson: Option<&'a Lesson>,
    pub comments: &'a [Comment],
    pub comments_error: Option<&'a str>,
    pub viewer: Option<&'a User>,
    pub now: DateTime<Utc>,
}

fn comment_item(comment: &Comment, viewer: Option<&User>, now: DateTime<Utc>) -> String {
    let id = encode_query(comment.id.as_str());
    let mut actions = format!(
        r#"<form class="inline" method="post" action="/comments/{id}/like"><input type="hidden" name="lesson_id" value="{lesson}"><button type="submit">♥ {likes}</button></form>"#,
        id = id,
        lesson = esc(comment.lesson_id.as_str()),
        likes = comment.likes,
    );
    if viewer.is_some_and(|user| user.id == comment.author.id) {
        let _ = write!(
            actions,
            r#"<form class="inline" method="post" action="/comments/{id}/edit"><input type="hidden" name="lesson_id" value="{lesson}"><input name="content" value="{content}" aria-label="Edit comment"><button type="submit">Save</button></form><form class="inline" method="post" action="/comments/{id}/delete"><input type="hidden" name="lesson_id" value="{lesson}"><button type="submit">Delete</button></form>"#,
            id = id,
            lesson = esc(comment.lesson_id.as_str()),
            content = esc(&comment.content),
        );
    }
    format!(
        r#"<li class="card"><p><strong>{author}</strong> <span class="muted">{when}</span></p><p>{content}</p>{actions}</li>"#,
        author = esc(&comment.author.username),
        when = time_ago(comment.created_at, now),
        content = esc(&comment.content),
        actions = actions,
    )
}

pub fn lesson_detail(view: &LessonDetailView<'_>) -> String {
    let Some(lesson) = view.lesson else {
        return r#"<h1>Lesson not found</h1><p class="muted">This lesson does not exist or was removed.</p><p><a href="/lessons">Back to lessons</a></p>"#.to_string();
    };
    let id = encode_query(lesson.id.as_str());

    let mut manage = String::new();
    if view.viewer.is_some_and(|user| user.id == lesson.author.id) {
        let _ = write!(
            manage,
            r#"<form class="inline" method="post" action="/lessons/{}/delete"><button type="submit">Delete lesson</button></form>"#,
            id
        );
    }

    let tags: String = lesson
        .tags
        .iter()
        .map(|tag| format!(r#"<span class="card">#{}</span> "#, esc(tag)))
        .collect();

    let comments = match view.comments_error {
        Some(message) => format!(r#"<p class="error">Could not load comments: {}</p>"#, esc(message)),
        None if view.comments.is_empty() => {
            r#"<p class="muted">No comments yet. Be the first to comment!</p>"#.to_string()
        }
        None => {
            let items: String = view
                .comments
                .iter()
                .map(|comment| comment_item(comment, view.viewer, view.now))
                .collect();
            format!("<ul>{}</ul>", items)
        }
    };

    let comment_form = if view.viewer.is_some() {
        format!(
            r#"<form method="post" action="/lessons/{}/comments"><textarea name="content" rows="3" placeholder="Write a comment..."></textarea><button type="submit">Post comment</button></form>"#,
            id
        )
    } else {
        r#"<p class="muted"><a href="/login">Log in</a> to join the discussion.</p>"#.to_string()
    };

    format!(
        r#"<article><p><a href="/lessons">← Back to lessons</a></p><h1>{title}</h1><p class="muted">{kind} · {level} · by {author} · created {created} · updated {updated}</p><p>{description}</p><div class="card">{content}</div><p>{tags}</p><form class="inline" method="post" action="/lessons/{id}/like"><button type="submit">♥ Like ({likes})</button></form> {manage}</article><section><h2>Comments</h2>{comment_form}{comments}</section>"#,
        title = esc(&lesson.title),
        kind = lesson.lesson_type.label(),
        level = lesson.level.label(),
        author = esc(&lesson.author.username),
        created = date(&lesson.created_at),
        updated = date(&lesson.updated_at),
        description = esc(&lesson.description),
        content = render_preview(&lesson.content),
        tags = tags,
        id = id,
        likes = lesson.likes,
        manage = manage,
        comment_form = comment_form,
        comments = comments,
    )
}

//=========================================================================================
// Auth & profile
//=========================================================================================

pub fn login_form(form: &LoginForm, errors: &FieldErrors) -> String {
    format!(
        r#"<h1>Log in</h1><form method="post" action="/login" novalidate><label>Email<input type="email" name="email" value="{email}"></label>{email_error}<label>Password<input type="password" name="password"></label>{password_error}<button type="submit">Log in</button></form><p class="muted">No account yet? <a href="/register">Register</a></p>"#,
        email = esc(&form.email),
        email_error = field_error(errors, "email"),
        password_error = field_error(errors, "password"),
    )
}

pub fn register_form(form: &RegisterForm, errors: &FieldErrors) -> String {
    let roles: String = Role::ALL
        .iter()
        .map(|role| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                role.as_str(),
                selected(form.role == Some(*role)),
                role.label()
            )
        })
        .collect();
    format!(
        r#"<h1>Create an account</h1><form method="post" action="/register" novalidate><label>Username<input name="username" value="{username}"></label>{username_error}<label>Email<input type="email" name="email" value="{email}"></label>{email_error}<label>Password<input type="password" name="password"></label>{password_error}<label>Confirm password<input type="password" name="confirm_password"></label>{confirm_error}<label>Role<select name="role"><option value="">Choose a role</option>{roles}</select></label>{role_error}<button type="submit">Register</button></form><p class="muted">Already registered? <a href="/login">Log in</a></p>"#,
        username = esc(&form.username),
        username_error = field_error(errors, "username"),
        email = esc(&form.email),
        email_error = field_error(errors, "email"),
        password_error = field_error(errors, "password"),
        confirm_error = field_error(errors, "confirm_password"),
        roles = roles,
        role_error = field_error(errors, "role"),
    )
}

pub fn profile(user: Option<&User>, mine: &[Lesson]) -> String {
    let Some(user) = user else {
        return r#"<h1>Profile not available</h1><p class="muted">Please log in to view your profile.</p>"#.to_string();
    };
    let avatar = match &user.avatar {
        Some(url) => format!(r#"<img src="{}" alt="{}" width="96" height="96">"#, esc(url), esc(&user.username)),
        None => format!(
            r#"<div class="card" aria-hidden="true">{}</div>"#,
            esc(&user.username.chars().next().map(String::from).unwrap_or_default())
        ),
    };
    format!(
        r#"<section class="card">{avatar}<h1>{username}</h1><p class="muted">{email}</p><p>{role}</p><h3>User information</h3><p>{username}</p><p>{email}</p><p>Joined on {joined}</p><form method="post" action="/logout"><button type="submit">Log out</button></form></section><section><h2>My lessons</h2>{lessons}</section>"#,
        avatar = avatar,
        username = esc(&user.username),
        email = esc(&user.email),
        role = user.role.label(),
        joined = date(&user.created_at),
        lessons = cards(mine, "You have not created any lessons yet."),
    )
}

//=========================================================================================
// Lesson authoring
//=========================================================================================

pub struct CreateLessonView<'a> {
    pub draft: &'a LessonForm,
    pub tags: &'a str,
    pub errors: &'a FieldErrors,
    pub preview: bool,
    pub result: Option<&'a AiResult>,
    pub notice: Option<&'a str>,
}

fn grammar_result(check: &GrammarCheck, can_apply: bool) -> String {
    let mut html = String::new();
    if let Some(corrected) = &check.corrected_text {
        let _ = write!(html, r#"<div class="card">{}</div>"#, esc(corrected));
    }
    if !check.corrections.is_empty() {
        html.push_str("<ul>");
        for correction in &check.corrections {
            let _ = write!(
                html,
                "<li><del>{}</del> → <ins>{}</ins> {}</li>",
                esc(&correction.original),
                esc(&correction.corrected),
                esc(&correction.explanation)
            );
        }
        html.push_str("</ul>");
    }
    if !check.suggestions.is_empty() {
        html.push_str("<h4>Suggestions</h4><ul>");
        for suggestion in &check.suggestions {
            let _ = write!(html, "<li>{}</li>", esc(suggestion));
        }
        html.push_str("</ul>");
    }
    if can_apply {
        html.push_str(r#"<button type="submit" formaction="/create-lesson/panel" name="panel" value="apply">Apply changes</button>"#);
    }
    html
}

fn quiz_result(set: &ExerciseSet) -> String {
    let mut html = String::new();
    if !set.title.is_empty() {
        let _ = write!(html, "<h4>{}</h4>", esc(&set.title));
    }
    if !set.instructions.is_empty() {
        let _ = write!(html, r#"<p class="muted">{}</p>"#, esc(&set.instructions));
    }
    html.push_str("<ol>");
    for question in &set.questions {
        let _ = write!(html, "<li><p>{}</p><ul>", esc(&question.question));
        for (index, option) in question.options.iter().enumerate() {
            let mark = if question.correct_answer == Some(index) { " ✓" } else { "" };
            let _ = write!(html, "<li>{}{}</li>", esc(option), mark);
        }
        html.push_str("</ul>");
        if !question.explanation.is_empty() {
            let _ = write!(html, r#"<p class="muted">{}</p>"#, esc(&question.explanation));
        }
        html.push_str("</li>");
    }
    html.push_str("</ol>");
    html
}

fn vocabulary_result(list: &VocabularyList) -> String {
    let items: String = list
        .words
        .iter()
        .map(|word| {
            format!(
                r#"<li class="card"><strong>{}</strong>{}<p>{}</p><p class="muted"><em>{}</em></p></li>"#,
                esc(&word.word),
                word.level.map(|level| format!(" ({})", level.label())).unwrap_or_default(),
                esc(&word.definition),
                esc(&word.example)
            )
        })
        .collect();
    format!("<ul>{}</ul>", items)
}

fn summary_result(summary: &Summary) -> String {
    let points: String = summary.key_points.iter().map(|point| format!("<li>{}</li>", esc(point))).collect();
    format!(r#"<p>{}</p><ul>{}</ul>"#, esc(&summary.summary), points)
}

pub fn ai_result(result: &AiResult) -> String {
    let details = match &result.outcome {
        Err(message) => format!(r#"<p class="error">{}</p>"#, esc(message)),
        Ok(AiPayload::Grammar(check)) => grammar_result(check, result.correction().is_some()),
        Ok(AiPayload::Quiz(set)) => quiz_result(set),
        Ok(AiPayload::Flashcards(list)) => vocabulary_result(list),
        Ok(AiPayload::Summary(summary)) => summary_result(summary),
    };
    format!(
        r#"<section class="card" aria-live="polite"><h3>{}</h3><p>{}</p>{}<button type="submit" formaction="/create-lesson/panel" name="panel" value="close">Close</button></section>"#,
        esc(result.title()),
        esc(&result.headline()),
        details
    )
}

pub fn create_lesson(view: &CreateLessonView<'_>) -> String {
    let draft = view.draft;
    let types: String = LessonType::ALL
        .iter()
        .map(|kind| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                kind.as_str(),
                selected(draft.lesson_type == *kind),
                kind.label()
            )
        })
        .collect();
    let levels: String = LessonLevel::ALL
        .iter()
        .map(|level| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                level.as_str(),
                selected(draft.level == *level),
                level.label()
            )
        })
        .collect();

    let editor = if view.preview {
        format!(
            r#"<div class="card">{}</div><input type="hidden" name="content" value="{}"><button type="submit" formaction="/create-lesson/panel" name="panel" value="edit">Edit</button>"#,
            render_preview(&draft.content),
            esc(&draft.content)
        )
    } else {
        format!(
            r#"<textarea name="content" rows="14" placeholder="Write the lesson. **bold**, *italic*, `code`, > quote, - list">{}</textarea><button type="submit" formaction="/create-lesson/panel" name="panel" value="preview">Preview</button>"#,
            esc(&draft.content)
        )
    };

    let actions: String = AiAction::ALL
        .iter()
        .map(|action| {
            format!(
                r#"<button type="submit" formaction="/create-lesson/panel" name="panel" value="{}" title="{}">{}</button> "#,
                action.as_str(),
                esc(action.description()),
                action.title()
            )
        })
        .collect();

    let notice = view
        .notice
        .map(|message| format!(r#"<p class="error" role="alert">{}</p>"#, esc(message)))
        .unwrap_or_default();
    let result = view.result.map(ai_result).unwrap_or_default();

    format!(
        r#"<h1>Create a lesson</h1><form method="post" action="/create-lesson" novalidate><label>Title<input name="title" value="{title}"></label>{title_error}<label>Description<textarea name="description" rows="3">{description}</textarea></label>{description_error}<label>Type<select name="type">{types}</select></label><label>Level<select name="level">{levels}</select></label><label>Tags<input name="tags" value="{tags}" placeholder="grammar, tenses"></label><label>Content</label>{editor}{content_error}<section><h2>AI tools</h2>{actions}{notice}{result}</section><p><button type="submit">Publish lesson</button></p></form>"#,
        title = esc(&draft.title),
        title_error = field_error(view.errors, "title"),
        description = esc(&draft.description),
        description_error = field_error(view.errors, "description"),
        types = types,
        levels = levels,
        tags = esc(view.tags),
        editor = editor,
        content_error = field_error(view.errors, "content"),
        actions = actions,
        notice = notice,
        result = result,
    )
}
