//! crates/englishhub_core/src/forms.rs
//!
//! Form payloads and their client-side validation rules.
//!
//! Validation runs synchronously before any network call. A form that fails
//! validation yields a `FieldErrors` map, rendered inline next to each field.

use crate::domain::{LessonLevel, LessonType, Role};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field validation messages, keyed by the form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        // First failing rule wins, like a form library reporting one message per field.
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// No whitespace and an `@` with text on both sides.
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+$").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn require_email(errors: &mut FieldErrors, email: &str) {
    require(errors, "email", email, "Email is required");
    if !is_valid_email(email) {
        errors.add("email", "Email is invalid");
    }
}

//=========================================================================================
// Auth forms
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require_email(&mut errors, &self.email);
        require(&mut errors, "password", &self.password, "Password is required");
        errors.into_result()
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Checked for equality locally; never sent to the backend.
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub role: Option<Role>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "username", &self.username, "Username is required");
        require_email(&mut errors, &self.email);
        require(&mut errors, "password", &self.password, "Password is required");
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        require(
            &mut errors,
            "confirm_password",
            &self.confirm_password,
            "Please confirm your password",
        );
        if self.confirm_password != self.password {
            errors.add("confirm_password", "Passwords do not match");
        }
        if self.role.is_none() {
            errors.add("role", "Role is required");
        }
        errors.into_result()
    }
}

//=========================================================================================
// Lesson forms
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonForm {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub level: LessonLevel,
    pub tags: Vec<String>,
}

impl Default for LessonForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            content: String::new(),
            lesson_type: LessonType::Grammar,
            level: LessonLevel::Beginner,
            tags: Vec::new(),
        }
    }
}

impl LessonForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        require(&mut errors, "title", &self.title, "Title is required");
        require(&mut errors, "description", &self.description, "Description is required");
        require(&mut errors, "content", &self.content, "Lesson content is required");
        errors.into_result()
    }
}

/// Splits a comma-separated tag input, trimming and dropping empty entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// A partial lesson update for `PATCH /lessons/:id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lesson_type: Option<LessonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LessonLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

//=========================================================================================
// Comment forms
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentForm {
    pub content: String,
}

impl CommentForm {
    /// Returns `None` for blank input, which the comment box silently ignores.
    pub fn new(content: &str) -> Option<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self { content: content.to_string() })
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
