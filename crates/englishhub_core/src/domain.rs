//! crates/englishhub_core/src/domain.rs
//!
//! Defines the core records of the application: users, lessons, comments and
//! the payloads exchanged with the AI authoring endpoints.
//!
//! These are plain records owned by the backend. The front-end only holds
//! ephemeral copies, so no invariants are enforced beyond shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Identity
//=========================================================================================

/// An opaque backend identity.
///
/// The backend is free to send identities as JSON strings or integers; both
/// decode to the same value and are rendered verbatim into URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Id(text),
            RawId::Signed(n) => Id(n.to_string()),
            RawId::Unsigned(n) => Id(n.to_string()),
        })
    }
}

/// Returned by the `FromStr` impls of the closed vocabularies below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

//=========================================================================================
// Closed vocabularies
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Teacher];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "role", value: s.to_string() })
    }
}

/// The six lesson categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Grammar,
    Vocabulary,
    Listening,
    Speaking,
    Reading,
    Writing,
}

impl LessonType {
    pub const ALL: [LessonType; 6] = [
        LessonType::Grammar,
        LessonType::Vocabulary,
        LessonType::Listening,
        LessonType::Speaking,
        LessonType::Reading,
        LessonType::Writing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LessonType::Grammar => "grammar",
            LessonType::Vocabulary => "vocabulary",
            LessonType::Listening => "listening",
            LessonType::Speaking => "speaking",
            LessonType::Reading => "reading",
            LessonType::Writing => "writing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LessonType::Grammar => "Grammar",
            LessonType::Vocabulary => "Vocabulary",
            LessonType::Listening => "Listening",
            LessonType::Speaking => "Speaking",
            LessonType::Reading => "Reading",
            LessonType::Writing => "Writing",
        }
    }
}

impl FromStr for LessonType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LessonType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "lesson type", value: s.to_string() })
    }
}

/// The three difficulty tiers, shared by lessons, exercises and vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl LessonLevel {
    pub const ALL: [LessonLevel; 3] = [
        LessonLevel::Beginner,
        LessonLevel::Intermediate,
        LessonLevel::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LessonLevel::Beginner => "beginner",
            LessonLevel::Intermediate => "intermediate",
            LessonLevel::Advanced => "advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LessonLevel::Beginner => "Beginner",
            LessonLevel::Intermediate => "Intermediate",
            LessonLevel::Advanced => "Advanced",
        }
    }
}

impl FromStr for LessonLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LessonLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "level", value: s.to_string() })
    }
}

//=========================================================================================
// Entities
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(alias = "_id")]
    pub id: Id,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub level: LessonLevel,
    pub author: User,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub bookmarks: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: Id,
    pub content: String,
    pub author: User,
    pub lesson_id: Id,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
}

/// One page of `GET /lessons`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPage {
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl LessonPage {
    /// Number of pages, falling back to `total / limit` and finally to one.
    pub fn page_count(&self) -> u32 {
        if let Some(pages) = self.total_pages {
            return pages.max(1);
        }
        match (self.total, self.limit) {
            (Some(total), Some(limit)) if limit > 0 => {
                let pages = total.div_ceil(u64::from(limit));
                u32::try_from(pages).unwrap_or(u32::MAX).max(1)
            }
            _ => 1,
        }
    }
}

/// The body of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

//=========================================================================================
// AI payloads
//=========================================================================================

/// Kinds of exercise the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Quiz,
    Flashcards,
    Summary,
    GrammarCheck,
    MultipleChoice,
    FillInTheBlank,
    Matching,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub level: LessonLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub position: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarCheck {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub corrected_text: Option<String>,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseQuestion {
    #[serde(default)]
    pub id: u32,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<usize>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    #[serde(default, rename = "type")]
    pub kind: Option<ExerciseKind>,
    #[serde(default)]
    pub level: Option<LessonLevel>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, alias = "exercises")]
    pub questions: Vec<ExerciseQuestion>,
    #[serde(default)]
    pub source_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub word: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub level: Option<LessonLevel>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyList {
    #[serde(default, alias = "vocabulary")]
    pub words: Vec<VocabularyWord>,
    #[serde(default)]
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub original_length: usize,
    #[serde(default)]
    pub summary_length: usize,
}
