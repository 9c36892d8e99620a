//! crates/englishhub_core/src/filter.rs
//!
//! The lesson list filter/sort pipeline.
//!
//! Runs synchronously over the lessons of the current page only. It never
//! touches the backend and never changes the page count shown elsewhere.

use crate::domain::{Lesson, LessonLevel, LessonType, UnknownVariant};
use std::cmp::Reverse;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Popular,
    Likes,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Newest, SortKey::Oldest, SortKey::Popular, SortKey::Likes];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Popular => "popular",
            SortKey::Likes => "likes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Newest => "Newest",
            SortKey::Oldest => "Oldest",
            SortKey::Popular => "Popular",
            SortKey::Likes => "Most liked",
        }
    }
}

impl FromStr for SortKey {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "sort key", value: s.to_string() })
    }
}

/// The ranking used by both `popular` and `likes`.
///
/// Whether `popular` should rank by something else (views, bookmarks) is an
/// open question; until decided, both keys share this one policy.
pub fn popularity(lesson: &Lesson) -> u64 {
    lesson.likes
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFilters {
    pub search: String,
    pub lesson_type: Option<LessonType>,
    pub level: Option<LessonLevel>,
    pub sort_by: SortKey,
}

impl LessonFilters {
    pub fn matches(&self, lesson: &Lesson) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_title = lesson.title.to_lowercase().contains(&needle);
            let in_description = lesson.description.to_lowercase().contains(&needle);
            if !in_title && !in_description {
                return false;
            }
        }
        if self.lesson_type.is_some_and(|kind| lesson.lesson_type != kind) {
            return false;
        }
        if self.level.is_some_and(|level| lesson.level != level) {
            return false;
        }
        true
    }

    /// Returns the lessons matching every active predicate, ordered by `sort_by`.
    pub fn apply(&self, lessons: &[Lesson]) -> Vec<Lesson> {
        let mut selected: Vec<Lesson> =
            lessons.iter().filter(|lesson| self.matches(lesson)).cloned().collect();

        match self.sort_by {
            SortKey::Newest => selected.sort_by_key(|lesson| Reverse(lesson.created_at)),
            SortKey::Oldest => selected.sort_by_key(|lesson| lesson.created_at),
            SortKey::Popular | SortKey::Likes => {
                selected.sort_by_key(|lesson| Reverse(popularity(lesson)))
            }
        }
        selected
    }
}
