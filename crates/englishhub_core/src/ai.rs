//! crates/englishhub_core/src/ai.rs
//!
//! The AI authoring panel: four actions, each mapped to one backend call and
//! one result shape.
//!
//! Results are a tagged variant per action, so titles, headlines and
//! renderers are resolved by exhaustive matching. Only one action may be
//! active at a time.

use crate::domain::{
    ExerciseKind, ExerciseRequest, ExerciseSet, GrammarCheck, LessonLevel, Summary, UnknownVariant,
    VocabularyList,
};
use crate::ports::{AiApi, PortResult};
use crate::queries::MutationState;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiAction {
    GrammarCheck,
    CreateQuiz,
    CreateFlashcards,
    CreateSummary,
}

impl AiAction {
    pub const ALL: [AiAction; 4] = [
        AiAction::GrammarCheck,
        AiAction::CreateQuiz,
        AiAction::CreateFlashcards,
        AiAction::CreateSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AiAction::GrammarCheck => "grammar-check",
            AiAction::CreateQuiz => "create-quiz",
            AiAction::CreateFlashcards => "create-flashcards",
            AiAction::CreateSummary => "create-summary",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AiAction::GrammarCheck => "Check grammar",
            AiAction::CreateQuiz => "Create exercises",
            AiAction::CreateFlashcards => "Create vocabulary",
            AiAction::CreateSummary => "Summarize content",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AiAction::GrammarCheck => "Find and fix grammar mistakes in the text",
            AiAction::CreateQuiz => "Generate multiple-choice questions from the lesson",
            AiAction::CreateFlashcards => "Build a list of key vocabulary",
            AiAction::CreateSummary => "Write a short summary of the lesson",
        }
    }

    fn index(self) -> usize {
        match self {
            AiAction::GrammarCheck => 0,
            AiAction::CreateQuiz => 1,
            AiAction::CreateFlashcards => 2,
            AiAction::CreateSummary => 3,
        }
    }
}

impl FromStr for AiAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AiAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "AI action", value: s.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiPayload {
    Grammar(GrammarCheck),
    Quiz(ExerciseSet),
    Flashcards(VocabularyList),
    Summary(Summary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiResult {
    pub action: AiAction,
    pub outcome: Result<AiPayload, String>,
}

impl AiResult {
    pub fn title(&self) -> &'static str {
        match &self.outcome {
            Err(_) => "AI request failed",
            Ok(AiPayload::Grammar(_)) => "Grammar check result",
            Ok(AiPayload::Quiz(_)) => "Generated exercises",
            Ok(AiPayload::Flashcards(_)) => "Generated vocabulary",
            Ok(AiPayload::Summary(_)) => "Content summary",
        }
    }

    pub fn headline(&self) -> String {
        match &self.outcome {
            Err(_) => "An error occurred while processing the request:".to_string(),
            Ok(AiPayload::Grammar(check)) if check.corrected_text.is_some() => {
                "Grammar mistakes were found and corrected:".to_string()
            }
            Ok(AiPayload::Grammar(_)) => "No grammar mistakes found.".to_string(),
            Ok(AiPayload::Quiz(set)) => {
                format!("Created {} questions from the lesson content:", set.questions.len())
            }
            Ok(AiPayload::Flashcards(list)) => {
                format!("Created {} key vocabulary words:", list.words.len())
            }
            Ok(AiPayload::Summary(_)) => "A short summary of the lesson:".to_string(),
        }
    }

    /// The corrected text a grammar check offers to apply to the draft.
    pub fn correction(&self) -> Option<&str> {
        match &self.outcome {
            Ok(AiPayload::Grammar(check)) => check.corrected_text.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiGuardError {
    #[error("Please enter some content before using the AI tools")]
    EmptyContent,
    #[error("{} is already running", .0.title())]
    Busy(AiAction),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the active flag even if the running future is dropped.
struct ActiveGuard<'a>(&'a Mutex<Option<AiAction>>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

#[derive(Default)]
pub struct AiPanel {
    active: Mutex<Option<AiAction>>,
    result: Mutex<Option<AiResult>>,
    states: [MutationState; 4],
}

impl AiPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<AiAction> {
        *lock(&self.active)
    }

    pub fn result(&self) -> Option<AiResult> {
        lock(&self.result).clone()
    }

    pub fn state(&self, action: AiAction) -> &MutationState {
        &self.states[action.index()]
    }

    pub fn is_loading(&self) -> bool {
        self.states.iter().any(MutationState::is_pending)
    }

    pub fn close(&self) {
        lock(&self.result).take();
    }

    /// Runs `action` over `content`. Guard failures leave every piece of state untouched.
    pub async fn run(
        &self,
        api: &dyn AiApi,
        action: AiAction,
        content: &str,
    ) -> Result<AiResult, AiGuardError> {
        if content.trim().is_empty() {
            return Err(AiGuardError::EmptyContent);
        }
        let _active = {
            let mut active = lock(&self.active);
            if let Some(running) = *active {
                return Err(AiGuardError::Busy(running));
            }
            *active = Some(action);
            ActiveGuard(&self.active)
        };
        self.close();

        let state = self.state(action);
        state.begin();
        let outcome = dispatch(api, action, content).await;
        state.finish(&outcome);

        let result = AiResult {
            action,
            outcome: outcome.map_err(|e| {
                warn!("AI action {} failed: {}", action.as_str(), e);
                e.to_string()
            }),
        };
        if result.outcome.is_ok() {
            info!("AI action {} completed", action.as_str());
        }
        *lock(&self.result) = Some(result.clone());
        Ok(result)
    }
}

async fn dispatch(api: &dyn AiApi, action: AiAction, content: &str) -> PortResult<AiPayload> {
    match action {
        AiAction::GrammarCheck => api.check_grammar(content).await.map(AiPayload::Grammar),
        AiAction::CreateQuiz => {
            let request = ExerciseRequest {
                content: content.to_string(),
                kind: ExerciseKind::MultipleChoice,
                level: LessonLevel::Intermediate,
            };
            api.generate_exercise(&request).await.map(AiPayload::Quiz)
        }
        AiAction::CreateFlashcards => api.generate_vocabulary().await.map(AiPayload::Flashcards),
        AiAction::CreateSummary => api.generate_summary().await.map(AiPayload::Summary),
    }
}
