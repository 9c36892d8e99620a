pub mod ai;
pub mod cache;
pub mod domain;
pub mod filter;
pub mod forms;
pub mod markup;
pub mod ports;
pub mod queries;
pub mod session;

#[cfg(test)]
mod test_support;

pub use ai::{AiAction, AiGuardError, AiPanel, AiPayload, AiResult};
pub use cache::{Invalidate, QueryCache, QueryKey, Scope};
pub use domain::{Comment, Id, Lesson, LessonLevel, LessonPage, LessonType, Role, User};
pub use filter::{LessonFilters, SortKey};
pub use ports::{
    AiApi, AuthApi, CommentApi, CredentialPolicy, CredentialStore, LessonApi, Notification,
    NotificationLevel, Notifier, PortError, PortResult,
};
pub use queries::{CommentQueries, LessonQueries, MutationError, MutationState, MutationStatus};
pub use session::{Credentials, Route, Session, SessionError};
