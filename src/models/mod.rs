//! Core data structures: users, projects, sprints, sign-in tokens.

mod ids;
mod project;
mod sprint;
mod token;
mod user;

pub use ids::{EntityId, ProjectId, SprintId, UserId};
pub use project::{validate_name, NameError, Project, MAX_NAME_LEN};
pub use sprint::{NewSprint, Sprint, SprintError, TimerKind, MAX_NOTES_LEN};
pub use token::{hash_code, EmailToken, CODE_TTL_MINUTES, MAX_ATTEMPTS};
pub use user::{validate_email, User};
