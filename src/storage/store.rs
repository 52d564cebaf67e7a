//! In-memory store over the JSONL collections.
//!
//! Loads every collection at startup and serves reads from memory;
//! each mutation rewrites or appends to the backing file under the
//! collection's lock before returning, then publishes a change event.
//! Suitable for the single-process deployments this serves.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use super::jsonl::{Collection, JsonlReader, JsonlWriter};
use super::{StorageConfig, StorageError};
use crate::events::{ChangeAction, ChangeEvent, EventBus, EntityKind};
use crate::models::{
    validate_name, EmailToken, NameError, NewSprint, Project, ProjectId, Sprint, SprintError,
    SprintId, User, UserId,
};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error(transparent)]
    InvalidSprint(#[from] SprintError),

    #[error("A project named '{0}' already exists")]
    DuplicateName(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Partial update for a sprint's mutable fields.
#[derive(Debug, Default)]
pub struct SprintUpdate {
    pub project_id: Option<ProjectId>,
    pub duration_seconds: Option<u32>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

/// The application's data store.
pub struct Store {
    config: StorageConfig,
    bus: Arc<EventBus>,
    users: Mutex<Vec<User>>,
    projects: Mutex<Vec<Project>>,
    sprints: Mutex<Vec<Sprint>>,
    tokens: Mutex<Vec<EmailToken>>,
}

impl Store {
    /// Load all collections from the data directory.
    pub fn open(config: StorageConfig, bus: Arc<EventBus>) -> Result<Self, StorageError> {
        let users: Vec<User> =
            JsonlReader::for_collection(&config, Collection::User).read_all()?;
        let projects: Vec<Project> =
            JsonlReader::for_collection(&config, Collection::Project).read_all()?;
        let sprints: Vec<Sprint> =
            JsonlReader::for_collection(&config, Collection::Sprint).read_all()?;
        let tokens: Vec<EmailToken> =
            JsonlReader::for_collection(&config, Collection::EmailToken).read_all()?;

        info!(
            users = users.len(),
            projects = projects.len(),
            sprints = sprints.len(),
            "Loaded store from {:?}",
            config.data_dir
        );

        Ok(Self {
            config,
            bus,
            users: Mutex::new(users),
            projects: Mutex::new(projects),
            sprints: Mutex::new(sprints),
            tokens: Mutex::new(tokens),
        })
    }

    fn writer<T: serde::Serialize>(&self, collection: Collection) -> JsonlWriter<T> {
        JsonlWriter::for_collection(&self.config, collection)
    }

    fn publish(&self, entity: EntityKind, action: ChangeAction, id: impl Into<String>, user: &UserId) {
        self.bus
            .publish(ChangeEvent::new(entity, action, id.into().into(), user.clone()));
    }

    // -- users --------------------------------------------------------

    /// Find or create the user for an email, stamping `last_login_at`.
    /// Emails are matched case-insensitively and stored lowercased.
    pub fn upsert_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let email = email.trim().to_lowercase();
        let mut users = self.users.lock().unwrap();

        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.last_login_at = Utc::now();
            let updated = user.clone();
            self.writer(Collection::User).write_all(&users)?;
            self.publish(EntityKind::User, ChangeAction::Updated, updated.id.as_str(), &updated.id);
            return Ok(updated);
        }

        let user = User::new(email);
        users.push(user.clone());
        self.writer(Collection::User).append(&user)?;
        self.publish(EntityKind::User, ChangeAction::Created, user.id.as_str(), &user.id);
        Ok(user)
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    // -- email tokens -------------------------------------------------

    /// Save a sign-in token, replacing any outstanding one for the same
    /// email. Re-requesting a code invalidates the previous code.
    pub fn save_token(&self, token: EmailToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.email != token.email);
        tokens.push(token);
        self.writer(Collection::EmailToken).write_all(&tokens)?;
        Ok(())
    }

    pub fn token_for_email(&self, email: &str) -> Option<EmailToken> {
        let email = email.trim().to_lowercase();
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.email == email)
            .cloned()
    }

    /// Bump the failed-attempt counter on an outstanding token.
    pub fn record_token_attempt(&self, email: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.email == email) {
            token.attempts += 1;
        }
        self.writer(Collection::EmailToken).write_all(&tokens)?;
        Ok(())
    }

    /// Remove the token after a successful verification (or burn-out).
    pub fn remove_token(&self, email: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.email != email);
        self.writer(Collection::EmailToken).write_all(&tokens)?;
        Ok(())
    }

    // -- projects -----------------------------------------------------

    /// The user's projects, oldest first.
    pub fn list_projects(&self, user: &UserId) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.user_id == user)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        projects
    }

    pub fn get_project(&self, user: &UserId, id: &ProjectId) -> Option<Project> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.id == id && &p.user_id == user)
            .cloned()
    }

    /// Case-insensitive name lookup, used to attach sprints to an
    /// existing project by name.
    pub fn find_project_by_name(&self, user: &UserId, name: &str) -> Option<Project> {
        let wanted = name.trim().to_lowercase();
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.user_id == user && p.name.to_lowercase() == wanted)
            .cloned()
    }

    /// Create a project. Names are unique per user, compared
    /// case-insensitively on the trimmed form.
    pub fn create_project(&self, user: &UserId, name: &str) -> Result<Project, StoreError> {
        let name = validate_name(name)?;
        let mut projects = self.projects.lock().unwrap();

        let clash = projects
            .iter()
            .any(|p| &p.user_id == user && p.name.to_lowercase() == name.to_lowercase());
        if clash {
            return Err(StoreError::DuplicateName(name));
        }

        let project = Project::new(user.clone(), name);
        projects.push(project.clone());
        self.writer(Collection::Project).append(&project)?;
        self.publish(EntityKind::Project, ChangeAction::Created, project.id.as_str(), user);
        Ok(project)
    }

    /// Rename a project, with the same uniqueness rule as creation.
    pub fn rename_project(
        &self,
        user: &UserId,
        id: &ProjectId,
        name: &str,
    ) -> Result<Project, StoreError> {
        let name = validate_name(name)?;
        let mut projects = self.projects.lock().unwrap();

        let clash = projects
            .iter()
            .any(|p| &p.user_id == user && &p.id != id && p.name.to_lowercase() == name.to_lowercase());
        if clash {
            return Err(StoreError::DuplicateName(name));
        }

        let project = projects
            .iter_mut()
            .find(|p| &p.id == id && &p.user_id == user)
            .ok_or(StoreError::NotFound("project"))?;
        project.name = name;
        project.updated_at = Utc::now();
        let updated = project.clone();

        self.writer(Collection::Project).write_all(&projects)?;
        self.publish(EntityKind::Project, ChangeAction::Updated, updated.id.as_str(), user);
        Ok(updated)
    }

    /// Delete a project. Sprints that reference it are left in place;
    /// listings fall back to a placeholder name for them.
    pub fn delete_project(&self, user: &UserId, id: &ProjectId) -> Result<(), StoreError> {
        let mut projects = self.projects.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| !(&p.id == id && &p.user_id == user));
        if projects.len() == before {
            return Err(StoreError::NotFound("project"));
        }

        self.writer(Collection::Project).write_all(&projects)?;
        self.publish(EntityKind::Project, ChangeAction::Deleted, id.as_str(), user);
        Ok(())
    }

    // -- sprints ------------------------------------------------------

    /// Validate and persist a finished sprint.
    pub fn add_sprint(&self, user: &UserId, draft: NewSprint) -> Result<Sprint, StoreError> {
        draft.validate()?;
        let sprint = draft.into_sprint(user.clone());

        let mut sprints = self.sprints.lock().unwrap();
        sprints.push(sprint.clone());
        self.writer(Collection::Sprint).append(&sprint)?;
        self.publish(EntityKind::Sprint, ChangeAction::Created, sprint.id.as_str(), user);
        Ok(sprint)
    }

    /// All of the user's sprints, most recently completed first.
    pub fn list_sprints(&self, user: &UserId) -> Vec<Sprint> {
        let mut sprints: Vec<Sprint> = self
            .sprints
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user)
            .cloned()
            .collect();
        sprints.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        sprints
    }

    pub fn get_sprint(&self, user: &UserId, id: &SprintId) -> Option<Sprint> {
        self.sprints
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == id && &s.user_id == user)
            .cloned()
    }

    /// Apply a partial edit: reassign the project, correct the duration,
    /// or replace/clear the notes.
    pub fn update_sprint(
        &self,
        user: &UserId,
        id: &SprintId,
        update: SprintUpdate,
    ) -> Result<Sprint, StoreError> {
        if update.duration_seconds == Some(0) {
            return Err(StoreError::InvalidSprint(SprintError::ZeroDuration));
        }

        let mut sprints = self.sprints.lock().unwrap();
        let sprint = sprints
            .iter_mut()
            .find(|s| &s.id == id && &s.user_id == user)
            .ok_or(StoreError::NotFound("sprint"))?;

        if let Some(project_id) = update.project_id {
            sprint.project_id = project_id;
        }
        if let Some(duration) = update.duration_seconds {
            sprint.duration_seconds = duration;
        }
        if let Some(notes) = update.notes {
            let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            if let Some(n) = &notes {
                if n.len() > crate::models::MAX_NOTES_LEN {
                    return Err(StoreError::InvalidSprint(SprintError::NotesTooLong));
                }
            }
            sprint.notes = notes;
        }
        let updated = sprint.clone();

        self.writer(Collection::Sprint).write_all(&sprints)?;
        self.publish(EntityKind::Sprint, ChangeAction::Updated, updated.id.as_str(), user);
        Ok(updated)
    }

    pub fn delete_sprint(&self, user: &UserId, id: &SprintId) -> Result<(), StoreError> {
        let mut sprints = self.sprints.lock().unwrap();
        let before = sprints.len();
        sprints.retain(|s| !(&s.id == id && &s.user_id == user));
        if sprints.len() == before {
            return Err(StoreError::NotFound("sprint"));
        }

        self.writer(Collection::Sprint).write_all(&sprints)?;
        self.publish(EntityKind::Sprint, ChangeAction::Deleted, id.as_str(), user);
        Ok(())
    }
}
