//! In-process change notifications.
//!
//! The store publishes a [`ChangeEvent`] for every mutation so other
//! tasks (the serve command's audit logger, tests) can observe writes
//! without polling the data files. Backed by a `tokio::sync::broadcast`
//! channel and shared as `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{EntityId, UserId};

/// Which record collection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Project,
    Sprint,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Sprint => "sprint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Created => "created",
            ChangeAction::Updated => "updated",
            ChangeAction::Deleted => "deleted",
        }
    }
}

/// One persisted mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub entity: EntityKind,
    pub action: ChangeAction,
    pub entity_id: EntityId,
    pub user_id: UserId,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(entity: EntityKind, action: ChangeAction, entity_id: EntityId, user_id: UserId) -> Self {
        Self {
            entity,
            action,
            entity_id,
            user_id,
            at: Utc::now(),
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus for change events.
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Slow receivers past `capacity` buffered events observe
    /// `RecvError::Lagged` and miss the dropped ones.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. With zero subscribers the
    /// event is dropped, which is fine: the write already hit disk.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
