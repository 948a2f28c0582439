//! User data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A person who sends work to the service, identified by their phone.
///
/// `id` and the timestamps are owned by the store: they are zero/epoch until
/// the record has been persisted and are never set by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// Mobile number in the format supplied by the SMS gateway.
    pub mobile_number: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build an unsaved user.
    pub fn new(mobile_number: impl Into<String>) -> Self {
        Self {
            id: UserId::UNASSIGNED,
            mobile_number: mobile_number.into(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// Store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn assign_id(&mut self, id: UserId) {
        self.id = id;
    }

    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
    }

    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
