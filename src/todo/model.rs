use serde::{Deserialize, Serialize};

use crate::types::TodoId;

/// Urgency of a todo. Encoded on the wire as an integer where a lower
/// number is more urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    Medium = 2,
    #[default]
    Low = 3,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("invalid priority {}, expected 1 (HIGH), 2 (MEDIUM) or 3 (LOW)", other)),
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| format!("invalid priority {}", value))
            .and_then(Priority::try_from)
    }
}

/// A stored todo record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: TodoId,
    pub todo_name: String,
    pub todo_description: String,
    pub priority: Priority,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Request body for creating a todo. The id is always assigned by the store,
/// so a client-supplied `todo_id` is rejected like any other unknown field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TodoCreate {
    pub todo_name: String,
    pub todo_description: String,
    #[serde(default)]
    pub priority: Priority,
    pub username: String,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl TodoCreate {
    pub fn into_todo(self, todo_id: TodoId) -> Todo {
        Todo {
            todo_id,
            todo_name: self.todo_name,
            todo_description: self.todo_description,
            priority: self.priority,
            username: self.username,
            user_email: self.user_email,
        }
    }
}

/// Partial update. Absent (or null) fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TodoPatch {
    pub todo_name: Option<String>,
    pub todo_description: Option<String>,
    pub priority: Option<Priority>,
    pub username: Option<String>,
    pub user_email: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.todo_name.is_none()
            && self.todo_description.is_none()
            && self.priority.is_none()
            && self.username.is_none()
            && self.user_email.is_none()
    }
}

impl Todo {
    /// Returns a copy of this record with every present patch field applied.
    pub fn merged(&self, patch: &TodoPatch) -> Todo {
        let mut merged = self.clone();
        if let Some(name) = &patch.todo_name {
            merged.todo_name = name.clone();
        }
        if let Some(description) = &patch.todo_description {
            merged.todo_description = description.clone();
        }
        if let Some(priority) = patch.priority {
            merged.priority = priority;
        }
        if let Some(username) = &patch.username {
            merged.username = username.clone();
        }
        if let Some(email) = &patch.user_email {
            merged.user_email = Some(email.clone());
        }
        merged
    }
}
