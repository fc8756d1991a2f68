//! Shared types used across the codebase
use serde::{Deserialize, Serialize};

/// Identifier of a todo record, matching the SQLite INTEGER primary key
pub type TodoId = i64;

/// Store mutations that are replicated to the persistence gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}
