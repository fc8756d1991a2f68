use serde::Serialize;
use sqlx::FromRow;

use crate::database::manager::DatabaseError;
use crate::todo::{Priority, Todo};

/// One row of the `todos` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TodoRow {
    pub id: i64,
    pub todo_name: String,
    pub todo_description: String,
    pub priority: i64,
    pub username: String,
    pub user_email: Option<String>,
}

impl TryFrom<TodoRow> for Todo {
    type Error = DatabaseError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let priority = Priority::try_from(row.priority)
            .map_err(|e| DatabaseError::InvalidRow(format!("todo {}: {}", row.id, e)))?;

        Ok(Todo {
            todo_id: row.id,
            todo_name: row.todo_name,
            todo_description: row.todo_description,
            priority,
            username: row.username,
            user_email: row.user_email,
        })
    }
}
