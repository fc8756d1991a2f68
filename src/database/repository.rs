use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::TodoRow;
use crate::todo::Todo;
use crate::types::TodoId;

const SELECT_TODOS: &str =
    "SELECT id, todo_name, todo_description, priority, username, user_email FROM todos ORDER BY id";

/// SQL access to the `todos` table
#[derive(Clone)]
pub struct TodoRepository {
    pool: SqlitePool,
}

impl TodoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn select_all(&self) -> Result<Vec<TodoRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, TodoRow>(SELECT_TODOS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// All rows converted to domain records, for populating the store
    pub async fn load_all(&self) -> Result<Vec<Todo>, DatabaseError> {
        self.select_all()
            .await?
            .into_iter()
            .map(Todo::try_from)
            .collect()
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Largest id present in the table, 0 when empty
    pub async fn max_id(&self) -> Result<TodoId, DatabaseError> {
        let (max,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    /// Insert a record keeping the id the store assigned
    pub async fn insert(&self, todo: &Todo) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO todos (id, todo_name, todo_description, priority, username, user_email)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(todo.todo_id)
        .bind(&todo.todo_name)
        .bind(&todo.todo_description)
        .bind(u8::from(todo.priority) as i64)
        .bind(&todo.username)
        .bind(&todo.user_email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert(&self, todo: &Todo) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO todos (id, todo_name, todo_description, priority, username, user_email)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                todo_name = excluded.todo_name,
                todo_description = excluded.todo_description,
                priority = excluded.priority,
                username = excluded.username,
                user_email = excluded.user_email",
        )
        .bind(todo.todo_id)
        .bind(&todo.todo_name)
        .bind(&todo.todo_description)
        .bind(u8::from(todo.priority) as i64)
        .bind(&todo.username)
        .bind(&todo.user_email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("todo {} not in table", id)));
        }
        Ok(())
    }
}
