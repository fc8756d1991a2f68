use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::model::{Todo, TodoCreate, TodoPatch};
use super::validate::{validate_todo, ValidationErrors};
use crate::types::{Operation, TodoId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Todo not found")]
    NotFound { id: TodoId },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

/// A committed mutation, as published to the change channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub operation: Operation,
    pub todo: Todo,
}

pub type ChangeSender = mpsc::UnboundedSender<Change>;
pub type ChangeReceiver = mpsc::UnboundedReceiver<Change>;

struct StoreState {
    todos: Vec<Todo>,
    /// Highest id ever handed out, so ids of deleted records are never reused
    last_id: TodoId,
}

/// Authoritative in-memory collection of todo records, kept in insertion order.
///
/// Readers (`list`, `get`) share the lock; `create`, `update` and `delete`
/// take it exclusively. Callers always receive owned copies.
///
/// Each committed mutation is pushed onto the optional change channel while
/// the write lock is still held, so the channel order is the commit order.
pub struct TodoStore {
    state: RwLock<StoreState>,
    changes: Option<ChangeSender>,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                todos: Vec::new(),
                last_id: 0,
            }),
            changes: None,
        }
    }

    /// Build a store from existing records (seed data or a database load).
    /// Every record must validate and ids must be unique.
    pub fn with_todos(todos: Vec<Todo>) -> Result<Self, StoreError> {
        let mut seen = std::collections::HashSet::new();
        for todo in &todos {
            validate_todo(todo).map_err(StoreError::Validation)?;
            if !seen.insert(todo.todo_id) {
                let mut errors = ValidationErrors::new();
                errors.add("todo_id", format!("duplicate id {}", todo.todo_id));
                return Err(StoreError::Validation(errors));
            }
        }

        let last_id = todos.iter().map(|t| t.todo_id).max().unwrap_or(0);
        Ok(Self {
            state: RwLock::new(StoreState { todos, last_id }),
            changes: None,
        })
    }

    /// Publish every committed mutation to `changes`
    pub fn publish_to(mut self, changes: ChangeSender) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Never hand out an id at or below `floor`
    pub fn with_id_floor(mut self, floor: TodoId) -> Self {
        let state = self.state.get_mut();
        state.last_id = state.last_id.max(floor);
        self
    }

    /// Take the next id for a record kept outside the store
    pub async fn reserve_id(&self) -> TodoId {
        let mut state = self.state.write().await;
        let todo_id = Self::next_id(&state);
        state.last_id = todo_id;
        todo_id
    }

    /// All records in insertion order, or only the first `limit` of them.
    pub async fn list(&self, limit: Option<usize>) -> Vec<Todo> {
        let state = self.state.read().await;
        match limit {
            Some(n) => state.todos.iter().take(n).cloned().collect(),
            None => state.todos.clone(),
        }
    }

    pub async fn get(&self, id: TodoId) -> Result<Todo, StoreError> {
        let state = self.state.read().await;
        state
            .todos
            .iter()
            .find(|t| t.todo_id == id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.todos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn create(&self, candidate: TodoCreate) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;

        let todo_id = Self::next_id(&state);

        let todo = candidate.into_todo(todo_id);
        validate_todo(&todo).map_err(StoreError::Validation)?;

        state.last_id = todo_id;
        state.todos.push(todo.clone());
        self.publish(Operation::Create, &todo);
        debug!(todo_id, "created todo");
        Ok(todo)
    }

    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;

        let slot = state
            .todos
            .iter_mut()
            .find(|t| t.todo_id == id)
            .ok_or(StoreError::NotFound { id })?;

        if patch.is_empty() {
            debug!(todo_id = id, "empty patch, record unchanged");
            return Ok(slot.clone());
        }

        let merged = slot.merged(&patch);
        validate_todo(&merged).map_err(StoreError::Validation)?;

        *slot = merged.clone();
        self.publish(Operation::Update, &merged);
        debug!(todo_id = id, "updated todo");
        Ok(merged)
    }

    pub async fn delete(&self, id: TodoId) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;

        let index = state
            .todos
            .iter()
            .position(|t| t.todo_id == id)
            .ok_or(StoreError::NotFound { id })?;

        let removed = state.todos.remove(index);
        self.publish(Operation::Delete, &removed);
        debug!(todo_id = id, "deleted todo");
        Ok(removed)
    }

    fn next_id(state: &StoreState) -> TodoId {
        let max_existing = state.todos.iter().map(|t| t.todo_id).max().unwrap_or(0);
        state.last_id.max(max_existing) + 1
    }

    fn publish(&self, operation: Operation, todo: &Todo) {
        let Some(changes) = &self.changes else {
            return;
        };
        let change = Change {
            operation,
            todo: todo.clone(),
        };
        if changes.send(change).is_err() {
            warn!(%operation, todo_id = todo.todo_id, "change channel closed; mutation not mirrored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::model::Priority;
    use crate::todo::seed::seed_todos;

    fn candidate(name: &str) -> TodoCreate {
        TodoCreate {
            todo_name: name.to_string(),
            todo_description: "Pump".to_string(),
            priority: Priority::Low,
            username: "Soslan".to_string(),
            user_email: None,
        }
    }

    fn seeded() -> TodoStore {
        TodoStore::with_todos(seed_todos()).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_next_id_after_seed() {
        let store = seeded();
        let todo = store.create(candidate("Gym")).await.unwrap();
        assert_eq!(todo.todo_id, 6);
        assert_eq!(store.len().await, 6);
        assert_eq!(store.list(None).await.last().unwrap(), &todo);
    }

    #[tokio::test]
    async fn create_on_empty_store_starts_at_one() {
        let store = TodoStore::new();
        assert!(store.is_empty().await);
        let todo = store.create(candidate("First")).await.unwrap();
        assert_eq!(todo.todo_id, 1);
    }

    #[tokio::test]
    async fn ids_are_unique_and_strictly_increasing() {
        let store = seeded();
        let mut previous = 0;
        for i in 0..20 {
            let todo = store.create(candidate(&format!("Task {}", i))).await.unwrap();
            assert!(todo.todo_id > previous);
            previous = todo.todo_id;
        }
        let ids: std::collections::HashSet<_> =
            store.list(None).await.iter().map(|t| t.todo_id).collect();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = seeded();
        let created = store.create(candidate("Gym")).await.unwrap();
        store.delete(created.todo_id).await.unwrap();
        let next = store.create(candidate("Swim")).await.unwrap();
        assert_eq!(next.todo_id, created.todo_id + 1);
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = seeded();
        let input = candidate("Gym");
        let created = store.create(input.clone()).await.unwrap();
        let fetched = store.get(created.todo_id).await.unwrap();
        assert_eq!(fetched, input.into_todo(created.todo_id));
    }

    #[tokio::test]
    async fn create_rejects_invalid_candidate_without_mutation() {
        let store = seeded();
        let result = store.create(candidate("x")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.len().await, 5);
        // failed create does not burn an id
        assert_eq!(store.create(candidate("Gym")).await.unwrap().todo_id, 6);
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let store = seeded();
        assert_eq!(store.list(None).await.len(), 5);
        assert_eq!(store.list(Some(2)).await.len(), 2);
        assert_eq!(store.list(Some(50)).await.len(), 5);
        assert!(store.list(Some(0)).await.is_empty());
        let ids: Vec<_> = store.list(Some(3)).await.iter().map(|t| t.todo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn update_preserves_omitted_fields() {
        let store = seeded();
        let before = store.get(1).await.unwrap();
        let patch = TodoPatch {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let after = store.update(1, patch).await.unwrap();
        assert_eq!(after, Todo { priority: Priority::High, ..before });
        assert_eq!(store.get(1).await.unwrap(), after);
    }

    #[tokio::test]
    async fn failed_update_leaves_record_untouched() {
        let store = seeded();
        let before = store.get(2).await.unwrap();
        let patch = TodoPatch {
            todo_name: Some("Reading".into()),
            username: Some("S".into()),
            ..Default::default()
        };
        let result = store.update(2, patch).await;
        match result {
            Err(StoreError::Validation(errors)) => assert!(errors.get("username").is_some()),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.get(2).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_keeps_order() {
        let store = seeded();
        let removed = store.delete(3).await.unwrap();
        assert_eq!(removed.todo_id, 3);
        assert_eq!(store.len().await, 4);
        assert!(matches!(store.get(3).await, Err(StoreError::NotFound { id: 3 })));
        let ids: Vec<_> = store.list(None).await.iter().map(|t| t.todo_id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn missing_id_is_not_found_everywhere() {
        let store = seeded();
        let before = store.list(None).await;

        assert!(matches!(store.get(99).await, Err(StoreError::NotFound { id: 99 })));
        assert!(matches!(
            store.update(99, TodoPatch::default()).await,
            Err(StoreError::NotFound { id: 99 })
        ));
        assert!(matches!(store.delete(99).await, Err(StoreError::NotFound { id: 99 })));

        assert_eq!(store.list(None).await, before);
    }

    #[test]
    fn with_todos_rejects_duplicate_ids() {
        let mut todos = seed_todos();
        let dup = todos[0].clone();
        todos.push(dup);
        assert!(matches!(TodoStore::with_todos(todos), Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn id_floor_and_reservations_advance_the_sequence() {
        let store = seeded().with_id_floor(40);
        assert_eq!(store.reserve_id().await, 41);
        assert_eq!(store.create(candidate("Gym")).await.unwrap().todo_id, 42);
        assert_eq!(store.len().await, 6);

        // a floor below the current mark changes nothing
        let store = seeded().with_id_floor(2);
        assert_eq!(store.create(candidate("Gym")).await.unwrap().todo_id, 6);
    }

    #[tokio::test]
    async fn mutations_are_published_in_commit_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = seeded().publish_to(tx);

        let created = store.create(candidate("Gym")).await.unwrap();
        store
            .update(created.todo_id, TodoPatch { priority: Some(Priority::High), ..Default::default() })
            .await
            .unwrap();
        store.update(created.todo_id, TodoPatch::default()).await.unwrap();
        assert!(store.create(candidate("x")).await.is_err());
        store.delete(created.todo_id).await.unwrap();
        drop(store);

        let mut seen = Vec::new();
        while let Some(change) = rx.recv().await {
            seen.push((change.operation, change.todo.todo_id, change.todo.priority));
        }
        assert_eq!(
            seen,
            vec![
                (Operation::Create, 6, Priority::Low),
                (Operation::Update, 6, Priority::High),
                (Operation::Delete, 6, Priority::High),
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = std::sync::Arc::new(seeded());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(candidate(&format!("Task {}", i))).await.unwrap().todo_id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);
        assert_eq!(store.len().await, 21);
    }
}
