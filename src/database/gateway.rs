use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::database::manager::DatabaseError;
use crate::database::repository::TodoRepository;
use crate::todo::{Change, ChangeReceiver, Todo};
use crate::types::{Operation, TodoId};

/// External sink that committed store mutations are mirrored into.
///
/// The store stays the source of truth for the process lifetime; the gateway
/// is written after the in-memory change and its failures never undo it.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Gateway name for logging
    fn name(&self) -> &'static str;

    async fn insert(&self, todo: &Todo) -> Result<(), DatabaseError>;

    async fn upsert(&self, todo: &Todo) -> Result<(), DatabaseError>;

    async fn remove(&self, id: TodoId) -> Result<(), DatabaseError>;
}

pub type GatewayBox = Arc<dyn PersistenceGateway>;

/// Mirrors into the SQLite `todos` table
pub struct SqlGateway {
    repository: TodoRepository,
}

impl SqlGateway {
    pub fn new(repository: TodoRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl PersistenceGateway for SqlGateway {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, todo: &Todo) -> Result<(), DatabaseError> {
        self.repository.insert(todo).await
    }

    async fn upsert(&self, todo: &Todo) -> Result<(), DatabaseError> {
        self.repository.upsert(todo).await
    }

    async fn remove(&self, id: TodoId) -> Result<(), DatabaseError> {
        self.repository.delete(id).await
    }
}

/// Used when no database is configured
pub struct NoopGateway;

#[async_trait]
impl PersistenceGateway for NoopGateway {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn insert(&self, _todo: &Todo) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn upsert(&self, _todo: &Todo) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn remove(&self, _id: TodoId) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Start the single task that replays store changes into `gateway`.
///
/// Changes are applied one at a time in channel order. Failures are logged
/// and skipped. The task ends once every sender has been dropped and the
/// queue is drained.
pub fn spawn_writer(gateway: GatewayBox, mut changes: ChangeReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            apply(gateway.as_ref(), &change).await;
        }
        debug!(gateway = gateway.name(), "mirror writer stopped");
    })
}

async fn apply(gateway: &dyn PersistenceGateway, change: &Change) {
    let Change { operation, todo } = change;
    let result = match operation {
        Operation::Create => gateway.insert(todo).await,
        Operation::Update => gateway.upsert(todo).await,
        Operation::Delete => gateway.remove(todo.todo_id).await,
    };

    match result {
        Ok(()) => debug!(gateway = gateway.name(), %operation, todo_id = todo.todo_id, "mirrored todo"),
        Err(e) => warn!(
            gateway = gateway.name(),
            %operation,
            todo_id = todo.todo_id,
            error = %e,
            "mirror write failed; in-memory state kept"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::DatabaseManager;
    use crate::todo::seed::seed_todos;
    use crate::todo::{Priority, TodoCreate, TodoStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct FailingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PersistenceGateway for FailingGateway {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn insert(&self, _todo: &Todo) -> Result<(), DatabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DatabaseError::NotConfigured)
        }

        async fn upsert(&self, _todo: &Todo) -> Result<(), DatabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DatabaseError::NotConfigured)
        }

        async fn remove(&self, _id: TodoId) -> Result<(), DatabaseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DatabaseError::NotConfigured)
        }
    }

    fn change(operation: Operation, todo: &Todo) -> Change {
        Change {
            operation,
            todo: todo.clone(),
        }
    }

    #[tokio::test]
    async fn sql_gateway_follows_each_operation() {
        let db = DatabaseManager::connect("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        let repository = TodoRepository::new(db.pool().clone());
        let gateway: GatewayBox = Arc::new(SqlGateway::new(repository.clone()));

        let mut todo = seed_todos().remove(0);
        apply(gateway.as_ref(), &change(Operation::Create, &todo)).await;
        assert_eq!(repository.load_all().await.unwrap(), vec![todo.clone()]);

        todo.priority = Priority::High;
        apply(gateway.as_ref(), &change(Operation::Update, &todo)).await;
        assert_eq!(repository.load_all().await.unwrap()[0].priority, Priority::High);

        apply(gateway.as_ref(), &change(Operation::Delete, &todo)).await;
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn writer_skips_failures_and_drains_queue() {
        let gateway = Arc::new(FailingGateway {
            calls: AtomicUsize::new(0),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = spawn_writer(gateway.clone(), rx);

        let todo = seed_todos().remove(0);
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            tx.send(change(op, &todo)).unwrap();
        }
        drop(tx);

        // task completes normally even though every write failed
        writer.await.unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deletes_never_overtake_their_creates() {
        let path = std::env::temp_dir().join(format!("todo-mirror-{}.db", uuid::Uuid::new_v4().simple()));
        let db = DatabaseManager::connect(&format!("sqlite://{}", path.display()), 5)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        let repository = TodoRepository::new(db.pool().clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = spawn_writer(Arc::new(SqlGateway::new(repository.clone())), rx);
        let store = TodoStore::new().publish_to(tx);

        for i in 0..300 {
            let candidate = TodoCreate {
                todo_name: format!("Task {}", i),
                todo_description: "Pump".into(),
                priority: Priority::Low,
                username: "Soslan".into(),
                user_email: None,
            };
            let todo = store.create(candidate).await.unwrap();
            store.delete(todo.todo_id).await.unwrap();
        }
        drop(store);
        writer.await.unwrap();

        assert_eq!(repository.count().await.unwrap(), 0);
        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn noop_gateway_accepts_everything() {
        let todo = seed_todos().remove(0);
        assert!(NoopGateway.insert(&todo).await.is_ok());
        assert!(NoopGateway.upsert(&todo).await.is_ok());
        assert!(NoopGateway.remove(todo.todo_id).await.is_ok());
    }
}
