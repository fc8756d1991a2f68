use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{
    spawn_writer, DatabaseError, DatabaseManager, GatewayBox, NoopGateway, SqlGateway, TodoRepository,
};
use crate::files::FileStore;
use crate::services::UserService;
use crate::todo::seed::seed_todos;
use crate::todo::TodoStore;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<TodoStore>,
    pub gateway: GatewayBox,
    pub database: Option<DatabaseManager>,
    pub files: Arc<FileStore>,
    mirror_writer: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AppState {
    /// Connect the optional database, then populate the store from the
    /// table or from the seed data.
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let database = match &config.database.url {
            Some(url) => {
                let db = DatabaseManager::connect(url, config.database.max_connections)
                    .await
                    .with_context(|| format!("failed to connect to {}", url))?;
                db.migrate().await.context("failed to run database migrations")?;
                Some(db)
            }
            None => {
                info!("No DATABASE_URL configured; write-through mirror disabled");
                None
            }
        };

        let repository = database.as_ref().map(|db| TodoRepository::new(db.pool().clone()));

        let mut todos = Vec::new();
        if let (Some(repo), true) = (&repository, config.database.load_on_start) {
            todos = repo.load_all().await.context("failed to load todos from database")?;
            info!("Loaded {} todos from database", todos.len());
        }

        if todos.is_empty() && config.todos.seed_on_start {
            todos = seed_todos();
            if let Some(repo) = &repository {
                for todo in &todos {
                    if let Err(e) = repo.upsert(todo).await {
                        warn!(todo_id = todo.todo_id, error = %e, "failed to mirror seed todo");
                    }
                }
            }
            info!("Seeded store with {} todos", todos.len());
        }

        let mut store = TodoStore::with_todos(todos).context("invalid initial todo set")?;
        if let Some(repo) = &repository {
            // Rows the store did not load still own their ids
            let floor = repo.max_id().await.context("failed to read highest todo id")?;
            store = store.with_id_floor(floor);
        }

        let gateway: GatewayBox = match repository {
            Some(repo) => Arc::new(SqlGateway::new(repo)),
            None => Arc::new(NoopGateway),
        };

        let (changes, queue) = mpsc::unbounded_channel();
        let writer = spawn_writer(gateway.clone(), queue);
        let store = store.publish_to(changes);
        if store.is_empty().await {
            info!("Starting with an empty todo store");
        }

        let files = FileStore::new(config.files.upload_dir.clone(), config.files.stream_chunk_bytes);
        info!("Uploads stored in {}", files.dir().display());

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            gateway,
            database,
            files: Arc::new(files),
            mirror_writer: Arc::new(Mutex::new(Some(writer))),
        })
    }

    /// Handle of the mirror writer task. It finishes once every clone of the
    /// state is dropped and the queued changes are written.
    pub fn take_mirror_writer(&self) -> Option<JoinHandle<()>> {
        self.mirror_writer.lock().ok().and_then(|mut writer| writer.take())
    }

    pub fn database(&self) -> Result<&DatabaseManager, DatabaseError> {
        self.database.as_ref().ok_or(DatabaseError::NotConfigured)
    }

    pub fn users(&self) -> Result<UserService, DatabaseError> {
        let db = self.database()?;
        Ok(UserService::new(
            db.pool().clone(),
            self.config.security.min_password_length,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> AppConfig {
        let mut config = AppConfig::development();
        config.database.url = url.map(str::to_string);
        config
    }

    #[tokio::test]
    async fn seeds_without_database() {
        let state = AppState::initialize(config(None)).await.unwrap();
        assert_eq!(state.store.len().await, 5);
        assert!(state.database().is_err());
        assert_eq!(state.gateway.name(), "noop");
    }

    #[tokio::test]
    async fn seed_is_mirrored_into_empty_database() {
        let mut cfg = config(Some("sqlite::memory:"));
        cfg.database.load_on_start = true;
        let state = AppState::initialize(cfg).await.unwrap();

        let repo = TodoRepository::new(state.database().unwrap().pool().clone());
        assert_eq!(repo.count().await.unwrap(), 5);
        assert_eq!(state.gateway.name(), "sqlite");
    }

    fn temp_db_url() -> String {
        let path = std::env::temp_dir().join(format!("todo-api-{}.db", uuid::Uuid::new_v4().simple()));
        format!("sqlite://{}", path.display())
    }

    async fn prefilled(url: &str, ids: &[i64]) -> Vec<crate::todo::Todo> {
        let db = DatabaseManager::connect(url, 1).await.unwrap();
        db.migrate().await.unwrap();
        let repo = TodoRepository::new(db.pool().clone());
        let mut rows = Vec::new();
        for (todo, id) in seed_todos().into_iter().zip(ids) {
            let todo = crate::todo::Todo { todo_id: *id, ..todo };
            repo.insert(&todo).await.unwrap();
            rows.push(todo);
        }
        db.close().await;
        rows
    }

    fn gym() -> crate::todo::TodoCreate {
        crate::todo::TodoCreate {
            todo_name: "Gym".into(),
            todo_description: "Pump".into(),
            priority: crate::todo::Priority::Low,
            username: "Soslan".into(),
            user_email: None,
        }
    }

    #[tokio::test]
    async fn loads_existing_rows_on_start() {
        let url = temp_db_url();
        let rows = prefilled(&url, &[3, 8]).await;

        let mut cfg = config(Some(&url));
        cfg.database.load_on_start = true;
        let state = AppState::initialize(cfg).await.unwrap();

        assert_eq!(state.store.list(None).await, rows);
        assert_eq!(state.store.create(gym()).await.unwrap().todo_id, 9);
    }

    #[tokio::test]
    async fn new_ids_skip_rows_that_were_not_loaded() {
        let url = temp_db_url();
        prefilled(&url, &[6, 7]).await;

        let mut cfg = config(Some(&url));
        cfg.database.load_on_start = false;
        let state = AppState::initialize(cfg).await.unwrap();

        // seeds 1..=5 in memory, rows 6 and 7 only in the table
        assert_eq!(state.store.len().await, 5);
        assert_eq!(state.store.create(gym()).await.unwrap().todo_id, 8);
    }

    #[tokio::test]
    async fn mirror_writer_drains_when_state_is_dropped() {
        let state = AppState::initialize(config(Some("sqlite::memory:"))).await.unwrap();
        let repo = TodoRepository::new(state.database().unwrap().pool().clone());
        let writer = state.take_mirror_writer().unwrap();
        assert!(state.take_mirror_writer().is_none());

        let created = state.store.create(gym()).await.unwrap();
        drop(state);
        writer.await.unwrap();

        let ids: Vec<_> = repo.load_all().await.unwrap().iter().map(|t| t.todo_id).collect();
        assert!(ids.contains(&created.todo_id));
    }

    #[tokio::test]
    async fn empty_store_when_seeding_disabled() {
        let mut cfg = config(None);
        cfg.todos.seed_on_start = false;
        let state = AppState::initialize(cfg).await.unwrap();
        assert!(state.store.is_empty().await);
    }
}
