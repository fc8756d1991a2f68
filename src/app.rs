use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the full router over `state`
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(handlers::root::hello))
        .route("/health", get(handlers::root::health))
        .merge(todo_routes())
        .merge(database_routes())
        .merge(user_routes())
        .merge(file_routes())
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    // Global middleware
    let router = if config.security.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn todo_routes() -> Router<AppState> {
    use handlers::todos;

    Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route(
            "/todos/:id",
            get(todos::get).put(todos::update).delete(todos::delete),
        )
}

fn database_routes() -> Router<AppState> {
    use handlers::database;

    Router::new()
        .route("/setup_database", post(database::setup))
        .route("/todo_db", get(database::list).post(database::insert))
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", post(users::register))
        .route("/users/:id", get(users::get))
}

fn file_routes() -> Router<AppState> {
    use handlers::files;

    Router::new()
        .route("/files", post(files::upload))
        .route("/files/batch", post(files::upload_batch))
        .route("/files/:name", get(files::download))
        .route("/files/:name/stream", get(files::stream))
}
