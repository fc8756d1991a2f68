use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub todos: TodoConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub files: FileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL. The write-through mirror is disabled when unset.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Populate the in-memory store from the `todos` table instead of the seed data.
    pub load_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoConfig {
    pub seed_on_start: bool,
    /// Treat `first_n=0` as "no cap", matching the original API.
    pub legacy_zero_first_n: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub upload_dir: PathBuf,
    pub stream_chunk_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("TODO_API_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_LOAD_ON_START") {
            self.database.load_on_start = v.parse().unwrap_or(self.database.load_on_start);
        }

        // Todo overrides
        if let Ok(v) = env::var("TODOS_SEED_ON_START") {
            self.todos.seed_on_start = v.parse().unwrap_or(self.todos.seed_on_start);
        }
        if let Ok(v) = env::var("TODOS_LEGACY_ZERO_FIRST_N") {
            self.todos.legacy_zero_first_n = v.parse().unwrap_or(self.todos.legacy_zero_first_n);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }

        // File overrides
        if let Ok(v) = env::var("FILES_UPLOAD_DIR") {
            self.files.upload_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("FILES_STREAM_CHUNK_BYTES") {
            self.files.stream_chunk_bytes = v.parse().unwrap_or(self.files.stream_chunk_bytes);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                load_on_start: false,
            },
            todos: TodoConfig {
                seed_on_start: true,
                legacy_zero_first_n: false,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                min_password_length: 8,
            },
            files: FileConfig {
                upload_dir: PathBuf::from("uploads"),
                stream_chunk_bytes: 64 * 1024,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: Some("sqlite://todos.db?mode=rwc".to_string()),
                max_connections: 10,
                load_on_start: true,
            },
            todos: TodoConfig {
                seed_on_start: true,
                legacy_zero_first_n: false,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                min_password_length: 10,
            },
            files: FileConfig {
                upload_dir: PathBuf::from("uploads"),
                stream_chunk_bytes: 64 * 1024,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: Some("sqlite://todos.db?mode=rwc".to_string()),
                max_connections: 20,
                load_on_start: true,
            },
            todos: TodoConfig {
                seed_on_start: false,
                legacy_zero_first_n: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: false,
                min_password_length: 12,
            },
            files: FileConfig {
                upload_dir: PathBuf::from("/var/lib/todo-api/uploads"),
                stream_chunk_bytes: 256 * 1024,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.url.is_none());
        assert!(config.todos.seed_on_start);
        assert!(!config.todos.legacy_zero_first_n);
        assert_eq!(config.security.min_password_length, 8);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.database.url.is_some());
        assert!(config.database.load_on_start);
        assert!(!config.todos.seed_on_start);
        assert!(!config.security.enable_cors);
    }
}
