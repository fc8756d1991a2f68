pub mod gateway;
pub mod manager;
pub mod models;
pub mod repository;
pub mod service;

pub use gateway::{spawn_writer, GatewayBox, NoopGateway, PersistenceGateway, SqlGateway};
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::TodoRepository;
