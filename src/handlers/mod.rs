// handlers/mod.rs - one module per route group
pub mod database;
pub mod files;
pub mod root;
pub mod todos;
pub mod users;
