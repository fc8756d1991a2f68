pub mod storage;

pub use storage::{upload_name, validate_name, FileError, FileStore, FileWriter, StoredFile};
