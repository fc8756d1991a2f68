pub mod extract;

pub use extract::{ValidJson, ValidPath, ValidQuery};
