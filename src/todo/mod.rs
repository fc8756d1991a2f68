pub mod model;
pub mod seed;
pub mod store;
pub mod validate;

pub use model::{Priority, Todo, TodoCreate, TodoPatch};
pub use store::{Change, ChangeReceiver, ChangeSender, StoreError, TodoStore};
pub use validate::ValidationErrors;
