pub mod todo;
pub mod user;

pub use todo::TodoRow;
pub use user::{UserAccount, UserRow};
