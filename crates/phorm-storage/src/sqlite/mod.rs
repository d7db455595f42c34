//! SQLite backend.

pub mod dependencies;
pub mod forms;
pub mod schema;
pub mod store;
pub mod submissions;

pub use store::SqliteStore;
