//! SQLite-Implementierung der Repository-Traits

mod messages;
mod pool;

pub use pool::SqliteDb;
