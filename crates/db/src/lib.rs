//! treffpunkt-db – Nachrichten-Speicher
//!
//! Dieses Crate stellt das Repository-Pattern fuer persistierte
//! Chat-Nachrichten bereit. Die Session-Schicht kennt nur das
//! `MessageRepository`-Trait, die SQLite-Implementierung liegt in
//! `sqlite`.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use models::{NachrichtRecord, NeueNachricht};
pub use repository::{DatabaseConfig, DbResult, MessageRepository};
pub use sqlite::SqliteDb;
