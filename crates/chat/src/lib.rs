//! treffpunkt-chat – Nachrichten-Persistenz und History
//!
//! Dieses Crate implementiert den `ChatService`, der zwischen den
//! Wire-Nutzlasten der Session-Schicht und dem `MessageRepository`
//! vermittelt:
//! - Nachricht persistieren (inklusive unbekannter Zusatzfelder)
//! - History eines Raums laden (neueste N, aelteste zuerst)
//! - Kanal leeren und Avatar nachtragen fuer die CRUD-Schicht
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use treffpunkt_chat::ChatService;
//! use treffpunkt_db::SqliteDb;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!     let chat = ChatService::neu(db, 100);
//! }
//! ```

pub mod error;
pub mod service;
pub mod types;


pub use error::{ChatError, ChatResult};
pub use service::ChatService;
