//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Session-Schicht von der konkreten
//! Datenbank-Implementierung. Die Futures sind explizit `Send`, damit sie
//! in WebSocket-Tasks auf der Multi-Thread-Runtime laufen koennen.

use std::future::Future;

use treffpunkt_core::ChannelId;

use crate::error::DbError;
use crate::models::{NachrichtRecord, NeueNachricht};

/// Result-Alias fuer Datenbank-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://treffpunkt.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Speicher fuer Chat-Nachrichten
pub trait MessageRepository: Send + Sync + 'static {
    /// Die neuesten `limit` Nachrichten eines Kanals, aelteste zuerst
    fn find_recent(
        &self,
        channel_id: &ChannelId,
        limit: i64,
    ) -> impl Future<Output = DbResult<Vec<NachrichtRecord>>> + Send;

    /// Speichert eine neue Nachricht
    fn insert(&self, data: NeueNachricht) -> impl Future<Output = DbResult<NachrichtRecord>> + Send;

    /// Loescht alle Nachrichten eines Kanals, gibt die Anzahl zurueck
    fn delete_for_channel(
        &self,
        channel_id: &ChannelId,
    ) -> impl Future<Output = DbResult<u64>> + Send;

    /// Ersetzt den Avatar-Snapshot in allen Nachrichten eines Absenders
    fn backfill_avatar(
        &self,
        sender: &str,
        avatar: &str,
    ) -> impl Future<Output = DbResult<u64>> + Send;
}
