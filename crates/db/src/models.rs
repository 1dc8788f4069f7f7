//! Datenbankmodelle fuer persistierte Nachrichten

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use treffpunkt_core::ChannelId;
use uuid::Uuid;

/// Eine gespeicherte Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NachrichtRecord {
    pub id: Uuid,
    pub channel_id: ChannelId,
    pub body: Option<String>,
    pub image: Option<String>,
    pub sender: Option<String>,
    /// Avatar-Snapshot zum Sendezeitpunkt (per Backfill aktualisierbar)
    pub avatar: Option<String>,
    /// Vom Client formatierte Anzeige-Uhrzeit
    pub display_time: Option<String>,
    /// Unbekannte Felder der Original-Nutzlast
    pub extra: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Daten fuer eine neue Nachricht
#[derive(Debug, Clone, Default)]
pub struct NeueNachricht {
    pub channel_id: ChannelId,
    pub body: Option<String>,
    pub image: Option<String>,
    pub sender: Option<String>,
    pub avatar: Option<String>,
    pub display_time: Option<String>,
    pub extra: Map<String, Value>,
}

impl NeueNachricht {
    /// Reine Textnachricht ohne Zusatzfelder
    pub fn text(channel_id: impl Into<ChannelId>, body: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            body: Some(body.into()),
            ..Default::default()
        }
    }
}
