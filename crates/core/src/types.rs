//! Gemeinsame Identifikationstypen fuer Treffpunkt
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Auf dem Draht
//! erscheinen sie als nackte Strings (`#[serde(transparent)]`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige ID einer Transport-Verbindung
///
/// Lebt nur so lange wie die Verbindung selbst und dient gleichzeitig als
/// private Zustelladresse (Signaling-Ziel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Kanal-ID (Text- oder Voice-Kanal)
///
/// Die IDs werden von der CRUD-Schicht vergeben und sind fuer den Kern
/// undurchsichtige Strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Erstellt eine ChannelId aus einem beliebigen String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn connection_id_ist_auf_dem_draht_ein_string() {
        let id = ConnectionId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        let zurueck: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, id);
    }

    #[test]
    fn channel_id_transparent() {
        let kanal = ChannelId::neu("general");
        assert_eq!(serde_json::to_string(&kanal).unwrap(), "\"general\"");
        assert_eq!(kanal.als_str(), "general");
        assert_eq!(kanal.to_string(), "channel:general");
    }
}
