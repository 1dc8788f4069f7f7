//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Socket, Bind)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Protokollfehler (ungueltiges Frame, unbekanntes Ereignis)
    ///
    /// Betrifft nur das einzelne Frame; die Verbindung laeuft weiter.
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Verbindungslimit erreicht, Upgrade wird mit 503 abgelehnt
    #[error("Server ist voll ({offen}/{max} Verbindungen)")]
    ServerVoll { offen: usize, max: usize },
}

impl SignalingError {
    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = SignalingError::ServerVoll { offen: 2, max: 2 };
        assert_eq!(e.to_string(), "Server ist voll (2/2 Verbindungen)");
        assert_eq!(
            SignalingError::protokoll("kaputtes Frame").to_string(),
            "Protokollfehler: kaputtes Frame"
        );
    }
}
