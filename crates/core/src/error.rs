//! Fehlertypen fuer Treffpunkt
//!
//! Gemeinsamer Fehler-Enum an der Grenze zur Admin-Schnittstelle.
//! Untermodule definieren eigene Fehler und konvertieren per `From`:
//! ungueltige Eingaben werden abgelehnt, voruebergehende Speicherausfaelle
//! sind `Speicher`, alles andere ist `Intern`.

use thiserror::Error;

/// Alle Fehler, die eine Anfrage an den Aufrufer zurueckmelden kann
#[derive(Debug, Error)]
pub enum TreffpunktError {
    // --- Eingabe ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    // --- Speicher ---
    /// Speicher voruebergehend nicht erreichbar (Pool, IO)
    #[error("Speicherfehler: {0}")]
    Speicher(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl TreffpunktError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}
