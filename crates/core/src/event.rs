//! Aenderungs-Signal fuer CRUD-Kollaborateure
//!
//! Jede mutierende CRUD-Operation (Registrierung, Freundschaften,
//! Server-/Kanal-/Rollen-Verwaltung) ruft danach `ankuendigen()` auf. Die
//! Session-Schicht verteilt daraufhin ein Ereignis ohne Nutzlast an alle
//! Verbindungen, die ihren Zustand dann separat neu laden.
//!
//! Das Trait liegt im Core-Crate, damit CRUD-Code nicht vom
//! Signaling-Crate abhaengen muss.

/// Schnittstelle zum globalen Aenderungs-Signal
pub trait ChangeAnnouncer: Send + Sync + 'static {
    /// Sendet das Aenderungs-Signal an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der Verbindungen zurueck, bei denen das Signal
    /// eingereiht wurde.
    fn ankuendigen(&self) -> usize;
}

impl<T: ChangeAnnouncer + ?Sized> ChangeAnnouncer for std::sync::Arc<T> {
    fn ankuendigen(&self) -> usize {
        (**self).ankuendigen()
    }
}
