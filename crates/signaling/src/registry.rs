//! Connection Registry – Verbindung -> gebundene Identitaet
//!
//! Eintraege leben nur so lange wie die Verbindung. Die Reihenfolge ist
//! die Reihenfolge der ersten Bindung; eine erneute Bindung ueberschreibt
//! die Identitaet an derselben Position.

use treffpunkt_core::ConnectionId;

/// Tabelle der gebundenen Identitaeten
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    eintraege: Vec<(ConnectionId, String)>,
}

impl ConnectionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Bindet eine Identitaet an eine Verbindung
    ///
    /// Gibt die vollstaendige aktuelle Identitaetsliste zurueck.
    pub fn binden(&mut self, connection_id: ConnectionId, identitaet: impl Into<String>) -> Vec<String> {
        let identitaet = identitaet.into();
        match self.eintraege.iter_mut().find(|(id, _)| *id == connection_id) {
            Some((_, vorhanden)) => *vorhanden = identitaet,
            None => self.eintraege.push((connection_id, identitaet)),
        }
        self.identitaeten()
    }

    /// Loest die Bindung einer Verbindung
    ///
    /// Gibt `None` zurueck wenn die Verbindung nie gebunden war, sonst die
    /// aktualisierte Identitaetsliste.
    pub fn loesen(&mut self, connection_id: &ConnectionId) -> Option<Vec<String>> {
        let pos = self.eintraege.iter().position(|(id, _)| id == connection_id)?;
        self.eintraege.remove(pos);
        Some(self.identitaeten())
    }

    /// Gebundene Identitaet einer Verbindung
    pub fn identitaet(&self, connection_id: &ConnectionId) -> Option<&str> {
        self.eintraege
            .iter()
            .find(|(id, _)| id == connection_id)
            .map(|(_, name)| name.as_str())
    }

    /// Alle gebundenen Identitaeten in Bindungsreihenfolge
    pub fn identitaeten(&self) -> Vec<String> {
        self.eintraege.iter().map(|(_, name)| name.clone()).collect()
    }

    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binden_liefert_vollstaendige_liste() {
        let mut registry = ConnectionRegistry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        assert_eq!(registry.binden(a, "alice"), vec!["alice"]);
        assert_eq!(registry.binden(b, "bob"), vec!["alice", "bob"]);
        assert_eq!(registry.identitaet(&b), Some("bob"));
    }

    #[test]
    fn erneutes_binden_ueberschreibt_an_gleicher_stelle() {
        let mut registry = ConnectionRegistry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        registry.binden(a, "alice");
        registry.binden(b, "bob");
        let liste = registry.binden(a, "alice2");

        assert_eq!(liste, vec!["alice2", "bob"]);
        assert_eq!(registry.anzahl(), 2);
    }

    #[test]
    fn gleiche_identitaet_auf_zwei_verbindungen() {
        let mut registry = ConnectionRegistry::neu();
        registry.binden(ConnectionId::new(), "alice");
        let liste = registry.binden(ConnectionId::new(), "alice");
        assert_eq!(liste, vec!["alice", "alice"]);
    }

    #[test]
    fn loesen() {
        let mut registry = ConnectionRegistry::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.binden(a, "alice");
        registry.binden(b, "bob");

        assert_eq!(registry.loesen(&a), Some(vec!["bob".to_string()]));
        assert!(registry.identitaet(&a).is_none());
        assert_eq!(registry.loesen(&a), None, "zweites Loesen ist wirkungslos");
    }
}
