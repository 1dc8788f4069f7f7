//! Room Membership – Text-Raum-Zugehoerigkeit pro Verbindung
//!
//! Eine Verbindung ist hoechstens in einem Text-Raum. Die private Adresse
//! (die ConnectionId selbst) ist kein Raum und bleibt immer erreichbar.

use std::collections::HashMap;

use treffpunkt_core::{ChannelId, ConnectionId};

/// Zuordnung Verbindung <-> Text-Raum
#[derive(Debug, Default)]
pub struct RoomMembership {
    raum_von: HashMap<ConnectionId, ChannelId>,
    /// Mitglieder pro Raum in Beitrittsreihenfolge
    mitglieder: HashMap<ChannelId, Vec<ConnectionId>>,
}

impl RoomMembership {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Wechselt die Verbindung in `raum`
    ///
    /// Verlaesst vorher den bisherigen Raum und gibt ihn zurueck.
    pub fn betreten(&mut self, connection_id: ConnectionId, raum: ChannelId) -> Option<ChannelId> {
        let bisher = self.verlassen(&connection_id);
        self.mitglieder
            .entry(raum.clone())
            .or_default()
            .push(connection_id);
        self.raum_von.insert(connection_id, raum);
        bisher
    }

    /// Entfernt die Verbindung aus ihrem Raum
    pub fn verlassen(&mut self, connection_id: &ConnectionId) -> Option<ChannelId> {
        let raum = self.raum_von.remove(connection_id)?;
        if let Some(liste) = self.mitglieder.get_mut(&raum) {
            liste.retain(|id| id != connection_id);
            if liste.is_empty() {
                self.mitglieder.remove(&raum);
            }
        }
        Some(raum)
    }

    /// Aktueller Raum einer Verbindung
    pub fn raum_von(&self, connection_id: &ConnectionId) -> Option<&ChannelId> {
        self.raum_von.get(connection_id)
    }

    /// Alle Verbindungen in einem Raum
    pub fn mitglieder(&self, raum: &ChannelId) -> &[ConnectionId] {
        self.mitglieder.get(raum).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Anzahl Raeume mit mindestens einem Mitglied
    pub fn raum_anzahl(&self) -> usize {
        self.mitglieder.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raumwechsel_verlaesst_alten_raum() {
        let mut raeume = RoomMembership::neu();
        let c = ConnectionId::new();

        assert_eq!(raeume.betreten(c, ChannelId::neu("r1")), None);
        assert_eq!(raeume.betreten(c, ChannelId::neu("r2")), Some(ChannelId::neu("r1")));

        assert_eq!(raeume.raum_von(&c), Some(&ChannelId::neu("r2")));
        assert!(raeume.mitglieder(&ChannelId::neu("r1")).is_empty());
        assert_eq!(raeume.mitglieder(&ChannelId::neu("r2")), &[c]);
        assert_eq!(raeume.raum_anzahl(), 1);
    }

    #[test]
    fn gleichen_raum_erneut_betreten() {
        let mut raeume = RoomMembership::neu();
        let c = ConnectionId::new();
        raeume.betreten(c, ChannelId::neu("r1"));
        raeume.betreten(c, ChannelId::neu("r1"));
        assert_eq!(raeume.mitglieder(&ChannelId::neu("r1")), &[c]);
    }

    #[test]
    fn verlassen_ohne_raum() {
        let mut raeume = RoomMembership::neu();
        assert_eq!(raeume.verlassen(&ConnectionId::new()), None);
    }

    #[test]
    fn mitglieder_mehrerer_verbindungen() {
        let mut raeume = RoomMembership::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        raeume.betreten(a, ChannelId::neu("general"));
        raeume.betreten(b, ChannelId::neu("general"));
        assert_eq!(raeume.mitglieder(&ChannelId::neu("general")), &[a, b]);

        raeume.verlassen(&a);
        assert_eq!(raeume.mitglieder(&ChannelId::neu("general")), &[b]);
    }
}
