//! Voice Presence Tracker – Teilnehmerlisten der Voice-Kanaele
//!
//! Pro Voice-Kanal eine geordnete Liste (Beitrittsreihenfolge) von
//! (ConnectionId, Anzeigename). Leere Kanaele werden entfernt. Die
//! Voice-Praesenz ist unabhaengig von der Text-Raum-Zugehoerigkeit.
//!
//! Der Tracker liefert nur Ergebnisse zurueck; wer benachrichtigt wird
//! entscheidet der `SessionManager`.

use std::collections::HashMap;

use treffpunkt_core::{ChannelId, ConnectionId};
use treffpunkt_protocol::VoiceMember;

/// Ergebnis eines Voice-Beitritts
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceBeitritt {
    /// false wenn die Verbindung schon Teilnehmer war (nur Name aktualisiert)
    pub neu: bool,
    /// Teilnehmer vor dem Beitritt (Empfaenger des Peer-Joined-Ereignisses)
    pub bisherige: Vec<ConnectionId>,
    /// Vollstaendiges Roster nach dem Beitritt
    pub roster: Vec<VoiceMember>,
}

/// Ergebnis eines Voice-Austritts
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceAustritt {
    pub channel_id: ChannelId,
    /// Roster nach dem Austritt (leer wenn der Kanal entfernt wurde)
    pub roster: Vec<VoiceMember>,
}

impl VoiceAustritt {
    /// Verbleibende Teilnehmer in Roster-Reihenfolge
    pub fn verbleibende(&self) -> impl Iterator<Item = &ConnectionId> {
        self.roster.iter().map(|m| &m.connection_id)
    }
}

/// Alle aktiven Voice-Kanaele
#[derive(Debug, Default)]
pub struct VoicePresenceTracker {
    kanaele: HashMap<ChannelId, Vec<VoiceMember>>,
}

impl VoicePresenceTracker {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt eine Verbindung einem Voice-Kanal hinzu
    ///
    /// Ist die Verbindung bereits Teilnehmer, wird nur der Anzeigename
    /// aktualisiert; die Position bleibt erhalten.
    pub fn beitreten(
        &mut self,
        connection_id: ConnectionId,
        channel_id: &ChannelId,
        anzeigename: impl Into<String>,
    ) -> VoiceBeitritt {
        let anzeigename = anzeigename.into();
        let liste = self.kanaele.entry(channel_id.clone()).or_default();

        let neu = match liste.iter_mut().find(|m| m.connection_id == connection_id) {
            Some(vorhanden) => {
                vorhanden.display_name = anzeigename;
                false
            }
            None => {
                liste.push(VoiceMember {
                    connection_id,
                    display_name: anzeigename,
                });
                true
            }
        };

        let bisherige = liste
            .iter()
            .map(|m| m.connection_id)
            .filter(|id| *id != connection_id)
            .collect();

        VoiceBeitritt {
            neu,
            bisherige,
            roster: liste.clone(),
        }
    }

    /// Entfernt eine Verbindung aus einem Voice-Kanal
    ///
    /// Gibt `None` zurueck wenn die Verbindung dort nicht Teilnehmer war.
    pub fn verlassen(
        &mut self,
        connection_id: &ConnectionId,
        channel_id: &ChannelId,
    ) -> Option<VoiceAustritt> {
        let liste = self.kanaele.get_mut(channel_id)?;
        let pos = liste.iter().position(|m| m.connection_id == *connection_id)?;
        liste.remove(pos);

        let roster = liste.clone();
        if roster.is_empty() {
            self.kanaele.remove(channel_id);
        }

        Some(VoiceAustritt {
            channel_id: channel_id.clone(),
            roster,
        })
    }

    /// Entfernt eine Verbindung aus allen Voice-Kanaelen
    pub fn alle_verlassen(&mut self, connection_id: &ConnectionId) -> Vec<VoiceAustritt> {
        let mut kanaele = self.kanaele_von(connection_id);
        kanaele.sort();
        kanaele
            .iter()
            .filter_map(|kanal| self.verlassen(connection_id, kanal))
            .collect()
    }

    /// Alle Voice-Kanaele, in denen die Verbindung Teilnehmer ist
    pub fn kanaele_von(&self, connection_id: &ConnectionId) -> Vec<ChannelId> {
        self.kanaele
            .iter()
            .filter(|(_, liste)| liste.iter().any(|m| m.connection_id == *connection_id))
            .map(|(kanal, _)| kanal.clone())
            .collect()
    }

    /// Roster eines Kanals (leer wenn der Kanal nicht aktiv ist)
    pub fn roster(&self, channel_id: &ChannelId) -> Vec<VoiceMember> {
        self.kanaele.get(channel_id).cloned().unwrap_or_default()
    }

    /// Anzahl aktiver Voice-Kanaele
    pub fn kanal_anzahl(&self) -> usize {
        self.kanaele.len()
    }

    /// Anzahl Teilnehmer ueber alle Kanaele
    pub fn teilnehmer_anzahl(&self) -> usize {
        self.kanaele.values().map(Vec::len).sum()
    }
}
