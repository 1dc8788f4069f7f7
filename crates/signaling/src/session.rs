//! SessionManager – Besitzer aller Sitzungstabellen
//!
//! Registry, Text-Raum-Zugehoerigkeit und Voice-Praesenz liegen hinter
//! EINEM Mutex. Jede Operation, die mehrere Tabellen beruehrt (vor allem
//! das Trennen), ist dadurch atomar.
//!
//! ## Reihenfolge
//! Die ausgehenden Ereignisse einer Mutation werden eingereiht, solange
//! der Lock gehalten wird. Damit erreichen Roster-Snapshots jede Verbindung
//! in Mutationsreihenfolge. Einreihen blockiert nie (`try_send`).
//!
//! ## Langsame Verbindungen
//! Laeuft eine Send-Queue voll, entfernt der Broadcaster die Verbindung.
//! Nach jeder Mutation (Lock freigegeben) traegt `verdraengte_bereinigen`
//! solche Verbindungen wie bei einem normalen Trennen aus allen Tabellen
//! aus, die Verbleibenden erhalten `peerLeftVoice` und neue Roster.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use treffpunkt_core::{ChannelId, ConnectionId};
use treffpunkt_protocol::{ServerEvent, VoiceMember};

use crate::broadcast::EventBroadcaster;
use crate::registry::ConnectionRegistry;
use crate::rooms::RoomMembership;
use crate::voice::{VoiceAustritt, VoicePresenceTracker};

/// Alle Tabellen, gemeinsam gesperrt
#[derive(Debug, Default)]
struct SessionTabellen {
    registry: ConnectionRegistry,
    raeume: RoomMembership,
    voice: VoicePresenceTracker,
}

/// Momentaufnahme fuer Statistik und Metriken
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SessionStatistik {
    pub verbindungen: usize,
    pub angemeldet: usize,
    pub text_raeume: usize,
    pub voice_raeume: usize,
    pub voice_teilnehmer: usize,
}

/// Zentrale Session-Verwaltung
pub struct SessionManager {
    tabellen: Mutex<SessionTabellen>,
    broadcaster: EventBroadcaster,
    /// Beitritt zu einem Voice-Kanal verlaesst alle anderen
    exklusive_voice: bool,
}

impl SessionManager {
    pub fn neu(broadcaster: EventBroadcaster, exklusive_voice: bool) -> Self {
        Self {
            tabellen: Mutex::new(SessionTabellen::default()),
            broadcaster,
            exklusive_voice,
        }
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    // -----------------------------------------------------------------------
    // Verbindungs-Lebenszyklus
    // -----------------------------------------------------------------------

    /// Registriert eine neue Verbindung und meldet ihr die eigene Adresse
    pub fn verbindung_oeffnen(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let rx = self.broadcaster.verbindung_registrieren(connection_id);
        self.broadcaster
            .an_verbindung_senden(&connection_id, ServerEvent::Connected { connection_id });
        rx
    }

    /// Entfernt die Verbindung aus allen Tabellen
    ///
    /// Reihenfolge: Send-Queue zuerst abmelden, dann Registry (mit
    /// Roster-Broadcast falls gebunden), Text-Raum und alle Voice-Kanaele
    /// (jeweils Peer-Left + Roster an die Verbleibenden). Mehrfaches Trennen
    /// derselben Verbindung ist ein No-op.
    pub fn trennen(&self, connection_id: &ConnectionId) -> Vec<ChannelId> {
        let kanaele = self.austragen(connection_id);
        self.verdraengte_bereinigen();
        kanaele
    }

    /// Traegt alle vom Broadcaster verdraengten Verbindungen aus
    ///
    /// Das Austragen kann weitere Verbindungen verdraengen, daher bis zur
    /// leeren Liste. Gibt die Anzahl ausgetragener Verbindungen zurueck.
    pub fn verdraengte_bereinigen(&self) -> usize {
        let mut anzahl = 0;
        loop {
            let verdraengt = self.broadcaster.verdraengte_abholen();
            if verdraengt.is_empty() {
                return anzahl;
            }
            for connection_id in verdraengt {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Langsame Verbindung verdraengt – wird ausgetragen"
                );
                self.austragen(&connection_id);
                anzahl += 1;
            }
        }
    }

    fn austragen(&self, connection_id: &ConnectionId) -> Vec<ChannelId> {
        self.broadcaster.verbindung_entfernen(connection_id);

        let mut tabellen = self.tabellen.lock();

        if let Some(identitaeten) = tabellen.registry.loesen(connection_id) {
            self.broadcaster
                .an_alle_senden(&ServerEvent::RosterUpdated(identitaeten));
        }

        tabellen.raeume.verlassen(connection_id);

        let austritte = tabellen.voice.alle_verlassen(connection_id);
        for austritt in &austritte {
            self.austritt_verteilen(connection_id, austritt);
        }

        tracing::debug!(
            connection_id = %connection_id,
            voice_kanaele = austritte.len(),
            "Verbindung aus allen Tabellen entfernt"
        );

        austritte.into_iter().map(|a| a.channel_id).collect()
    }

    // -----------------------------------------------------------------------
    // Connection Registry
    // -----------------------------------------------------------------------

    /// Bindet eine Identitaet und verteilt das vollstaendige Roster an alle
    pub fn anmelden(&self, connection_id: ConnectionId, identitaet: impl Into<String>) -> Vec<String> {
        let identitaeten = {
            let mut tabellen = self.tabellen.lock();
            let identitaeten = tabellen.registry.binden(connection_id, identitaet);
            self.broadcaster
                .an_alle_senden(&ServerEvent::RosterUpdated(identitaeten.clone()));
            identitaeten
        };
        self.verdraengte_bereinigen();
        identitaeten
    }

    pub fn identitaet(&self, connection_id: &ConnectionId) -> Option<String> {
        self.tabellen
            .lock()
            .registry
            .identitaet(connection_id)
            .map(str::to_string)
    }

    pub fn identitaeten(&self) -> Vec<String> {
        self.tabellen.lock().registry.identitaeten()
    }

    // -----------------------------------------------------------------------
    // Text-Raeume
    // -----------------------------------------------------------------------

    /// Wechselt die Verbindung in einen Text-Raum
    ///
    /// Gibt den verlassenen Raum zurueck. Die History liefert der Aufrufer.
    pub fn text_raum_betreten(&self, connection_id: ConnectionId, raum: ChannelId) -> Option<ChannelId> {
        self.tabellen.lock().raeume.betreten(connection_id, raum)
    }

    pub fn text_raum_von(&self, connection_id: &ConnectionId) -> Option<ChannelId> {
        self.tabellen.lock().raeume.raum_von(connection_id).cloned()
    }

    pub fn raum_mitglieder(&self, raum: &ChannelId) -> Vec<ConnectionId> {
        self.tabellen.lock().raeume.mitglieder(raum).to_vec()
    }

    /// Sendet ein Ereignis an alle Verbindungen eines Text-Raums
    pub fn an_raum_senden(&self, raum: &ChannelId, ereignis: ServerEvent) -> usize {
        let gesendet = {
            let tabellen = self.tabellen.lock();
            self.broadcaster
                .an_verbindungen_senden(tabellen.raeume.mitglieder(raum), &ereignis)
        };
        self.verdraengte_bereinigen();
        gesendet
    }

    // -----------------------------------------------------------------------
    // Voice-Praesenz
    // -----------------------------------------------------------------------

    /// Tritt einem Voice-Kanal bei
    ///
    /// Bisherige Teilnehmer erhalten zuerst `peerJoinedVoice`, danach alle
    /// (inklusive des Beitretenden) das vollstaendige Roster. Bei einem
    /// erneuten Beitritt derselben Verbindung entfaellt das Punkt-Ereignis.
    pub fn voice_beitreten(
        &self,
        connection_id: ConnectionId,
        channel_id: &ChannelId,
        anzeigename: impl Into<String>,
    ) -> Vec<VoiceMember> {
        let roster = self.voice_beitreten_gesperrt(connection_id, channel_id, anzeigename.into());
        self.verdraengte_bereinigen();
        roster
    }

    fn voice_beitreten_gesperrt(
        &self,
        connection_id: ConnectionId,
        channel_id: &ChannelId,
        anzeigename: String,
    ) -> Vec<VoiceMember> {
        let mut tabellen = self.tabellen.lock();

        if self.exklusive_voice {
            let andere: Vec<ChannelId> = tabellen
                .voice
                .kanaele_von(&connection_id)
                .into_iter()
                .filter(|k| k != channel_id)
                .collect();
            for kanal in andere {
                if let Some(austritt) = tabellen.voice.verlassen(&connection_id, &kanal) {
                    self.austritt_verteilen(&connection_id, &austritt);
                }
            }
        }

        let beitritt = tabellen
            .voice
            .beitreten(connection_id, channel_id, anzeigename.clone());

        if beitritt.neu {
            self.broadcaster.an_verbindungen_senden(
                &beitritt.bisherige,
                &ServerEvent::PeerJoinedVoice {
                    connection_id,
                    display_name: anzeigename,
                },
            );
        }

        let roster_ereignis = ServerEvent::VoiceRosterUpdated {
            channel_id: channel_id.clone(),
            members: beitritt.roster.clone(),
        };
        self.broadcaster.an_verbindungen_senden(
            beitritt.roster.iter().map(|m| &m.connection_id),
            &roster_ereignis,
        );

        beitritt.roster
    }

    /// Verlaesst einen Voice-Kanal
    ///
    /// Gibt `false` zurueck (ohne Ereignisse) wenn die Verbindung dort nicht
    /// Teilnehmer war.
    pub fn voice_verlassen(&self, connection_id: &ConnectionId, channel_id: &ChannelId) -> bool {
        let verlassen = {
            let mut tabellen = self.tabellen.lock();
            match tabellen.voice.verlassen(connection_id, channel_id) {
                Some(austritt) => {
                    self.austritt_verteilen(connection_id, &austritt);
                    true
                }
                None => false,
            }
        };
        self.verdraengte_bereinigen();
        verlassen
    }

    pub fn voice_roster(&self, channel_id: &ChannelId) -> Vec<VoiceMember> {
        self.tabellen.lock().voice.roster(channel_id)
    }

    pub fn voice_kanaele_von(&self, connection_id: &ConnectionId) -> Vec<ChannelId> {
        self.tabellen.lock().voice.kanaele_von(connection_id)
    }

    /// Peer-Left und Roster an die verbleibenden Teilnehmer (Lock gehalten)
    fn austritt_verteilen(&self, connection_id: &ConnectionId, austritt: &VoiceAustritt) {
        if austritt.roster.is_empty() {
            return;
        }
        self.broadcaster.an_verbindungen_senden(
            austritt.verbleibende(),
            &ServerEvent::PeerLeftVoice {
                connection_id: *connection_id,
            },
        );
        self.broadcaster.an_verbindungen_senden(
            austritt.verbleibende(),
            &ServerEvent::VoiceRosterUpdated {
                channel_id: austritt.channel_id.clone(),
                members: austritt.roster.clone(),
            },
        );
    }

    // -----------------------------------------------------------------------
    // Direkte Zustellung
    // -----------------------------------------------------------------------

    /// Sendet an die private Adresse einer Verbindung
    pub fn an_verbindung_senden(&self, connection_id: &ConnectionId, ereignis: ServerEvent) -> bool {
        let zugestellt = self.broadcaster.an_verbindung_senden(connection_id, ereignis);
        self.verdraengte_bereinigen();
        zugestellt
    }

    /// Sendet an alle offenen Verbindungen
    pub fn an_alle_senden(&self, ereignis: &ServerEvent) -> usize {
        let gesendet = self.broadcaster.an_alle_senden(ereignis);
        self.verdraengte_bereinigen();
        gesendet
    }

    // -----------------------------------------------------------------------
    // Statistik
    // -----------------------------------------------------------------------

    pub fn statistik(&self) -> SessionStatistik {
        let tabellen = self.tabellen.lock();
        SessionStatistik {
            verbindungen: self.broadcaster.verbindungs_anzahl(),
            angemeldet: tabellen.registry.anzahl(),
            text_raeume: tabellen.raeume.raum_anzahl(),
            voice_raeume: tabellen.voice.kanal_anzahl(),
            voice_teilnehmer: tabellen.voice.teilnehmer_anzahl(),
        }
    }

    pub fn verbindungs_anzahl(&self) -> usize {
        self.broadcaster.verbindungs_anzahl()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
