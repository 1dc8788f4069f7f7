//! Event-Broadcaster – Send-Queues aller offenen Verbindungen
//!
//! Der EventBroadcaster haelt pro Verbindung eine begrenzte Send-Queue.
//! Der Verbindungs-Task liest aus dieser Queue und schreibt die Ereignisse
//! auf den WebSocket.
//!
//! ## Zustellung
//! - An eine Verbindung: `an_verbindung_senden` (private Adresse)
//! - An eine Liste von Verbindungen: `an_verbindungen_senden`
//! - An alle: `an_alle_senden`
//!
//! Einreihen blockiert nie. Eine volle Queue verdraengt die Verbindung: ihr
//! Sender wird entfernt, die Verbindung landet in der Verdraengt-Liste und
//! der SessionManager traegt sie aus allen Tabellen aus. Punkt-Ereignisse
//! wie `peerJoinedVoice` gehen so nie still verloren. Eine geschlossene
//! Queue wird stillschweigend uebergangen.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use treffpunkt_core::ConnectionId;
use treffpunkt_protocol::ServerEvent;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 256;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

/// Ergebnis eines Einreihversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    Eingereiht,
    /// Queue voll, der Empfaenger liest nicht schnell genug
    Voll,
    /// Empfaenger existiert nicht mehr
    Geschlossen,
}

impl ClientSender {
    /// Reiht ein Ereignis nicht-blockierend ein
    pub fn senden(&self, ereignis: ServerEvent) -> Zustellung {
        match self.tx.try_send(ereignis) {
            Ok(()) => Zustellung::Eingereiht,
            Err(mpsc::error::TrySendError::Full(_)) => Zustellung::Voll,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                Zustellung::Geschlossen
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle offenen Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    clients: DashMap<ConnectionId, ClientSender>,
    queue_groesse: usize,
    /// Wegen voller Queue entfernte Verbindungen, noch nicht ausgetragen
    verdraengt: Mutex<Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster mit Standard-Queuegroesse
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
                verdraengt: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    pub fn verbindung_registrieren(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let sender = ClientSender { connection_id, tx };
        self.inner.clients.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn verbindung_entfernen(&self, connection_id: &ConnectionId) -> bool {
        let entfernt = self.inner.clients.remove(connection_id).is_some();
        if entfernt {
            tracing::debug!(connection_id = %connection_id, "Verbindung aus Broadcaster entfernt");
        }
        entfernt
    }

    /// Sendet ein Ereignis an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung gefunden und das Ereignis
    /// eingereiht wurde. Unbekannte Ziele werden stillschweigend verworfen.
    pub fn an_verbindung_senden(&self, connection_id: &ConnectionId, ereignis: ServerEvent) -> bool {
        // Klon statt Ref: verdraengen() schreibt in dieselbe Map
        let sender = self.inner.clients.get(connection_id).map(|s| s.value().clone());
        match sender {
            Some(sender) => self.zustellen(&sender, ereignis),
            None => {
                tracing::debug!(connection_id = %connection_id, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet ein Ereignis an mehrere Verbindungen
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_verbindungen_senden<'a>(
        &self,
        ziele: impl IntoIterator<Item = &'a ConnectionId>,
        ereignis: &ServerEvent,
    ) -> usize {
        ziele
            .into_iter()
            .filter_map(|id| self.inner.clients.get(id).map(|s| s.value().clone()))
            .filter(|sender| self.zustellen(sender, ereignis.clone()))
            .count()
    }

    /// Sendet ein Ereignis an alle offenen Verbindungen
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, ereignis: &ServerEvent) -> usize {
        let sender: Vec<ClientSender> = self
            .inner
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sender
            .iter()
            .filter(|sender| self.zustellen(sender, ereignis.clone()))
            .count()
    }

    /// Liefert die seit dem letzten Aufruf verdraengten Verbindungen
    pub fn verdraengte_abholen(&self) -> Vec<ConnectionId> {
        std::mem::take(&mut *self.inner.verdraengt.lock())
    }

    fn zustellen(&self, sender: &ClientSender, ereignis: ServerEvent) -> bool {
        match sender.senden(ereignis) {
            Zustellung::Eingereiht => true,
            Zustellung::Voll => {
                self.verdraengen(sender.connection_id);
                false
            }
            Zustellung::Geschlossen => false,
        }
    }

    /// Entfernt eine Verbindung mit voller Queue
    ///
    /// Mit dem Sender faellt auch die Queue weg; der Verbindungs-Task sieht
    /// das Ende der Queue und schliesst den WebSocket.
    fn verdraengen(&self, connection_id: ConnectionId) {
        if self.inner.clients.remove(&connection_id).is_some() {
            tracing::warn!(
                connection_id = %connection_id,
                "Send-Queue voll – Verbindung wird getrennt"
            );
            self.inner.verdraengt.lock().push(connection_id);
        }
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn verbindungs_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.clients.contains_key(connection_id)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
