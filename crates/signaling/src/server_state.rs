//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt alle geteilten Services als Arc-Referenzen, die sicher zwischen
//! tokio-Tasks geteilt werden koennen.

use std::sync::Arc;

use treffpunkt_chat::ChatService;
use treffpunkt_db::MessageRepository;
use treffpunkt_observability::TreffpunktMetrics;

use crate::broadcast::{EventBroadcaster, SEND_QUEUE_GROESSE};
use crate::error::{SignalingError, SignalingResult};
use crate::notifier::ChangeNotifier;
use crate::session::SessionManager;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers (nur Logs)
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: u32,
    /// Voice-Beitritt verlaesst alle anderen Voice-Kanaele
    pub exklusive_voice_raeume: bool,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Treffpunkt".to_string(),
            max_verbindungen: 512,
            exklusive_voice_raeume: false,
            send_queue_groesse: SEND_QUEUE_GROESSE,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState<R: MessageRepository> {
    pub config: Arc<SignalingConfig>,
    /// Nachrichten-Persistenz und History
    pub chat_service: Arc<ChatService<R>>,
    /// Registry, Raeume, Voice-Praesenz
    pub sessions: Arc<SessionManager>,
    /// Globales Aenderungs-Signal fuer die CRUD-Schicht
    pub notifier: Arc<ChangeNotifier>,
    pub metriken: TreffpunktMetrics,
}

impl<R: MessageRepository> SignalingState<R> {
    pub fn neu(
        config: SignalingConfig,
        chat_service: Arc<ChatService<R>>,
        metriken: TreffpunktMetrics,
    ) -> Arc<Self> {
        let broadcaster = EventBroadcaster::mit_queue_groesse(config.send_queue_groesse);
        let sessions = Arc::new(SessionManager::neu(
            broadcaster,
            config.exklusive_voice_raeume,
        ));
        let notifier = Arc::new(ChangeNotifier::neu(
            Arc::clone(&sessions),
            metriken.clone(),
        ));

        Arc::new(Self {
            config: Arc::new(config),
            chat_service,
            sessions,
            notifier,
            metriken,
        })
    }

    /// Prueft ob eine weitere Verbindung angenommen werden darf
    pub fn kapazitaet_pruefen(&self) -> SignalingResult<()> {
        let max = self.config.max_verbindungen as usize;
        let offen = self.sessions.verbindungs_anzahl();
        if offen >= max {
            return Err(SignalingError::ServerVoll { offen, max });
        }
        Ok(())
    }

    /// Aktualisiert die Session-Gauges aus dem aktuellen Zustand
    pub fn gauges_aktualisieren(&self) {
        let statistik = self.sessions.statistik();
        self.metriken.verbindungen.set(statistik.verbindungen as i64);
        self.metriken
            .voice_raeume_aktiv
            .set(statistik.voice_raeume as i64);
    }
}
