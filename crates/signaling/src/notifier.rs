//! Global Change Notifier – "etwas hat sich geaendert, neu laden"
//!
//! CRUD-Operationen rufen nach jeder Mutation `ankuendigen()` auf. Alle
//! offenen Verbindungen erhalten ein `announce`-Ereignis ohne Nutzlast,
//! ohne Themenfilter.

use std::sync::Arc;

use treffpunkt_core::ChangeAnnouncer;
use treffpunkt_observability::TreffpunktMetrics;
use treffpunkt_protocol::ServerEvent;

use crate::session::SessionManager;

/// Implementierung von `ChangeAnnouncer` ueber den SessionManager
pub struct ChangeNotifier {
    sessions: Arc<SessionManager>,
    metriken: TreffpunktMetrics,
}

impl ChangeNotifier {
    pub fn neu(sessions: Arc<SessionManager>, metriken: TreffpunktMetrics) -> Self {
        Self { sessions, metriken }
    }
}

impl ChangeAnnouncer for ChangeNotifier {
    fn ankuendigen(&self) -> usize {
        let erreicht = self.sessions.an_alle_senden(&ServerEvent::Announce);
        self.metriken.ankuendigungen_total.inc();
        tracing::info!(verbindungen = erreicht, "Globales Aenderungs-Signal gesendet");
        erreicht
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use treffpunkt_core::ConnectionId;

    #[test]
    fn ankuendigung_erreicht_alle() {
        let sessions = Arc::new(SessionManager::neu(EventBroadcaster::neu(), false));
        let metriken = TreffpunktMetrics::neu().unwrap();
        let notifier = ChangeNotifier::neu(Arc::clone(&sessions), metriken.clone());

        let mut empfaenger: Vec<_> = (0..3)
            .map(|_| {
                let id = ConnectionId::new();
                let mut rx = sessions.verbindung_oeffnen(id);
                let _ = rx.try_recv();
                rx
            })
            .collect();

        assert_eq!(notifier.ankuendigen(), 3);
        for rx in &mut empfaenger {
            assert_eq!(rx.try_recv().unwrap(), ServerEvent::Announce);
        }
        assert_eq!(metriken.ankuendigungen_total.get(), 1);
    }

    #[test]
    fn ankuendigung_ohne_verbindungen() {
        let sessions = Arc::new(SessionManager::neu(EventBroadcaster::neu(), false));
        let notifier = ChangeNotifier::neu(sessions, TreffpunktMetrics::neu().unwrap());
        assert_eq!(notifier.ankuendigen(), 0);
    }
}
