//! Signaling Relay – Offer, Answer und ICE-Kandidaten weiterleiten
//!
//! Zustandslos: der Umschlag wird mit der Absender-ID versehen und an die
//! private Adresse des Ziels gesendet. Das Ziel wird nicht geprueft, es gibt
//! keine Zustellbestaetigung und keine Zwischenspeicherung. Nicht
//! zustellbare Umschlaege werden verworfen.

use treffpunkt_core::ConnectionId;
use treffpunkt_protocol::{AnswerRequest, IceCandidateRequest, OfferRequest, ServerEvent};

use crate::session::SessionManager;

/// Art eines Signaling-Umschlags (Metrik-Label)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalArt {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalArt {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "iceCandidate",
        }
    }
}

/// Leitet ein SDP-Offer weiter
///
/// Fehlt der Anzeigename, wird die gebundene Identitaet des Absenders
/// mitgeschickt.
pub fn offer_weiterleiten(
    sessions: &SessionManager,
    absender: ConnectionId,
    anfrage: OfferRequest,
) -> bool {
    let display_name = anfrage
        .display_name
        .or_else(|| sessions.identitaet(&absender));

    zustellen(
        sessions,
        SignalArt::Offer,
        absender,
        &anfrage.target,
        ServerEvent::Offer {
            sdp: anfrage.sdp,
            sender: absender,
            display_name,
        },
    )
}

/// Leitet eine SDP-Answer weiter
pub fn answer_weiterleiten(
    sessions: &SessionManager,
    absender: ConnectionId,
    anfrage: AnswerRequest,
) -> bool {
    zustellen(
        sessions,
        SignalArt::Answer,
        absender,
        &anfrage.target,
        ServerEvent::Answer {
            sdp: anfrage.sdp,
            sender: absender,
        },
    )
}

/// Leitet einen ICE-Kandidaten weiter
pub fn ice_weiterleiten(
    sessions: &SessionManager,
    absender: ConnectionId,
    anfrage: IceCandidateRequest,
) -> bool {
    zustellen(
        sessions,
        SignalArt::IceCandidate,
        absender,
        &anfrage.target,
        ServerEvent::IceCandidate {
            candidate: anfrage.candidate,
            sender: absender,
        },
    )
}

fn zustellen(
    sessions: &SessionManager,
    art: SignalArt,
    absender: ConnectionId,
    ziel: &ConnectionId,
    ereignis: ServerEvent,
) -> bool {
    let zugestellt = sessions.an_verbindung_senden(ziel, ereignis);
    if !zugestellt {
        tracing::debug!(
            art = art.als_str(),
            absender = %absender,
            ziel = %ziel,
            "Signaling-Umschlag nicht zustellbar – verworfen"
        );
    }
    zugestellt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::EventBroadcaster;
    use serde_json::json;

    fn setup() -> (SessionManager, ConnectionId, ConnectionId) {
        let sm = SessionManager::neu(EventBroadcaster::neu(), false);
        (sm, ConnectionId::new(), ConnectionId::new())
    }

    #[test]
    fn offer_erreicht_nur_das_ziel() {
        let (sm, absender, ziel) = setup();
        let dritter = ConnectionId::new();
        let mut rx_absender = sm.broadcaster().verbindung_registrieren(absender);
        let mut rx_ziel = sm.broadcaster().verbindung_registrieren(ziel);
        let mut rx_dritter = sm.broadcaster().verbindung_registrieren(dritter);

        let sdp = json!({"type": "offer", "sdp": "v=0"});
        assert!(offer_weiterleiten(
            &sm,
            absender,
            OfferRequest {
                target: ziel,
                sdp: sdp.clone(),
                display_name: Some("Alice".into()),
            }
        ));

        assert_eq!(
            rx_ziel.try_recv().unwrap(),
            ServerEvent::Offer {
                sdp,
                sender: absender,
                display_name: Some("Alice".into()),
            }
        );
        assert!(rx_absender.try_recv().is_err());
        assert!(rx_dritter.try_recv().is_err());
    }

    #[test]
    fn offer_ohne_namen_nutzt_identitaet() {
        let (sm, absender, ziel) = setup();
        let _rx_absender = sm.broadcaster().verbindung_registrieren(absender);
        let mut rx_ziel = sm.broadcaster().verbindung_registrieren(ziel);
        sm.anmelden(absender, "alice");
        while rx_ziel.try_recv().is_ok() {}

        offer_weiterleiten(
            &sm,
            absender,
            OfferRequest {
                target: ziel,
                sdp: json!("sdp"),
                display_name: None,
            },
        );

        match rx_ziel.try_recv().unwrap() {
            ServerEvent::Offer { display_name, .. } => {
                assert_eq!(display_name.as_deref(), Some("alice"))
            }
            andere => panic!("Erwartet Offer, erhalten {andere:?}"),
        }
    }

    #[test]
    fn answer_und_ice_tragen_absender() {
        let (sm, absender, ziel) = setup();
        let mut rx_ziel = sm.broadcaster().verbindung_registrieren(ziel);

        answer_weiterleiten(
            &sm,
            absender,
            AnswerRequest {
                target: ziel,
                sdp: json!({"type": "answer"}),
            },
        );
        ice_weiterleiten(
            &sm,
            absender,
            IceCandidateRequest {
                target: ziel,
                candidate: json!({"candidate": "candidate:1 1 udp"}),
            },
        );

        assert_eq!(
            rx_ziel.try_recv().unwrap(),
            ServerEvent::Answer {
                sdp: json!({"type": "answer"}),
                sender: absender
            }
        );
        assert_eq!(
            rx_ziel.try_recv().unwrap(),
            ServerEvent::IceCandidate {
                candidate: json!({"candidate": "candidate:1 1 udp"}),
                sender: absender
            }
        );
    }

    #[test]
    fn unbekanntes_ziel_wird_verworfen() {
        let (sm, absender, ziel) = setup();
        assert!(!answer_weiterleiten(
            &sm,
            absender,
            AnswerRequest {
                target: ziel,
                sdp: json!(null),
            }
        ));
    }
}
