//! Chat-Handler – Text-Raum betreten, Nachrichten senden
//!
//! Speicherfehler sind hier nie fatal: ohne History wird der Raum trotzdem
//! betreten, und eine nicht persistierte Nachricht wird trotzdem verteilt.

use std::sync::Arc;

use treffpunkt_chat::ChatError;
use treffpunkt_core::{ChannelId, ConnectionId};
use treffpunkt_db::MessageRepository;
use treffpunkt_protocol::{MessagePayload, ServerEvent};

use crate::server_state::SignalingState;

/// Verarbeitet `joinTextRoom`
///
/// Wechselt den Raum und liefert die History nur an den Beitretenden.
pub async fn handle_join_text_room<R: MessageRepository>(
    raum: ChannelId,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    let bisher = state.sessions.text_raum_betreten(connection_id, raum.clone());

    tracing::debug!(
        connection_id = %connection_id,
        raum = %raum,
        bisher = ?bisher,
        "Text-Raum betreten"
    );

    match state.chat_service.letzte_nachrichten(&raum).await {
        Ok(history) => {
            tracing::trace!(
                connection_id = %connection_id,
                anzahl = history.len(),
                "History ausgeliefert"
            );
            state
                .sessions
                .an_verbindung_senden(&connection_id, ServerEvent::History(history));
        }
        Err(e) => {
            speicherfehler_melden(state, &e);
            if e.ist_voruebergehend() {
                tracing::warn!(
                    connection_id = %connection_id,
                    raum = %raum,
                    fehler = %e,
                    "Speicher nicht erreichbar – Beitritt ohne History"
                );
            } else {
                tracing::error!(
                    connection_id = %connection_id,
                    raum = %raum,
                    fehler = %e,
                    "History konnte nicht geladen werden – Beitritt ohne History"
                );
            }
        }
    }
}

/// Verarbeitet `sendMessage`
///
/// Wartet auf die Persistenz und verteilt danach die unveraenderte
/// Nutzlast an alle Verbindungen im Zielraum, auch wenn das Speichern
/// fehlgeschlagen ist.
pub async fn handle_send_message<R: MessageRepository>(
    payload: MessagePayload,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    if let Err(e) = state.chat_service.nachricht_persistieren(&payload).await {
        speicherfehler_melden(state, &e);
        if e.ist_voruebergehend() {
            tracing::warn!(
                connection_id = %connection_id,
                raum = %payload.room_id,
                fehler = %e,
                "Speicher nicht erreichbar – Nachricht wird ohne Persistenz verteilt"
            );
        } else {
            tracing::error!(
                connection_id = %connection_id,
                raum = %payload.room_id,
                fehler = %e,
                "Nachricht nicht persistiert – wird trotzdem verteilt"
            );
        }
    }

    let raum = payload.room_id.clone();
    let empfaenger = state
        .sessions
        .an_raum_senden(&raum, ServerEvent::Message(payload));
    state.metriken.nachrichten_total.inc();

    tracing::debug!(
        connection_id = %connection_id,
        raum = %raum,
        empfaenger,
        "Nachricht verteilt"
    );
}

/// Zaehlt einen Speicherfehler; voruebergehende Ausfaelle zusaetzlich getrennt
fn speicherfehler_melden<R: MessageRepository>(state: &SignalingState<R>, fehler: &ChatError) {
    state.metriken.speicher_fehler_total.inc();
    if fehler.ist_voruebergehend() {
        state.metriken.speicher_ausfaelle_total.inc();
    }
}
