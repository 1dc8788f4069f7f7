//! Event-Dispatcher – Routet Client-Ereignisse an die richtigen Handler
//!
//! Der Dispatcher empfaengt die Textframes einer `ClientConnection`,
//! dekodiert sie und ruft den passenden Handler auf. Es gibt keine
//! Antworten: alle Rueckmeldungen laufen ueber den Broadcaster.
//!
//! Ereignisse werden in Ankunftsreihenfolge vollstaendig abgearbeitet,
//! bevor das naechste Frame gelesen wird.

use std::sync::Arc;

use treffpunkt_core::ConnectionId;
use treffpunkt_db::MessageRepository;
use treffpunkt_protocol::ClientEvent;

use crate::error::{SignalingError, SignalingResult};
use crate::handlers::{auth_handler, chat_handler, relay_handler, voice_handler};
use crate::server_state::SignalingState;

/// Zentraler Event-Dispatcher einer Verbindung
pub struct EventDispatcher<R: MessageRepository> {
    state: Arc<SignalingState<R>>,
}

impl<R: MessageRepository> EventDispatcher<R> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<R>>) -> Self {
        Self { state }
    }

    /// Dekodiert ein Textframe und verarbeitet das Ereignis
    pub async fn frame_verarbeiten(
        &self,
        connection_id: ConnectionId,
        text: &str,
    ) -> SignalingResult<()> {
        let ereignis = ClientEvent::from_json(text)
            .map_err(|e| SignalingError::protokoll(format!("Ungueltiges Ereignis: {e}")))?;
        self.dispatch(connection_id, ereignis).await;
        Ok(())
    }

    /// Verarbeitet ein dekodiertes Ereignis
    pub async fn dispatch(&self, connection_id: ConnectionId, ereignis: ClientEvent) {
        tracing::trace!(
            connection_id = %connection_id,
            art = ereignis.art(),
            "Ereignis empfangen"
        );

        match ereignis {
            // -------------------------------------------------------------------
            // Identitaet
            // -------------------------------------------------------------------
            ClientEvent::Login(identitaet) => {
                auth_handler::handle_login(identitaet, connection_id, &self.state);
            }

            // -------------------------------------------------------------------
            // Text-Raeume
            // -------------------------------------------------------------------
            ClientEvent::JoinTextRoom(raum) => {
                chat_handler::handle_join_text_room(raum, connection_id, &self.state).await;
            }
            ClientEvent::SendMessage(payload) => {
                chat_handler::handle_send_message(payload, connection_id, &self.state).await;
            }

            // -------------------------------------------------------------------
            // Voice
            // -------------------------------------------------------------------
            ClientEvent::JoinVoice(anfrage) => {
                voice_handler::handle_join_voice(anfrage, connection_id, &self.state);
            }
            ClientEvent::LeaveVoice(kanal) => {
                voice_handler::handle_leave_voice(kanal, connection_id, &self.state);
            }

            // -------------------------------------------------------------------
            // Signaling-Relay
            // -------------------------------------------------------------------
            ClientEvent::Offer(anfrage) => {
                relay_handler::handle_offer(anfrage, connection_id, &self.state);
            }
            ClientEvent::Answer(anfrage) => {
                relay_handler::handle_answer(anfrage, connection_id, &self.state);
            }
            ClientEvent::IceCandidate(anfrage) => {
                relay_handler::handle_ice_candidate(anfrage, connection_id, &self.state);
            }
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    pub fn verbindung_bereinigen(&self, connection_id: &ConnectionId) {
        let voice_kanaele = self.state.sessions.trennen(connection_id);
        self.state.gauges_aktualisieren();

        tracing::debug!(
            connection_id = %connection_id,
            voice_kanaele = voice_kanaele.len(),
            "Verbindungs-Ressourcen bereinigt"
        );
    }
}
