//! Voice-Handler – Voice-Kanal betreten und verlassen
//!
//! Nur Praesenz-Buchhaltung; der Medienpfad laeuft Peer-to-Peer ueber die
//! per Relay ausgehandelten WebRTC-Verbindungen.

use std::sync::Arc;

use treffpunkt_core::{ChannelId, ConnectionId};
use treffpunkt_db::MessageRepository;
use treffpunkt_protocol::VoiceJoinRequest;

use crate::server_state::SignalingState;

/// Verarbeitet `joinVoice`
pub fn handle_join_voice<R: MessageRepository>(
    anfrage: VoiceJoinRequest,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    let roster = state.sessions.voice_beitreten(
        connection_id,
        &anfrage.channel_id,
        anfrage.display_name.as_str(),
    );
    state.gauges_aktualisieren();

    tracing::info!(
        connection_id = %connection_id,
        kanal = %anfrage.channel_id,
        anzeigename = %anfrage.display_name,
        teilnehmer = roster.len(),
        "Voice-Kanal betreten"
    );
}

/// Verarbeitet `leaveVoice`
pub fn handle_leave_voice<R: MessageRepository>(
    kanal: ChannelId,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    if state.sessions.voice_verlassen(&connection_id, &kanal) {
        state.gauges_aktualisieren();
        tracing::info!(
            connection_id = %connection_id,
            kanal = %kanal,
            "Voice-Kanal verlassen"
        );
    } else {
        tracing::debug!(
            connection_id = %connection_id,
            kanal = %kanal,
            "leaveVoice ohne Mitgliedschaft ignoriert"
        );
    }
}
