//! Auth-Handler – Identitaet an die Verbindung binden
//!
//! Die Identitaet ist bereits von einem externen Dienst geprueft; die
//! Session-Schicht vertraut ihr.

use std::sync::Arc;

use treffpunkt_core::ConnectionId;
use treffpunkt_db::MessageRepository;

use crate::server_state::SignalingState;

/// Verarbeitet `login`: binden und Roster an alle verteilen
pub fn handle_login<R: MessageRepository>(
    identitaet: String,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    let identitaeten = state.sessions.anmelden(connection_id, identitaet.as_str());

    tracing::info!(
        connection_id = %connection_id,
        identitaet = %identitaet,
        online = identitaeten.len(),
        "Identitaet gebunden"
    );
}
