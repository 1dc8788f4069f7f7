//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Schleife wartet gleichzeitig auf:
//! - eingehende Frames (werden strikt nacheinander dispatcht)
//! - ausgehende Ereignisse aus der Broadcaster-Queue
//! - das Shutdown-Signal
//!
//! Aufgeraeumt wird, wenn der Transport schliesst oder der Broadcaster die
//! Send-Queue wegen Ueberlauf entfernt; es gibt keine Timeouts in dieser
//! Schicht.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use treffpunkt_core::ConnectionId;
use treffpunkt_db::MessageRepository;

use crate::dispatcher::EventDispatcher;
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection<R: MessageRepository> {
    state: Arc<SignalingState<R>>,
    connection_id: ConnectionId,
}

impl<R: MessageRepository> ClientConnection<R> {
    pub fn neu(state: Arc<SignalingState<R>>, connection_id: ConnectionId) -> Self {
        Self {
            state,
            connection_id,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, ein Schreibfehler auftritt, die
    /// Send-Queue entfernt wird oder das Shutdown-Signal eingeht. Danach
    /// wird die Verbindung aus allen Tabellen entfernt.
    pub async fn verarbeiten(self, socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let connection_id = self.connection_id;
        let (mut sender, mut empfaenger) = socket.split();

        let mut sende_rx = self.state.sessions.verbindung_oeffnen(connection_id);
        self.state.gauges_aktualisieren();
        let dispatcher = EventDispatcher::neu(Arc::clone(&self.state));

        tracing::info!(connection_id = %connection_id, "Neue Verbindung");

        loop {
            tokio::select! {
                // Eingehendes Frame vom Client
                frame = empfaenger.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = dispatcher.frame_verarbeiten(connection_id, &text).await {
                                tracing::warn!(connection_id = %connection_id, fehler = %e, "Frame verworfen");
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!(connection_id = %connection_id, "Binaerframe ignoriert");
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(connection_id = %connection_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        // Ping/Pong beantwortet axum selbst
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(connection_id = %connection_id, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                ausgehend = sende_rx.recv() => {
                    let Some(ausgehend) = ausgehend else {
                        // Queue geschlossen: Verbindung wurde verdraengt
                        tracing::warn!(connection_id = %connection_id, "Send-Queue entfernt – Verbindung wird geschlossen");
                        break;
                    };
                    let text = match ausgehend.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(connection_id = %connection_id, fehler = %e, "Ereignis nicht serialisierbar");
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(Message::Text(text)).await {
                        tracing::warn!(connection_id = %connection_id, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(connection_id = %connection_id, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        dispatcher.verbindung_bereinigen(&connection_id);

        tracing::info!(connection_id = %connection_id, "Verbindungs-Task beendet");
    }
}
