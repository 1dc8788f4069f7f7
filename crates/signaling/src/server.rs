//! WebSocket-Server – Bindet Socket, nimmt Upgrades an
//!
//! Der `SignalingServer` stellt `GET /ws` bereit und startet fuer jede
//! angenommene Verbindung eine `ClientConnection` in einem eigenen Task.
//! Verbindungen ueber `max_verbindungen` werden mit 503 abgelehnt.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use treffpunkt_core::ConnectionId;
use treffpunkt_db::MessageRepository;

use crate::connection::ClientConnection;
use crate::error::SignalingResult;
use crate::server_state::SignalingState;

/// Router-Zustand: geteilter Server-Zustand plus Shutdown-Empfaenger
struct WsZustand<R: MessageRepository> {
    state: Arc<SignalingState<R>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<R: MessageRepository> Clone for WsZustand<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            shutdown_rx: self.shutdown_rx.clone(),
        }
    }
}

/// WebSocket-Signaling-Server
pub struct SignalingServer<R: MessageRepository> {
    state: Arc<SignalingState<R>>,
    bind_addr: SocketAddr,
}

impl<R: MessageRepository> SignalingServer<R> {
    /// Erstellt einen neuen SignalingServer
    pub fn neu(state: Arc<SignalingState<R>>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Gibt die Bind-Adresse zurueck
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Baut den Axum-Router mit der `/ws`-Route
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        Router::new()
            .route("/ws", get(ws_handler::<R>))
            .layer(TraceLayer::new_for_http())
            .with_state(WsZustand {
                state: Arc::clone(&self.state),
                shutdown_rx,
            })
    }

    /// Bindet den Socket und bedient Verbindungen
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.bedienen(listener, shutdown_rx).await
    }

    /// Bedient Verbindungen auf einem bereits gebundenen Listener
    pub async fn bedienen(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_addr,
            server = %self.state.config.server_name,
            "WebSocket Signaling-Server gestartet"
        );

        let app = self.router(shutdown_rx.clone());
        let mut stop_rx = shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
                tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
            })
            .await?;

        tracing::info!("WebSocket Signaling-Server gestoppt");
        Ok(())
    }
}

async fn ws_handler<R: MessageRepository>(
    State(zustand): State<WsZustand<R>>,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(e) = zustand.state.kapazitaet_pruefen() {
        tracing::warn!(fehler = %e, "Verbindung abgelehnt");
        return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
    }

    let WsZustand { state, shutdown_rx } = zustand;
    ws.on_upgrade(move |socket| async move {
        ClientConnection::neu(state, ConnectionId::new())
            .verarbeiten(socket, shutdown_rx)
            .await;
    })
}
