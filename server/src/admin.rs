//! Admin-HTTP-Schnittstelle (/v1/...)
//!
//! Einstiegspunkt fuer CRUD-Kollaborateure ausserhalb des Prozesses: jede
//! Mutation endet mit einem globalen Aenderungs-Signal an alle Clients.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use treffpunkt_chat::ChatError;
use treffpunkt_core::{ChangeAnnouncer, ChannelId, TreffpunktError};
use treffpunkt_db::MessageRepository;
use treffpunkt_signaling::{SessionStatistik, SignalingState};

/// Fehler der Admin-Schnittstelle
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Ungueltige Anfrage: {0}")]
    UngueltigeAnfrage(String),

    #[error("Speicher nicht verfuegbar: {0}")]
    SpeicherNichtVerfuegbar(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AdminError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::UngueltigeAnfrage(_) => StatusCode::BAD_REQUEST,
            Self::SpeicherNichtVerfuegbar(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TreffpunktError> for AdminError {
    fn from(e: TreffpunktError) -> Self {
        match e {
            TreffpunktError::UngueltigeNachricht(msg) => Self::UngueltigeAnfrage(msg),
            TreffpunktError::Speicher(msg) => Self::SpeicherNichtVerfuegbar(msg),
            TreffpunktError::Intern(msg) => Self::Intern(msg),
        }
    }
}

impl From<ChatError> for AdminError {
    fn from(e: ChatError) -> Self {
        TreffpunktError::from(e).into()
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        match &self {
            Self::Intern(_) => tracing::error!(fehler = %self, "Admin-Anfrage fehlgeschlagen"),
            Self::SpeicherNichtVerfuegbar(_) => {
                tracing::warn!(fehler = %self, "Admin-Anfrage: Speicher nicht verfuegbar")
            }
            Self::UngueltigeAnfrage(_) => {}
        }
        (
            status,
            Json(json!({
                "error": { "code": status.as_u16(), "message": self.to_string() }
            })),
        )
            .into_response()
    }
}

type AdminResult<T> = Result<T, AdminError>;

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /v1/announce
async fn post_announce<R: MessageRepository>(
    State(state): State<Arc<SignalingState<R>>>,
) -> StatusCode {
    state.notifier.ankuendigen();
    StatusCode::NO_CONTENT
}

/// DELETE /v1/channels/:id/messages
async fn delete_channel_messages<R: MessageRepository>(
    State(state): State<Arc<SignalingState<R>>>,
    Path(id): Path<String>,
) -> AdminResult<Json<serde_json::Value>> {
    let kanal = ChannelId::neu(id);
    let geloescht = state.chat_service.kanal_leeren(&kanal).await?;
    state.notifier.ankuendigen();
    Ok(Json(json!({ "geloescht": geloescht })))
}

#[derive(Debug, Deserialize)]
pub struct AvatarBody {
    pub avatar: String,
}

/// POST /v1/users/:name/avatar
async fn post_user_avatar<R: MessageRepository>(
    State(state): State<Arc<SignalingState<R>>>,
    Path(name): Path<String>,
    Json(body): Json<AvatarBody>,
) -> AdminResult<Json<serde_json::Value>> {
    let aktualisiert = state
        .chat_service
        .avatar_nachtragen(&name, &body.avatar)
        .await?;
    state.notifier.ankuendigen();
    Ok(Json(json!({ "aktualisiert": aktualisiert })))
}

/// GET /v1/stats
async fn get_stats<R: MessageRepository>(
    State(state): State<Arc<SignalingState<R>>>,
) -> Json<SessionStatistik> {
    Json(state.sessions.statistik())
}

// ---------------------------------------------------------------------------
// Router und Server
// ---------------------------------------------------------------------------

/// Erstellt den vollstaendigen /v1/-Router
pub fn admin_router<R: MessageRepository>(
    state: Arc<SignalingState<R>>,
    cors_origins: &[String],
) -> Router {
    // CORS: entweder spezifische Origins oder alle
    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .route("/v1/announce", post(post_announce::<R>))
        .route(
            "/v1/channels/:id/messages",
            delete(delete_channel_messages::<R>),
        )
        .route("/v1/users/:name/avatar", post(post_user_avatar::<R>))
        .route("/v1/stats", get(get_stats::<R>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Startet die Admin-Schnittstelle und laeuft bis zum Shutdown-Signal
pub async fn admin_server_starten<R: MessageRepository>(
    bind_addr: SocketAddr,
    state: Arc<SignalingState<R>>,
    cors_origins: Vec<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = admin_router(state, &cors_origins);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Admin-Schnittstelle gestartet");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use treffpunkt_chat::ChatService;
    use treffpunkt_core::ConnectionId;
    use treffpunkt_db::SqliteDb;
    use treffpunkt_observability::TreffpunktMetrics;
    use treffpunkt_protocol::{MessagePayload, ServerEvent};
    use treffpunkt_signaling::SignalingConfig;

    async fn test_zustand() -> Arc<SignalingState<SqliteDb>> {
        let db = Arc::new(SqliteDb::in_memory().await.unwrap());
        SignalingState::neu(
            SignalingConfig::default(),
            ChatService::neu(db, 100),
            TreffpunktMetrics::neu().unwrap(),
        )
    }

    async fn json_body(antwort: Response) -> serde_json::Value {
        let bytes = to_bytes(antwort.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn announce_erreicht_verbindungen() {
        let state = test_zustand().await;
        let mut rx = state.sessions.verbindung_oeffnen(ConnectionId::new());
        let _ = rx.try_recv();

        let antwort = admin_router(Arc::clone(&state), &[])
            .oneshot(
                Request::post("/v1/announce")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(antwort.status(), StatusCode::NO_CONTENT);
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Announce);
    }

    #[tokio::test]
    async fn kanal_leeren_meldet_anzahl() {
        let state = test_zustand().await;
        for text in ["a", "b"] {
            state
                .chat_service
                .nachricht_persistieren(&MessagePayload::text("general", text))
                .await
                .unwrap();
        }

        let antwort = admin_router(Arc::clone(&state), &[])
            .oneshot(
                Request::delete("/v1/channels/general/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(antwort.status(), StatusCode::OK);
        assert_eq!(json_body(antwort).await, json!({ "geloescht": 2 }));
        assert_eq!(state.metriken.ankuendigungen_total.get(), 1);
    }

    #[tokio::test]
    async fn avatar_nachtragen() {
        let state = test_zustand().await;
        let payload = MessagePayload::text("general", "hi").mit_feld("sender", "alice");
        state
            .chat_service
            .nachricht_persistieren(&payload)
            .await
            .unwrap();

        let antwort = admin_router(Arc::clone(&state), &[])
            .oneshot(
                Request::post("/v1/users/alice/avatar")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"avatar":"neu.png"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(antwort.status(), StatusCode::OK);
        assert_eq!(json_body(antwort).await, json!({ "aktualisiert": 1 }));
    }

    #[tokio::test]
    async fn avatar_fuer_leeren_namen_ist_ungueltig() {
        let state = test_zustand().await;
        let antwort = admin_router(state, &[])
            .oneshot(
                Request::post("/v1/users/%20/avatar")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"avatar":"x.png"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(antwort.status(), StatusCode::BAD_REQUEST);
        let body = json_body(antwort).await;
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn statistik_zaehlt_verbindungen() {
        let state = test_zustand().await;
        let _rx = state.sessions.verbindung_oeffnen(ConnectionId::new());

        let antwort = admin_router(state, &[])
            .oneshot(Request::get("/v1/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(antwort.status(), StatusCode::OK);
        let body = json_body(antwort).await;
        assert_eq!(body["verbindungen"], 1);
        assert_eq!(body["voice_raeume"], 0);
    }

    #[test]
    fn fehler_status_abbildung() {
        let e: AdminError = TreffpunktError::UngueltigeNachricht("x".into()).into();
        assert_eq!(e.http_status(), StatusCode::BAD_REQUEST);
        let e: AdminError = TreffpunktError::Speicher("x".into()).into();
        assert_eq!(e.http_status(), StatusCode::SERVICE_UNAVAILABLE);
        let e: AdminError = TreffpunktError::intern("x").into();
        assert_eq!(e.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
