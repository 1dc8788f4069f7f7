//! Health-Check-Endpunkt fuer Treffpunkt
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und DB-Verbindungsstatus

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
///
/// Der DB-Status wird von aussen gesetzt (periodische Pruefung im Server).
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    db_connected: Arc<AtomicBool>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            db_connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn db_verbunden(&self) -> bool {
        self.db_connected.load(Ordering::Relaxed)
    }

    pub fn db_status_setzen(&self, verbunden: bool) {
        self.db_connected.store(verbunden, Ordering::Relaxed);
    }

    /// Momentaufnahme fuer die HTTP-Antwort
    pub fn antwort(&self) -> HealthResponse {
        let db_connected = self.db_verbunden();
        HealthResponse {
            status: if db_connected {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            db_connected,
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
///
/// Auch bei degradiertem Speicher 200, damit die Probe nicht failt: der
/// Echtzeit-Pfad laeuft ohne Speicher weiter.
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.antwort()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn health_state_db_standard_verbunden() {
        let state = HealthState::neu();
        assert!(state.db_verbunden());
        assert!(state.uptime_seconds() < 5);
    }

    #[test]
    fn health_state_db_status_umschalten() {
        let state = HealthState::neu();
        let klon = state.clone();
        klon.db_status_setzen(false);
        assert!(!state.db_verbunden());
        assert_eq!(state.antwort().status, HealthStatus::Degraded);
        klon.db_status_setzen(true);
        assert_eq!(state.antwort().status, HealthStatus::Healthy);
    }

    #[test]
    fn health_response_serialisierung() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            db_connected: true,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"db_connected\":true"));
    }

    #[tokio::test]
    async fn health_endpunkt_liefert_json() {
        let state = HealthState::neu();
        state.db_status_setzen(false);

        let antwort = health_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(antwort.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, HealthStatus::Degraded);
        assert!(!body.db_connected);
    }
}
