//! treffpunkt-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod admin;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use config::ServerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use treffpunkt_chat::ChatService;
use treffpunkt_db::SqliteDb;
use treffpunkt_observability::{observability_server_starten, HealthState, TreffpunktMetrics};
use treffpunkt_signaling::{SignalingServer, SignalingState};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (inkl. Migrationen)
    /// 2. Session-Zustand aufbauen
    /// 3. WebSocket-, Admin- und Observability-Server starten
    /// 4. Auf Ctrl-C warten, dann alle Tasks geordnet beenden
    pub async fn starten(self) -> Result<()> {
        let ws_addr = self.config.ws_bind_adresse()?;
        let admin_addr = self.config.admin_bind_adresse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            ws = %ws_addr,
            admin = %admin_addr,
            "Server startet"
        );

        let db = Arc::new(SqliteDb::oeffnen(&self.config.datenbank_config()).await?);
        tracing::info!(url = %self.config.datenbank.url, "Datenbank bereit");

        let metriken = TreffpunktMetrics::neu()?;
        let health = HealthState::neu();
        let chat_service = ChatService::neu(Arc::clone(&db), self.config.chat.history_limit);
        let state = SignalingState::neu(
            self.config.signaling_config(),
            chat_service,
            metriken.clone(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut aufgaben: Vec<JoinHandle<()>> = Vec::new();

        // WebSocket-Signaling
        let ws_server = SignalingServer::neu(Arc::clone(&state), ws_addr);
        let rx = shutdown_rx.clone();
        aufgaben.push(aufgabe_starten("websocket", async move {
            ws_server.starten(rx).await.map_err(anyhow::Error::from)
        }));

        // Admin-Schnittstelle
        aufgaben.push(aufgabe_starten(
            "admin",
            admin::admin_server_starten(
                admin_addr,
                Arc::clone(&state),
                self.config.netzwerk.cors_origins.clone(),
                shutdown_rx.clone(),
            ),
        ));

        // Observability
        if self.config.observability.aktiviert {
            let addr = self.config.observability_bind_adresse()?;
            aufgaben.push(aufgabe_starten(
                "observability",
                observability_server_starten(addr, metriken.clone(), health.clone(), shutdown_rx.clone()),
            ));
        }

        // Periodische DB-Pruefung fuer /health
        let intervall = Duration::from_secs(self.config.observability.db_pruef_intervall_sek.max(1));
        aufgaben.push(aufgabe_starten(
            "db-pruefung",
            db_pruefung(Arc::clone(&db), health, intervall, shutdown_rx.clone()),
        ));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        for handle in aufgaben {
            if let Err(e) = handle.await {
                tracing::error!(fehler = %e, "Aufgabe abgebrochen");
            }
        }

        db.schliessen().await;
        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Startet eine Hintergrund-Aufgabe und loggt ihr Ende sofort
fn aufgabe_starten<F>(name: &'static str, aufgabe: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match aufgabe.await {
            Ok(()) => tracing::debug!(aufgabe = name, "Aufgabe beendet"),
            Err(e) => tracing::error!(aufgabe = name, fehler = %e, "Aufgabe mit Fehler beendet"),
        }
    })
}

/// Prueft in festen Abstaenden ob die Datenbank erreichbar ist
async fn db_pruefung(
    db: Arc<SqliteDb>,
    health: HealthState,
    intervall: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let mut takt = tokio::time::interval(intervall);
    loop {
        tokio::select! {
            _ = takt.tick() => {
                let erreichbar = db.erreichbar().await;
                if erreichbar != health.db_verbunden() {
                    if erreichbar {
                        tracing::info!("Datenbank wieder erreichbar");
                    } else {
                        tracing::warn!("Datenbank nicht erreichbar");
                    }
                }
                health.db_status_setzen(erreichbar);
            }
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn db_pruefung_setzt_status_und_endet() {
        let db = Arc::new(SqliteDb::in_memory().await.unwrap());
        let health = HealthState::neu();
        health.db_status_setzen(false);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(db_pruefung(
            Arc::clone(&db),
            health.clone(),
            Duration::from_secs(30),
            rx,
        ));

        for _ in 0..100 {
            if health.db_verbunden() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(health.db_verbunden());

        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
