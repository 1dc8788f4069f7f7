//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use treffpunkt_db::DatabaseConfig;
use treffpunkt_observability::logging::{log_format_gueltig, log_level_gueltig};
use treffpunkt_signaling::SignalingConfig;

/// Umgebungsvariable fuer den Pfad der Konfigurationsdatei
pub const ENV_CONFIG: &str = "TP_CONFIG";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Chat-Einstellungen
    pub chat: ChatEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger WebSocket-Verbindungen
    pub max_verbindungen: u32,
    /// Voice-Beitritt verlaesst alle anderen Voice-Kanaele
    pub exklusive_voice_raeume: bool,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Treffpunkt".into(),
            max_verbindungen: 512,
            exklusive_voice_raeume: false,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer WebSocket und Observability
    pub bind_adresse: String,
    /// Port fuer `GET /ws`
    pub ws_port: u16,
    /// Port der Admin-Schnittstelle
    pub admin_port: u16,
    /// Bind-Adresse der Admin-Schnittstelle (nur lokal per Standard)
    pub admin_bind_adresse: String,
    /// CORS-Origins der Admin-Schnittstelle (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            ws_port: 3001,
            admin_port: 3002,
            admin_bind_adresse: "127.0.0.1".into(),
            cors_origins: vec![],
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Modus fuer SQLite
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Chat-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEinstellungen {
    /// Anzahl Nachrichten, die beim Raumbeitritt ausgeliefert werden
    pub history_limit: u32,
}

impl Default for ChatEinstellungen {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
    /// Intervall der DB-Erreichbarkeitspruefung in Sekunden
    pub db_pruef_intervall_sek: u64,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
            db_pruef_intervall_sek: 30,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .with_context(|| format!("Konfigurationsfehler in '{pfad}'"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.pruefen()?;
        Ok(config)
    }

    /// Parst eine Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(inhalt)?)
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiges Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format: '{}'", self.logging.format);
        }
        if self.server.max_verbindungen == 0 {
            bail!("server.max_verbindungen muss groesser als 0 sein");
        }
        if self.datenbank.max_verbindungen == 0 {
            bail!("datenbank.max_verbindungen muss groesser als 0 sein");
        }
        if self.netzwerk.ws_port == self.netzwerk.admin_port {
            bail!(
                "WebSocket- und Admin-Port duerfen nicht gleich sein ({})",
                self.netzwerk.ws_port
            );
        }
        if self.observability.aktiviert
            && [self.netzwerk.ws_port, self.netzwerk.admin_port].contains(&self.observability.port)
        {
            bail!(
                "Observability-Port {} kollidiert mit einem anderen Port",
                self.observability.port
            );
        }
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer den WebSocket-Server zurueck
    pub fn ws_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.netzwerk.ws_port)
    }

    /// Gibt die Bind-Adresse fuer die Admin-Schnittstelle zurueck
    pub fn admin_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        adresse_parsen(&self.netzwerk.admin_bind_adresse, self.netzwerk.admin_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        adresse_parsen(&self.netzwerk.bind_adresse, self.observability.port)
    }

    /// Leitet die Signaling-Konfiguration ab
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            server_name: self.server.name.clone(),
            max_verbindungen: self.server.max_verbindungen,
            exklusive_voice_raeume: self.server.exklusive_voice_raeume,
            ..SignalingConfig::default()
        }
    }

    /// Leitet die Datenbank-Konfiguration ab
    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }
}

fn adresse_parsen(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Ungueltige Bind-Adresse '{host}:{port}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_verbindungen, 512);
        assert_eq!(cfg.netzwerk.ws_port, 3001);
        assert_eq!(cfg.chat.history_limit, 100);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.server.exklusive_voice_raeume);
        cfg.pruefen().unwrap();
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.ws_bind_adresse().unwrap().to_string(), "0.0.0.0:3001");
        assert_eq!(cfg.admin_bind_adresse().unwrap().to_string(), "127.0.0.1:3002");
        assert_eq!(
            cfg.observability_bind_adresse().unwrap().to_string(),
            "0.0.0.0:9300"
        );
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Mein Treffpunkt"
            exklusive_voice_raeume = true

            [chat]
            history_limit = 50
        "#;
        let cfg = ServerConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.server.name, "Mein Treffpunkt");
        assert!(cfg.server.exklusive_voice_raeume);
        assert_eq!(cfg.chat.history_limit, 50);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.server.max_verbindungen, 512);
        assert_eq!(cfg.netzwerk.admin_port, 3002);

        let signaling = cfg.signaling_config();
        assert!(signaling.exklusive_voice_raeume);
        assert_eq!(signaling.server_name, "Mein Treffpunkt");
    }

    #[test]
    fn ungueltiges_log_level_wird_abgelehnt() {
        let cfg = ServerConfig::aus_toml("[logging]\nlevel = \"laut\"").unwrap();
        assert!(cfg.pruefen().is_err());
    }

    #[test]
    fn gleiche_ports_werden_abgelehnt() {
        let cfg = ServerConfig::aus_toml("[netzwerk]\nws_port = 4000\nadmin_port = 4000").unwrap();
        assert!(cfg.pruefen().is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = ServerConfig::laden("/gibt/es/nicht/config.toml").unwrap();
        assert_eq!(cfg.netzwerk.ws_port, 3001);
    }

    #[test]
    fn ungueltige_bind_adresse() {
        let mut cfg = ServerConfig::default();
        cfg.netzwerk.bind_adresse = "kein host".into();
        assert!(cfg.ws_bind_adresse().is_err());
    }
}
