//! Prometheus-kompatible Metriken fuer Treffpunkt
//!
//! Registrierte Metriken:
//! - `treffpunkt_verbindungen` – Gauge: Aktuell offene WebSocket-Verbindungen
//! - `treffpunkt_voice_raeume_aktiv` – Gauge: Voice-Raeume mit mindestens einem Teilnehmer
//! - `treffpunkt_nachrichten_total` – Counter: Verteilte Chat-Nachrichten
//! - `treffpunkt_signale_total` – Counter: Weitergeleitete Signaling-Umschlaege (art)
//! - `treffpunkt_ankuendigungen_total` – Counter: Globale Aenderungs-Signale
//! - `treffpunkt_speicher_fehler_total` – Counter: Fehlgeschlagene Speicherzugriffe
//! - `treffpunkt_speicher_ausfaelle_total` – Counter: Davon voruebergehende Ausfaelle (Pool, IO)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Treffpunkt-Prometheus-Metriken
///
/// Clone teilt die Registry; die Handles selbst sind intern referenzgezaehlt.
#[derive(Clone)]
pub struct TreffpunktMetrics {
    pub registry: Arc<Registry>,

    // Session-Metriken
    pub verbindungen: IntGauge,
    pub voice_raeume_aktiv: IntGauge,

    // Ereignis-Metriken
    pub nachrichten_total: IntCounter,
    pub signale_total: IntCounterVec,
    pub ankuendigungen_total: IntCounter,

    // Fehler
    pub speicher_fehler_total: IntCounter,
    pub speicher_ausfaelle_total: IntCounter,
}

impl TreffpunktMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let verbindungen = IntGauge::with_opts(Opts::new(
            "treffpunkt_verbindungen",
            "Anzahl aktuell offener Verbindungen",
        ))?;
        registry.register(Box::new(verbindungen.clone()))?;

        let voice_raeume_aktiv = IntGauge::with_opts(Opts::new(
            "treffpunkt_voice_raeume_aktiv",
            "Anzahl Voice-Raeume mit Teilnehmern",
        ))?;
        registry.register(Box::new(voice_raeume_aktiv.clone()))?;

        let nachrichten_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_nachrichten_total",
            "Gesamtanzahl verteilter Chat-Nachrichten",
        ))?;
        registry.register(Box::new(nachrichten_total.clone()))?;

        let signale_total = IntCounterVec::new(
            Opts::new(
                "treffpunkt_signale_total",
                "Gesamtanzahl weitergeleiteter Signaling-Umschlaege",
            ),
            &["art"],
        )?;
        registry.register(Box::new(signale_total.clone()))?;

        let ankuendigungen_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_ankuendigungen_total",
            "Gesamtanzahl globaler Aenderungs-Signale",
        ))?;
        registry.register(Box::new(ankuendigungen_total.clone()))?;

        let speicher_fehler_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_speicher_fehler_total",
            "Gesamtanzahl fehlgeschlagener Speicherzugriffe",
        ))?;
        registry.register(Box::new(speicher_fehler_total.clone()))?;

        let speicher_ausfaelle_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_speicher_ausfaelle_total",
            "Voruebergehende Speicherausfaelle (Pool erschoepft, IO)",
        ))?;
        registry.register(Box::new(speicher_ausfaelle_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            verbindungen,
            voice_raeume_aktiv,
            nachrichten_total,
            signale_total,
            ankuendigungen_total,
            speicher_fehler_total,
            speicher_ausfaelle_total,
        })
    }

    /// Zaehlt einen weitergeleiteten Signaling-Umschlag
    pub fn signal_zaehlen(&self, art: &str) {
        self.signale_total.with_label_values(&[art]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: TreffpunktMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<TreffpunktMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_verbindungen_setzen() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.verbindungen.inc();
        metriken.verbindungen.inc();
        metriken.verbindungen.dec();
        assert_eq!(metriken.verbindungen.get(), 1);
    }

    #[test]
    fn signale_mit_labels() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.signal_zaehlen("offer");
        metriken.signal_zaehlen("offer");
        metriken.signal_zaehlen("answer");
        assert_eq!(metriken.signale_total.with_label_values(&["offer"]).get(), 2);
        assert_eq!(metriken.signale_total.with_label_values(&["answer"]).get(), 1);
    }

    #[test]
    fn klone_teilen_zaehler() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        let klon = metriken.clone();
        klon.nachrichten_total.inc();
        assert_eq!(metriken.nachrichten_total.get(), 1);
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.verbindungen.set(5);
        metriken.ankuendigungen_total.inc();

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("treffpunkt_verbindungen 5"));
        assert!(output.contains("treffpunkt_ankuendigungen_total 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn alle_metriken_in_registry_registriert() {
        let metriken = TreffpunktMetrics::neu().unwrap();

        // Vec-Metriken erscheinen in gather() erst nach dem ersten Label-Zugriff
        metriken.signal_zaehlen("iceCandidate");

        let families = metriken.registry.gather();
        let namen: Vec<&str> = families.iter().map(|f| f.get_name()).collect();

        assert!(namen.contains(&"treffpunkt_verbindungen"));
        assert!(namen.contains(&"treffpunkt_voice_raeume_aktiv"));
        assert!(namen.contains(&"treffpunkt_nachrichten_total"));
        assert!(namen.contains(&"treffpunkt_signale_total"));
        assert!(namen.contains(&"treffpunkt_ankuendigungen_total"));
        assert!(namen.contains(&"treffpunkt_speicher_fehler_total"));
        assert!(namen.contains(&"treffpunkt_speicher_ausfaelle_total"));
    }
}
