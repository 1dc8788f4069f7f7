//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;
use treffpunkt_core::TreffpunktError;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler am Speicher selbst liegt
    /// (Pool erschoepft, Verbindung weg, IO) und nicht an den Daten
    pub fn ist_voruebergehend(&self) -> bool {
        matches!(
            self,
            Self::Sqlx(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

impl From<DbError> for TreffpunktError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UngueltigeDaten(msg) => TreffpunktError::UngueltigeNachricht(msg),
            voruebergehend if voruebergehend.ist_voruebergehend() => {
                TreffpunktError::Speicher(voruebergehend.to_string())
            }
            andere => TreffpunktError::Intern(andere.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_ist_voruebergehend() {
        assert!(DbError::Sqlx(sqlx::Error::PoolTimedOut).ist_voruebergehend());
        assert!(!DbError::intern("kaputt").ist_voruebergehend());
    }

    #[test]
    fn umwandlung_in_core_fehler() {
        let e: TreffpunktError = DbError::Sqlx(sqlx::Error::PoolClosed).into();
        assert!(matches!(e, TreffpunktError::Speicher(_)));

        let e: TreffpunktError = DbError::intern("kaputte Zeile").into();
        assert!(matches!(e, TreffpunktError::Intern(_)));

        let e: TreffpunktError = DbError::UngueltigeDaten("extra".into()).into();
        assert!(matches!(e, TreffpunktError::UngueltigeNachricht(_)));
    }
}
