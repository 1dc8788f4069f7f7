//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;
use treffpunkt_core::TreffpunktError;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Datenbank-Fehler: {0}")]
    DatenbankFehler(#[from] treffpunkt_db::DbError),
}

pub type ChatResult<T> = Result<T, ChatError>;

impl ChatError {
    /// Gibt true zurueck wenn der Speicher nur voruebergehend ausgefallen ist
    pub fn ist_voruebergehend(&self) -> bool {
        match self {
            Self::DatenbankFehler(db) => db.ist_voruebergehend(),
            Self::UngueltigeEingabe(_) => false,
        }
    }
}

impl From<ChatError> for TreffpunktError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::UngueltigeEingabe(msg) => TreffpunktError::UngueltigeNachricht(msg),
            ChatError::DatenbankFehler(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treffpunkt_db::DbError;

    #[test]
    fn voruebergehend_nur_bei_speicherausfall() {
        assert!(ChatError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut)).ist_voruebergehend());
        assert!(!ChatError::from(DbError::intern("kaputt")).ist_voruebergehend());
        assert!(!ChatError::UngueltigeEingabe("leer".into()).ist_voruebergehend());
    }
}
