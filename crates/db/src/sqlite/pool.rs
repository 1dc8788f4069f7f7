//! SQLite-Pool fuer den Nachrichten-Speicher
//!
//! Datei-Datenbanken laufen je nach Konfiguration im WAL-Modus. Die
//! In-Memory-Variante haelt genau eine Verbindung offen, sonst verschwindet
//! die Datenbank mit der letzten Verbindung.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::DatabaseConfig;

/// Wartezeit auf Schreibsperren anderer Verbindungen
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Nachrichten-Speicher auf SQLite
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet (oder erstellt) die Datenbank und migriert das Schema
    pub async fn oeffnen(config: &DatabaseConfig) -> Result<Self, DbError> {
        let journal = if config.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let verbindung = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(journal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new().max_connections(config.max_verbindungen);

        let db = Self::verbinden(verbindung, pool).await?;
        info!(
            url = %config.url,
            wal = config.sqlite_wal,
            max_verbindungen = config.max_verbindungen,
            "Nachrichten-Speicher geoeffnet"
        );
        Ok(db)
    }

    /// Fluechtige Datenbank fuer Tests
    pub async fn in_memory() -> Result<Self, DbError> {
        let verbindung = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1);
        Self::verbinden(verbindung, pool).await
    }

    async fn verbinden(
        verbindung: SqliteConnectOptions,
        pool: SqlitePoolOptions,
    ) -> Result<Self, DbError> {
        let db = Self {
            pool: pool.connect_with(verbindung).await?,
        };
        db.schema_migrieren().await?;
        Ok(db)
    }

    async fn schema_migrieren(&self) -> Result<(), DbError> {
        let migrator = sqlx::migrate!("./migrations");
        migrator.run(&self.pool).await?;
        debug!(migrationen = migrator.iter().count(), "Schema aktuell");
        Ok(())
    }

    /// Prueft ob die Datenbank erreichbar ist (fuer den Health-Check)
    pub async fn erreichbar(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Schliesst den Pool beim Herunterfahren
    pub async fn schliessen(&self) {
        self.pool.close().await;
        info!("Nachrichten-Speicher geschlossen");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn geschlossener_pool_ist_nicht_erreichbar() {
        let db = SqliteDb::in_memory().await.unwrap();
        assert!(db.erreichbar().await);

        db.schliessen().await;
        assert!(!db.erreichbar().await);
    }

    #[tokio::test]
    async fn oeffnen_ohne_wal() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_verbindungen: 1,
            sqlite_wal: false,
        };
        let db = SqliteDb::oeffnen(&config).await.unwrap();
        assert!(db.erreichbar().await);
    }
}
