//! SQLite-Implementierung des MessageRepository

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use treffpunkt_core::ChannelId;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NachrichtRecord, NeueNachricht};
use crate::repository::{DbResult, MessageRepository};
use crate::sqlite::pool::SqliteDb;

impl MessageRepository for SqliteDb {
    async fn find_recent(
        &self,
        channel_id: &ChannelId,
        limit: i64,
    ) -> DbResult<Vec<NachrichtRecord>> {
        // rowid bricht Gleichstaende innerhalb derselben Mikrosekunde
        let rows = sqlx::query(
            "SELECT id, channel_id, body, image, sender, avatar,
                    display_time, extra, created_at
             FROM messages
             WHERE channel_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(channel_id.als_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Chronologisch sortieren (aelteste zuerst)
        let mut records: Vec<NachrichtRecord> =
            rows.iter().map(row_to_nachricht).collect::<DbResult<_>>()?;
        records.reverse();
        Ok(records)
    }

    async fn insert(&self, data: NeueNachricht) -> DbResult<NachrichtRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        let extra_str = serde_json::to_string(&data.extra)?;

        sqlx::query(
            "INSERT INTO messages
             (id, channel_id, body, image, sender, avatar, display_time, extra, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.channel_id.als_str())
        .bind(&data.body)
        .bind(&data.image)
        .bind(&data.sender)
        .bind(&data.avatar)
        .bind(&data.display_time)
        .bind(&extra_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(NachrichtRecord {
            id,
            channel_id: data.channel_id,
            body: data.body,
            image: data.image,
            sender: data.sender,
            avatar: data.avatar,
            display_time: data.display_time,
            extra: data.extra,
            created_at: now,
        })
    }

    async fn delete_for_channel(&self, channel_id: &ChannelId) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM messages WHERE channel_id = ?")
            .bind(channel_id.als_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(channel_id = %channel_id, anzahl = affected, "Kanal-Nachrichten geloescht");
        Ok(affected)
    }

    async fn backfill_avatar(&self, sender: &str, avatar: &str) -> DbResult<u64> {
        let affected = sqlx::query("UPDATE messages SET avatar = ? WHERE sender = ?")
            .bind(avatar)
            .bind(sender)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(sender, anzahl = affected, "Avatar nachgetragen");
        Ok(affected)
    }
}

pub(crate) fn row_to_nachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<NachrichtRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige Nachrichten-UUID '{id_str}': {e}")))?;

    let channel_str: String = row.try_get("channel_id")?;

    let extra_str: String = row.try_get("extra")?;
    let extra = match serde_json::from_str::<Value>(&extra_str)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        andere => {
            return Err(DbError::UngueltigeDaten(format!(
                "extra ist kein JSON-Objekt: {andere}"
            )))
        }
    };

    Ok(NachrichtRecord {
        id,
        channel_id: ChannelId(channel_str),
        body: row.try_get("body")?,
        image: row.try_get("image")?,
        sender: row.try_get("sender")?,
        avatar: row.try_get("avatar")?,
        display_time: row.try_get("display_time")?,
        extra,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

fn parse_timestamp(s: String) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .or_else(|_| {
            // Fallback fuer SQLite datetime()-Format
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc().fixed_offset())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige Zeitangabe '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeitstempel_rfc3339_mit_mikrosekunden() {
        let ts = parse_timestamp("2024-03-01T12:00:00.123456Z".into()).unwrap();
        assert_eq!(ts.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn zeitstempel_sqlite_format() {
        let ts = parse_timestamp("2024-03-01 12:00:00".into()).unwrap();
        assert_eq!(ts.to_rfc3339_opts(SecondsFormat::Secs, true), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn ungueltiger_zeitstempel() {
        assert!(parse_timestamp("gestern".into()).is_err());
    }
}
