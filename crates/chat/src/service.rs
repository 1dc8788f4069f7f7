//! ChatService – Nachrichten persistieren und History laden

use std::sync::Arc;

use treffpunkt_core::ChannelId;
use treffpunkt_db::MessageRepository;
use treffpunkt_protocol::{MessagePayload, StoredMessage};

use crate::{
    error::{ChatError, ChatResult},
    types::{payload_zu_neuer_nachricht, record_zu_gespeicherter},
};

/// ChatService verwaltet die persistierten Nachrichten der Text-Raeume
pub struct ChatService<R: MessageRepository> {
    repo: Arc<R>,
    history_limit: u32,
}

impl<R: MessageRepository> ChatService<R> {
    /// Erstellt einen neuen ChatService
    pub fn neu(repo: Arc<R>, history_limit: u32) -> Arc<Self> {
        Arc::new(Self {
            repo,
            history_limit,
        })
    }

    pub fn history_limit(&self) -> u32 {
        self.history_limit
    }

    /// Persistiert eine empfangene Nachricht unveraendert
    pub async fn nachricht_persistieren(
        &self,
        payload: &MessagePayload,
    ) -> ChatResult<StoredMessage> {
        let record = self.repo.insert(payload_zu_neuer_nachricht(payload)).await?;

        tracing::debug!(
            channel_id = %record.channel_id,
            nachricht_id = %record.id,
            "Nachricht persistiert"
        );

        Ok(record_zu_gespeicherter(record))
    }

    /// Laedt die neuesten Nachrichten eines Raums, aelteste zuerst
    pub async fn letzte_nachrichten(&self, channel_id: &ChannelId) -> ChatResult<Vec<StoredMessage>> {
        if self.history_limit == 0 {
            return Ok(Vec::new());
        }

        let records = self
            .repo
            .find_recent(channel_id, i64::from(self.history_limit))
            .await?;

        Ok(records.into_iter().map(record_zu_gespeicherter).collect())
    }

    /// Loescht alle Nachrichten eines Kanals
    pub async fn kanal_leeren(&self, channel_id: &ChannelId) -> ChatResult<u64> {
        if channel_id.als_str().is_empty() {
            return Err(ChatError::UngueltigeEingabe("Kanal-ID darf nicht leer sein".into()));
        }
        let anzahl = self.repo.delete_for_channel(channel_id).await?;
        tracing::info!(channel_id = %channel_id, anzahl, "Kanal geleert");
        Ok(anzahl)
    }

    /// Ersetzt den Avatar-Snapshot in allen Nachrichten eines Absenders
    pub async fn avatar_nachtragen(&self, sender: &str, avatar: &str) -> ChatResult<u64> {
        if sender.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe("Absender darf nicht leer sein".into()));
        }
        let anzahl = self.repo.backfill_avatar(sender, avatar).await?;
        tracing::info!(sender, anzahl, "Avatar in Nachrichten nachgetragen");
        Ok(anzahl)
    }
}
