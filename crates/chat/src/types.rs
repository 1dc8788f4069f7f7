//! Abbildung zwischen Wire-Nutzlasten und Datenbank-Records
//!
//! String-Werte der bekannten Felder landen in ihren Spalten. Alles andere
//! (`null`, Zahlen, Objekte, unbekannte Felder) bleibt unter dem
//! Original-Schluessel in `extra`, damit die History die Nutzlast so
//! zurueckgibt, wie sie empfangen wurde.

use serde_json::{Map, Value};
use treffpunkt_db::{NachrichtRecord, NeueNachricht};
use treffpunkt_protocol::{MessagePayload, StoredMessage};

/// Wire-Name des Felds fuer die Anzeige-Uhrzeit
const ZEIT_FELD: &str = "time";

/// Wandelt eine empfangene Nutzlast in einen neuen Datensatz
pub fn payload_zu_neuer_nachricht(payload: &MessagePayload) -> NeueNachricht {
    let mut extra = payload.felder.clone();
    NeueNachricht {
        channel_id: payload.room_id.clone(),
        body: text_spalte(&mut extra, "body"),
        image: text_spalte(&mut extra, "image"),
        sender: text_spalte(&mut extra, "sender"),
        avatar: text_spalte(&mut extra, "avatar"),
        display_time: text_spalte(&mut extra, ZEIT_FELD),
        extra,
    }
}

/// Wandelt einen gespeicherten Datensatz in die History-Darstellung
pub fn record_zu_gespeicherter(record: NachrichtRecord) -> StoredMessage {
    let mut felder = record.extra;
    let spalten = [
        ("body", record.body),
        ("image", record.image),
        ("sender", record.sender),
        ("avatar", record.avatar),
        (ZEIT_FELD, record.display_time),
    ];
    for (name, wert) in spalten {
        if let Some(text) = wert {
            felder.insert(name.to_owned(), Value::String(text));
        }
    }

    let payload = MessagePayload {
        room_id: record.channel_id,
        felder,
    };
    StoredMessage::neu(record.id.to_string(), payload, record.created_at)
}

/// Nimmt einen String-Wert aus den Feldern; andere Werte bleiben liegen
fn text_spalte(felder: &mut Map<String, Value>, name: &str) -> Option<String> {
    match felder.remove(name) {
        Some(Value::String(text)) => Some(text),
        Some(anderer) => {
            felder.insert(name.to_owned(), anderer);
            None
        }
        None => None,
    }
}
