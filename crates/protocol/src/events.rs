//! Echtzeit-Ereignisse (WebSocket)
//!
//! Jedes Frame ist ein JSON-Textframe der Form
//! `{"event": "<name>", "data": <nutzlast>}`.
//!
//! ## Design
//! - Kein Request/Response: Ereignisse sind fire-and-forget
//! - Adjacently tagged Enums fuer typsichere Ereignistypen
//! - Signaling-Nutzlasten (SDP, ICE) bleiben undurchsichtiges JSON

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use treffpunkt_core::types::{ChannelId, ConnectionId};

// ---------------------------------------------------------------------------
// Nachrichten
// ---------------------------------------------------------------------------

/// Nutzlast einer Chat-Nachricht, wie sie der Client sendet
///
/// Nur `roomId` ist typisiert (Routing-Schluessel). Alle anderen Felder
/// (`body`, `image`, `sender`, `avatar`, `time`, ...) bleiben rohes JSON und
/// werden ungeprueft weiterverteilt und gespeichert, `null` eingeschlossen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub room_id: ChannelId,
    #[serde(flatten)]
    pub felder: Map<String, Value>,
}

impl MessagePayload {
    /// Minimale Nutzlast mit Raum und Text
    pub fn text(room_id: impl Into<ChannelId>, body: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            felder: Map::new(),
        }
        .mit_feld("body", body.into())
    }

    /// Setzt ein Feld und gibt die Nutzlast zurueck
    pub fn mit_feld(mut self, name: &str, wert: impl Into<Value>) -> Self {
        self.felder.insert(name.to_owned(), wert.into());
        self
    }

    pub fn feld(&self, name: &str) -> Option<&Value> {
        self.felder.get(name)
    }

    /// Feldwert, falls vorhanden und ein String
    pub fn text_feld(&self, name: &str) -> Option<&str> {
        self.felder.get(name).and_then(Value::as_str)
    }
}

/// Persistierte Nachricht, wie sie in der History ausgeliefert wird
///
/// `id` und `createdAt` vergibt der Server; gleichnamige Client-Felder
/// werden beim Erstellen verworfen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    #[serde(flatten)]
    pub payload: MessagePayload,
    pub created_at: DateTime<Utc>,
}

/// Schluessel, die in der History dem Server gehoeren
const SERVER_FELDER: [&str; 2] = ["id", "createdAt"];

impl StoredMessage {
    pub fn neu(
        id: impl Into<String>,
        mut payload: MessagePayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        for name in SERVER_FELDER {
            payload.felder.remove(name);
        }
        Self {
            id: id.into(),
            payload,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// Voice-Kanal beitreten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceJoinRequest {
    pub channel_id: ChannelId,
    pub display_name: String,
}

/// Eintrag im Voice-Roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMember {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Signaling
// ---------------------------------------------------------------------------

/// SDP-Offer an eine Ziel-Verbindung
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub target: ConnectionId,
    pub sdp: Value,
    /// Optionaler Anzeigename; fehlt er, wird die gebundene Identitaet verwendet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// SDP-Answer an eine Ziel-Verbindung
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub target: ConnectionId,
    pub sdp: Value,
}

/// ICE-Kandidat an eine Ziel-Verbindung
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateRequest {
    pub target: ConnectionId,
    pub candidate: Value,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Alle Ereignisse die ein Client senden darf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Identitaet an die Verbindung binden
    Login(String),
    /// Text-Raum wechseln
    JoinTextRoom(ChannelId),
    /// Nachricht senden
    SendMessage(MessagePayload),
    /// Voice-Kanal beitreten
    JoinVoice(VoiceJoinRequest),
    /// Voice-Kanal verlassen
    LeaveVoice(ChannelId),
    Offer(OfferRequest),
    Answer(AnswerRequest),
    IceCandidate(IceCandidateRequest),
}

impl ClientEvent {
    /// Deserialisiert ein Ereignis aus einem Textframe
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Kurzer Name fuer Logs
    pub fn art(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::JoinTextRoom(_) => "joinTextRoom",
            Self::SendMessage(_) => "sendMessage",
            Self::JoinVoice(_) => "joinVoice",
            Self::LeaveVoice(_) => "leaveVoice",
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "iceCandidate",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Alle Ereignisse die der Server an Clients verschickt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Erstes Ereignis jeder Verbindung: die eigene Zustelladresse
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },
    /// Vollstaendige Liste aller gebundenen Identitaeten
    RosterUpdated(Vec<String>),
    /// Letzte Nachrichten eines Raums (nur an den Beitretenden)
    History(Vec<StoredMessage>),
    /// Neue Nachricht im Raum
    Message(MessagePayload),
    /// Ein neuer Teilnehmer ist dem Voice-Kanal beigetreten (Punkt-Ereignis)
    #[serde(rename_all = "camelCase")]
    PeerJoinedVoice {
        connection_id: ConnectionId,
        display_name: String,
    },
    /// Vollstaendiges Roster eines Voice-Kanals
    #[serde(rename_all = "camelCase")]
    VoiceRosterUpdated {
        channel_id: ChannelId,
        members: Vec<VoiceMember>,
    },
    /// Ein Teilnehmer hat den Voice-Kanal verlassen (Punkt-Ereignis)
    #[serde(rename_all = "camelCase")]
    PeerLeftVoice { connection_id: ConnectionId },
    #[serde(rename_all = "camelCase")]
    Offer {
        sdp: Value,
        sender: ConnectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Answer { sdp: Value, sender: ConnectionId },
    IceCandidate {
        candidate: Value,
        sender: ConnectionId,
    },
    /// Globales Aenderungs-Signal ohne Nutzlast
    Announce,
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn login_aus_json() {
        let ev = ClientEvent::from_json(r#"{"event":"login","data":"alice"}"#).unwrap();
        assert_eq!(ev, ClientEvent::Login("alice".into()));
        assert_eq!(ev.art(), "login");
    }

    #[test]
    fn join_voice_aus_json() {
        let ev = ClientEvent::from_json(
            r#"{"event":"joinVoice","data":{"channelId":"v1","displayName":"Alice"}}"#,
        )
        .unwrap();
        match ev {
            ClientEvent::JoinVoice(req) => {
                assert_eq!(req.channel_id, ChannelId::neu("v1"));
                assert_eq!(req.display_name, "Alice");
            }
            andere => panic!("Erwartet JoinVoice, erhalten {andere:?}"),
        }
    }

    #[test]
    fn nachricht_behaelt_unbekannte_felder() {
        let roh = json!({
            "event": "sendMessage",
            "data": { "roomId": "general", "body": "hi", "reaktion": ":)" }
        });
        let ev: ClientEvent = serde_json::from_value(roh).unwrap();
        let ClientEvent::SendMessage(payload) = ev else {
            panic!("Erwartet SendMessage");
        };
        assert_eq!(payload.room_id, ChannelId::neu("general"));
        assert_eq!(payload.text_feld("body"), Some("hi"));
        assert_eq!(payload.feld("reaktion"), Some(&json!(":)")));

        // Weiterverteilung erzeugt exakt die empfangene Nutzlast
        let weiter = serde_json::to_value(ServerEvent::Message(payload)).unwrap();
        assert_eq!(
            weiter,
            json!({
                "event": "message",
                "data": { "roomId": "general", "body": "hi", "reaktion": ":)" }
            })
        );
    }

    #[test]
    fn nachricht_mit_null_und_zahl_bleibt_identisch() {
        let daten = json!({ "roomId": "general", "body": 42, "image": null, "sender": "alice" });
        let ev: ClientEvent =
            serde_json::from_value(json!({ "event": "sendMessage", "data": daten.clone() })).unwrap();
        let ClientEvent::SendMessage(payload) = ev else {
            panic!("Erwartet SendMessage");
        };
        assert_eq!(payload.feld("body"), Some(&json!(42)));
        assert_eq!(payload.feld("image"), Some(&Value::Null));
        assert!(payload.text_feld("body").is_none());

        let weiter = serde_json::to_value(ServerEvent::Message(payload)).unwrap();
        assert_eq!(weiter, json!({ "event": "message", "data": daten }));
    }

    #[test]
    fn gespeicherte_nachricht_hat_nur_server_id() {
        let payload = MessagePayload::text("general", "hi")
            .mit_feld("id", "vom-client")
            .mit_feld("createdAt", 0);
        let zeit = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let gespeichert = StoredMessage::neu("server-id", payload, zeit);

        let json = serde_json::to_string(&gespeichert).unwrap();
        assert_eq!(json.matches("\"id\"").count(), 1);
        assert_eq!(json.matches("\"createdAt\"").count(), 1);

        let wert: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(wert["id"], "server-id");
        assert_eq!(wert["createdAt"], "2024-03-01T12:00:00Z");
        assert_eq!(wert["body"], "hi");
    }

    #[test]
    fn nachricht_ohne_raum_wird_abgelehnt() {
        let ergebnis =
            ClientEvent::from_json(r#"{"event":"sendMessage","data":{"body":"hi"}}"#);
        assert!(ergebnis.is_err());
    }

    #[test]
    fn offer_mit_undurchsichtigem_sdp() {
        let ziel = ConnectionId(Uuid::nil());
        let json = format!(
            r#"{{"event":"offer","data":{{"target":"{}","sdp":{{"type":"offer","sdp":"v=0"}}}}}}"#,
            ziel.inner()
        );
        let ev = ClientEvent::from_json(&json).unwrap();
        let ClientEvent::Offer(req) = ev else {
            panic!("Erwartet Offer");
        };
        assert_eq!(req.target, ziel);
        assert_eq!(req.sdp, json!({"type": "offer", "sdp": "v=0"}));
        assert!(req.display_name.is_none());
    }

    #[test]
    fn announce_hat_keine_nutzlast() {
        let json = ServerEvent::Announce.to_json().unwrap();
        assert_eq!(json, r#"{"event":"announce"}"#);
    }

    #[test]
    fn peer_joined_feldnamen() {
        let ev = ServerEvent::PeerJoinedVoice {
            connection_id: ConnectionId(Uuid::nil()),
            display_name: "Bob".into(),
        };
        let wert = serde_json::to_value(&ev).unwrap();
        assert_eq!(wert["event"], "peerJoinedVoice");
        assert_eq!(wert["data"]["displayName"], "Bob");
        assert_eq!(
            wert["data"]["connectionId"],
            "00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn roster_update_ist_liste() {
        let ev = ServerEvent::RosterUpdated(vec!["alice".into(), "bob".into()]);
        let zurueck = ServerEvent::from_json(&ev.to_json().unwrap()).unwrap();
        assert_eq!(zurueck, ev);
    }
}
