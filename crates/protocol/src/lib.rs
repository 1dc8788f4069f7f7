//! treffpunkt-protocol – Echtzeit-Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Ereignisse und Nutzlasten die ueber die
//! WebSocket-Verbindung zwischen Client und Server ausgetauscht werden.

pub mod events;

pub use events::{
    AnswerRequest, ClientEvent, IceCandidateRequest, MessagePayload, OfferRequest, ServerEvent,
    StoredMessage, VoiceJoinRequest, VoiceMember,
};
