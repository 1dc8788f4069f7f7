//! treffpunkt-signaling – Echtzeit-Session- und Signaling-Schicht
//!
//! Dieser Crate verwaltet WebSocket-Verbindungen, gebundene Identitaeten,
//! Text-Raum-Zugehoerigkeit und Voice-Praesenz und leitet WebRTC-Signaling
//! (Offer, Answer, ICE) zwischen Verbindungen weiter.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket (SignalingServer, GET /ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! EventDispatcher
//!     |
//!     +-- AuthHandler   (login)
//!     +-- ChatHandler   (joinTextRoom, sendMessage)
//!     +-- VoiceHandler  (joinVoice, leaveVoice)
//!     +-- RelayHandler  (offer, answer, iceCandidate)
//!
//! SessionManager   – Registry, Raeume, Voice-Praesenz hinter einem Lock
//! EventBroadcaster – Send-Queues aller Verbindungen
//! ChangeNotifier   – globales "neu laden"-Signal fuer die CRUD-Schicht
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod server;
pub mod server_state;
pub mod session;
pub mod voice;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::EventDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use notifier::ChangeNotifier;
pub use server::SignalingServer;
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{SessionManager, SessionStatistik};
