//! treffpunkt-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Treffpunkt-Crates gemeinsam genutzt werden.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::TreffpunktError;
pub use event::ChangeAnnouncer;
pub use types::{ChannelId, ConnectionId};
