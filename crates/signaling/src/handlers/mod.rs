//! Handler fuer alle Client-Ereignisse
//!
//! Jeder Handler ist fuer einen Bereich zustaendig und hat Zugriff auf den
//! gemeinsamen SignalingState.

pub mod auth_handler;
pub mod chat_handler;
pub mod relay_handler;
pub mod voice_handler;
