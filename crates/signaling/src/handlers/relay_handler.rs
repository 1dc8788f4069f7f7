//! Relay-Handler – Offer, Answer, ICE an die Ziel-Verbindung

use std::sync::Arc;

use treffpunkt_core::ConnectionId;
use treffpunkt_db::MessageRepository;
use treffpunkt_protocol::{AnswerRequest, IceCandidateRequest, OfferRequest};

use crate::relay::{self, SignalArt};
use crate::server_state::SignalingState;

pub fn handle_offer<R: MessageRepository>(
    anfrage: OfferRequest,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    relay::offer_weiterleiten(&state.sessions, connection_id, anfrage);
    state.metriken.signal_zaehlen(SignalArt::Offer.als_str());
}

pub fn handle_answer<R: MessageRepository>(
    anfrage: AnswerRequest,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    relay::answer_weiterleiten(&state.sessions, connection_id, anfrage);
    state.metriken.signal_zaehlen(SignalArt::Answer.als_str());
}

pub fn handle_ice_candidate<R: MessageRepository>(
    anfrage: IceCandidateRequest,
    connection_id: ConnectionId,
    state: &Arc<SignalingState<R>>,
) {
    relay::ice_weiterleiten(&state.sessions, connection_id, anfrage);
    state.metriken.signal_zaehlen(SignalArt::IceCandidate.als_str());
}
