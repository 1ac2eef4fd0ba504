use crate::{
    requests::{RelayEvent, RelayRequest},
    session::ParticipantId
};

use super::roster::{lock_roster, SharedRoster};

/// Handles one request line. Returns the reply addressed to the requester, if any.
pub fn route_relay_request(
    participant_id: ParticipantId,
    request_str: &str,
    roster: &SharedRoster
) -> Option<RelayEvent> {
    match serde_json::from_str::<RelayRequest>(request_str) {
        Ok(req) => match req {
            RelayRequest::Ping { payload } => {
                Some(RelayEvent::Pong { payload })
            },
            RelayRequest::Send { kind, payload } => {
                log::trace!("Relaying {kind:?} ({} bytes) from {participant_id}", payload.len());
                lock_roster(roster).broadcast_except(participant_id, RelayEvent::Message { kind, payload });
                None
            },
        },
        Err(e) => Some(RelayEvent::BadRequest { err: format!("request={request_str}, reason={e}") }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::app::server::roster::SessionRoster;

    #[test]
    fn test_ping_answers_requester() {
        let roster: SharedRoster = Arc::new(Mutex::new(SessionRoster::new()));
        let reply = route_relay_request(1, r#"{"type":"Ping","payload":"hi"}"#, &roster);
        assert_eq!(reply, Some(RelayEvent::Pong { payload: Some("hi".to_string()) }));
    }

    #[test]
    fn test_garbage_is_bad_request() {
        let roster: SharedRoster = Arc::new(Mutex::new(SessionRoster::new()));
        let reply = route_relay_request(1, "not json", &roster);
        assert!(matches!(reply, Some(RelayEvent::BadRequest { .. })));
    }

    #[test]
    fn test_send_fans_out() {
        let roster: SharedRoster = Arc::new(Mutex::new(SessionRoster::new()));
        let (a_tx, _a_rx) = tokio::sync::mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = tokio::sync::mpsc::unbounded_channel();
        lock_roster(&roster).join(1, a_tx);
        lock_roster(&roster).join(2, b_tx);
        while b_rx.try_recv().is_ok() {}

        let reply = route_relay_request(1, r#"{"type":"Send","kind":"PresenterId","payload":[7]}"#, &roster);
        assert!(reply.is_none());
        assert!(matches!(b_rx.try_recv(), Ok(RelayEvent::Message { payload, .. }) if payload == vec![7]));
    }
}
