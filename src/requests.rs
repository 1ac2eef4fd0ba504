use serde::{
    Deserialize,
    Serialize
};

use crate::session::{
    messages::MessageKind,
    ParticipantId
};

/// Line sent by a participant to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayRequest {
    Ping {
        payload: Option<String>
    },
    Send {
        kind: MessageKind,
        payload: Vec<u8>,
    },
}

/// Line sent by the relay to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayEvent {
    Welcome {
        participant_id: ParticipantId
    },
    ParticipantJoined {
        participant_id: ParticipantId
    },
    ParticipantLeft {
        participant_id: ParticipantId
    },
    Message {
        kind: MessageKind,
        payload: Vec<u8>,
    },
    Pong {
        payload: Option<String>
    },
    BadRequest {
        err: String
    },
}

#[test]
fn test_request_wire_format() {
    let request = RelayRequest::Send { kind: MessageKind::MenuAction, payload: vec![1, 2] };
    let line = serde_json::to_string(&request).unwrap();
    assert_eq!(line, r#"{"type":"Send","kind":"MenuAction","payload":[1,2]}"#);
    assert_eq!(serde_json::from_str::<RelayRequest>(&line).unwrap(), request);
}

#[test]
fn test_event_wire_format() {
    let line = r#"{"type":"Welcome","participant_id":3}"#;
    assert_eq!(serde_json::from_str::<RelayEvent>(line).unwrap(), RelayEvent::Welcome { participant_id: 3 });
}
