//! JSON wire events exchanged over the WebSocket.
//!
//! Every frame is `{"event": "<name>", "data": {...}}`. The `data` object of a
//! `signal` event carries the SDP offer/answer or ICE candidate and is relayed
//! as an opaque value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Role;
use crate::registry::ConnectionHandle;
use crate::relay::RelayError;

/// Events sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinAsPatient(JoinRequest),
    JoinAsPractitioner(JoinRequest),
    Signal(SignalRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JoinRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignalRequest {
    pub session_id: Option<String>,
    /// Kept as a raw string so an unknown role is reported, not a parse error.
    pub sender_role: Option<String>,
    pub data: Value,
}

impl ClientEvent {
    /// Parse one text frame.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::MalformedMessage(e.to_string()))
    }

    /// Wire name, for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JoinAsPatient(_) => "join_as_patient",
            Self::JoinAsPractitioner(_) => "join_as_practitioner",
            Self::Signal(_) => "signal",
        }
    }
}

/// Events sent by the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected { sid: ConnectionHandle },
    Joined { role: Role, session_id: String },
    PatientJoined { session_id: String },
    PractitionerJoined { session_id: String },
    Signal { data: Value, from: Role },
    PeerDisconnected {},
    Error { message: String },
}

impl ServerEvent {
    /// Presence notice telling a peer that `role` just joined.
    pub fn peer_joined(role: Role, session_id: &str) -> Self {
        let session_id = session_id.to_string();
        match role {
            Role::Patient => Self::PatientJoined { session_id },
            Role::Practitioner => Self::PractitionerJoined { session_id },
        }
    }

    pub fn error(err: &RelayError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Joined { .. } => "joined",
            Self::PatientJoined { .. } => "patient_joined",
            Self::PractitionerJoined { .. } => "practitioner_joined",
            Self::Signal { .. } => "signal",
            Self::PeerDisconnected {} => "peer_disconnected",
            Self::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_join_as_patient() {
        let ev = ClientEvent::parse(r#"{"event":"join_as_patient","data":{"session_id":"s1"}}"#)
            .unwrap();
        assert_eq!(
            ev,
            ClientEvent::JoinAsPatient(JoinRequest {
                session_id: Some("s1".into())
            })
        );
        assert_eq!(ev.name(), "join_as_patient");
    }

    #[test]
    fn join_without_session_id_still_parses() {
        let ev = ClientEvent::parse(r#"{"event":"join_as_practitioner","data":{}}"#).unwrap();
        assert_eq!(ev, ClientEvent::JoinAsPractitioner(JoinRequest::default()));
    }

    #[test]
    fn parses_signal_with_opaque_payload() {
        let ev = ClientEvent::parse(
            r#"{"event":"signal","data":{"session_id":"s1","sender_role":"patient","data":{"type":"offer","sdp":"v=0"}}}"#,
        )
        .unwrap();
        let ClientEvent::Signal(req) = ev else {
            panic!("expected signal");
        };
        assert_eq!(req.session_id.as_deref(), Some("s1"));
        assert_eq!(req.sender_role.as_deref(), Some("patient"));
        assert_eq!(req.data, json!({"type": "offer", "sdp": "v=0"}));
    }

    #[test]
    fn unknown_event_is_malformed() {
        let err = ClientEvent::parse(r#"{"event":"leave","data":{}}"#).unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(_)));
        assert_eq!(err.to_string(), "Message invalide");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            ClientEvent::parse("hello"),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn server_events_use_wire_names() {
        let joined = ServerEvent::Joined {
            role: Role::Patient,
            session_id: "s1".into(),
        };
        assert_eq!(
            serde_json::to_value(&joined).unwrap(),
            json!({"event": "joined", "data": {"role": "patient", "session_id": "s1"}})
        );

        assert_eq!(
            serde_json::to_value(ServerEvent::PeerDisconnected {}).unwrap(),
            json!({"event": "peer_disconnected", "data": {}})
        );

        let signal = ServerEvent::Signal {
            data: json!({"candidate": "c"}),
            from: Role::Practitioner,
        };
        assert_eq!(
            serde_json::to_value(&signal).unwrap(),
            json!({"event": "signal", "data": {"data": {"candidate": "c"}, "from": "practitioner"}})
        );
    }

    #[test]
    fn peer_joined_names_the_joining_role() {
        assert_eq!(
            ServerEvent::peer_joined(Role::Patient, "s1").name(),
            "patient_joined"
        );
        assert_eq!(
            ServerEvent::peer_joined(Role::Practitioner, "s1").name(),
            "practitioner_joined"
        );
    }

    #[test]
    fn error_event_carries_user_message() {
        let ev = ServerEvent::error(&RelayError::MissingSessionId);
        assert_eq!(
            serde_json::to_value(&ev).unwrap(),
            json!({"event": "error", "data": {"message": "session_id requis"}})
        );
    }
}
