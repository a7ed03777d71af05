//! Diagram editor message types
//!
//! Wire format (JSON, one object per message):
//! ```text
//! host -> editor   {"action":"load","xml":"<mxfile/>","autosave":1}
//! editor -> host   {"event":"init"}
//!                  {"event":"save","xml":"..."}
//!                  {"event":"autosave","xml":"..."}
//!                  {"event":"exit"}
//! ```
//!
//! Anything else the editor emits is not part of the recognized set and
//! fails to decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ChannelError, EndpointId, MessageError};

/// Message as delivered by the transport: raw text or an already parsed
/// JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// Unparsed text.
    Text(String),
    /// Pre-parsed JSON.
    Json(Value),
}

impl From<String> for RawMessage {
    fn from(text: String) -> Self {
        RawMessage::Text(text)
    }
}

impl From<&str> for RawMessage {
    fn from(text: &str) -> Self {
        RawMessage::Text(text.to_owned())
    }
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        RawMessage::Json(value)
    }
}

/// A message on the host bus together with the endpoint that sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Sending endpoint, `None` if the transport could not tell.
    pub source: Option<EndpointId>,
    /// Message body.
    pub data: RawMessage,
}

impl Envelope {
    /// Create an envelope from a known source.
    pub fn new(source: EndpointId, data: impl Into<RawMessage>) -> Self {
        Self {
            source: Some(source),
            data: data.into(),
        }
    }

    /// Create an envelope whose source is unknown.
    pub fn anonymous(data: impl Into<RawMessage>) -> Self {
        Self {
            source: None,
            data: data.into(),
        }
    }
}

/// Events the editor sends to the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EditorEvent {
    /// The editor finished loading and waits for `load`.
    Init,
    /// The user saved the diagram.
    Save {
        /// Diagram XML.
        xml: String,
    },
    /// The editor's own autosave tick.
    Autosave {
        /// Diagram XML.
        xml: String,
    },
    /// The user closed the editor.
    Exit,
}

impl EditorEvent {
    /// Decode a raw message.
    ///
    /// `save`/`autosave` without a non-empty `xml` are rejected.
    pub fn parse(raw: &RawMessage) -> Result<Self, MessageError> {
        let event = match raw {
            RawMessage::Text(text) => serde_json::from_str(text)?,
            RawMessage::Json(value) => EditorEvent::deserialize(value)?,
        };
        match &event {
            EditorEvent::Save { xml } | EditorEvent::Autosave { xml } if xml.is_empty() => {
                Err(MessageError::EmptyPayload(event.name()))
            }
            _ => Ok(event),
        }
    }

    /// Tag of this event on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::Init => "init",
            EditorEvent::Save { .. } => "save",
            EditorEvent::Autosave { .. } => "autosave",
            EditorEvent::Exit => "exit",
        }
    }
}

/// Actions the host sends to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum HostAction {
    /// Load a diagram into the editor.
    Load {
        /// Diagram XML, empty for a blank diagram.
        xml: String,
        /// 1 to make the editor emit `autosave` events, 0 otherwise.
        autosave: u8,
    },
}

impl HostAction {
    /// Build a `load` action.
    pub fn load(xml: impl Into<String>, autosave: bool) -> Self {
        HostAction::Load {
            xml: xml.into(),
            autosave: u8::from(autosave),
        }
    }

    /// Encode for the wire.
    pub fn encode(&self) -> Result<String, ChannelError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_events() {
        let init = RawMessage::from(r#"{"event":"init"}"#);
        assert_eq!(EditorEvent::parse(&init).unwrap(), EditorEvent::Init);

        let save = RawMessage::from(r#"{"event":"save","xml":"<mxfile/>","modified":true}"#);
        assert_eq!(
            EditorEvent::parse(&save).unwrap(),
            EditorEvent::Save {
                xml: "<mxfile/>".into()
            }
        );

        let exit = RawMessage::from(r#"{"event":"exit","modified":false}"#);
        assert_eq!(EditorEvent::parse(&exit).unwrap(), EditorEvent::Exit);
    }

    #[test]
    fn test_parse_preparsed_value() {
        let raw = RawMessage::from(json!({"event": "autosave", "xml": "<g/>"}));
        assert_eq!(
            EditorEvent::parse(&raw).unwrap(),
            EditorEvent::Autosave { xml: "<g/>".into() }
        );
    }

    #[test]
    fn test_parse_rejects_off_protocol_messages() {
        for text in [
            "not json",
            r#"{"action":"load"}"#,
            r#"{"event":"configure"}"#,
            r#"{"event":"save"}"#,
            r#""init""#,
        ] {
            let raw = RawMessage::from(text);
            assert!(
                matches!(EditorEvent::parse(&raw), Err(MessageError::Malformed(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        let raw = RawMessage::from(r#"{"event":"autosave","xml":""}"#);
        assert!(matches!(
            EditorEvent::parse(&raw),
            Err(MessageError::EmptyPayload("autosave"))
        ));
    }

    #[test]
    fn test_encode_load() {
        let encoded = HostAction::load("<mxfile/>", true).encode().unwrap();
        assert_eq!(encoded, r#"{"action":"load","xml":"<mxfile/>","autosave":1}"#);

        let encoded = HostAction::load("", false).encode().unwrap();
        assert_eq!(encoded, r#"{"action":"load","xml":"","autosave":0}"#);
    }
}
