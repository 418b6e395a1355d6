use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier handed out by the service when a device is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    SwitchOn,
    SwitchOff,
    ChangeColor,
    PlaySong,
    Flush,
    Clean,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::SwitchOn => "SWITCH_ON",
            MessageType::SwitchOff => "SWITCH_OFF",
            MessageType::ChangeColor => "CHANGE_COLOR",
            MessageType::PlaySong => "PLAY_SONG",
            MessageType::Flush => "FLUSH",
            MessageType::Clean => "CLEAN",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instruction for one registered device. Pure data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    device_id: DeviceId,
    msg_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl Message {
    pub fn new(device_id: DeviceId, msg_type: MessageType) -> Self {
        Self {
            device_id,
            msg_type,
            data: None,
        }
    }

    pub fn with_data(device_id: DeviceId, msg_type: MessageType, data: impl Into<String>) -> Self {
        Self {
            device_id,
            msg_type,
            data: Some(data.into()),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// Ordered batch of messages dispatched concurrently by `IotService::run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program(Vec<Message>);

impl Program {
    pub fn new(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Message>> for Program {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

impl FromIterator<Message> for Program {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub kind: String,
    pub connected: bool,
    pub power: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_deserializes_from_json() {
        let msg: Message = serde_json::from_str(
            r#"{"device_id":"QWERTYUI","msg_type":"PLAY_SONG","data":"Never Gonna Give You Up"}"#,
        )
        .unwrap();

        assert_eq!(msg.device_id().as_str(), "QWERTYUI");
        assert_eq!(msg.msg_type(), MessageType::PlaySong);
        assert_eq!(msg.data(), Some("Never Gonna Give You Up"));
    }

    #[test]
    fn message_without_data_omits_field() {
        let msg = Message::new(DeviceId::from("ABCDEFGH"), MessageType::Flush);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"device_id": "ABCDEFGH", "msg_type": "FLUSH"})
        );
    }

    #[test]
    fn program_is_a_plain_list() {
        let program: Program = serde_json::from_str(
            r#"[{"device_id":"A","msg_type":"SWITCH_ON"},{"device_id":"B","msg_type":"SWITCH_OFF"}]"#,
        )
        .unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.messages()[1].msg_type(), MessageType::SwitchOff);
    }
}
