use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::models::{Message, Notification, OrderAlert};
use crate::types::{ConversationId, UserId};

/// Envelope of every realtime frame: `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Events pushed by the backend over the realtime socket.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// A chat message was posted. Delivered under both `new_message` and
    /// `message:new`; `alias` records which name carried it.
    NewMessage { message: Message, alias: MessageAlias },

    /// Someone read messages in a conversation. Carries no delta.
    MessagesRead(MessagesRead),

    UserTyping(TypingPayload),

    UserStoppedTyping(TypingPayload),

    NotificationNew(Notification),

    NewOrder(OrderAlert),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAlias {
    NewMessage,
    MessageNew,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagesRead {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default, alias = "readerId")]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
}

/// Chat payloads arrive either bare or wrapped as `{"message": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessagePayload {
    Wrapped { message: Message },
    Bare(Message),
}

/// Coarse event categories, used to filter bridge subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Socket connected / disconnected (emitted by the transport, not the backend).
    Connection,
    Message,
    MessagesRead,
    Typing,
    Notification,
    Order,
}

impl SocketEvent {
    /// Decode a text frame received from the socket.
    pub fn from_frame(text: &str) -> Result<Self, ProtocolError> {
        let frame: Frame = serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)?;
        let event = frame.event.as_str();

        let invalid = |source| ProtocolError::InvalidPayload {
            event: frame.event.clone(),
            source,
        };

        let decoded = match event {
            EVENT_NEW_MESSAGE | EVENT_MESSAGE_NEW => {
                let payload: MessagePayload =
                    serde_json::from_value(frame.data.clone()).map_err(invalid)?;
                let message = match payload {
                    MessagePayload::Wrapped { message } => message,
                    MessagePayload::Bare(message) => message,
                };
                let alias = if event == EVENT_NEW_MESSAGE {
                    MessageAlias::NewMessage
                } else {
                    MessageAlias::MessageNew
                };
                SocketEvent::NewMessage { message, alias }
            }
            EVENT_MESSAGES_READ => {
                let payload = if frame.data.is_null() {
                    MessagesRead::default()
                } else {
                    serde_json::from_value(frame.data.clone()).map_err(invalid)?
                };
                SocketEvent::MessagesRead(payload)
            }
            EVENT_USER_TYPING => SocketEvent::UserTyping(
                serde_json::from_value(frame.data.clone()).map_err(invalid)?,
            ),
            EVENT_USER_STOPPED_TYPING => SocketEvent::UserStoppedTyping(
                serde_json::from_value(frame.data.clone()).map_err(invalid)?,
            ),
            EVENT_NOTIFICATION_NEW => SocketEvent::NotificationNew(
                serde_json::from_value(frame.data.clone()).map_err(invalid)?,
            ),
            EVENT_NEW_ORDER => {
                SocketEvent::NewOrder(serde_json::from_value(frame.data.clone()).map_err(invalid)?)
            }
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };

        Ok(decoded)
    }

    /// Encode as a text frame (the shape the backend pushes).
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        let (event, data) = match self {
            SocketEvent::NewMessage { message, alias } => {
                let name = match alias {
                    MessageAlias::NewMessage => EVENT_NEW_MESSAGE,
                    MessageAlias::MessageNew => EVENT_MESSAGE_NEW,
                };
                (name, serde_json::to_value(message)?)
            }
            SocketEvent::MessagesRead(p) => (EVENT_MESSAGES_READ, serde_json::to_value(p)?),
            SocketEvent::UserTyping(p) => (EVENT_USER_TYPING, serde_json::to_value(p)?),
            SocketEvent::UserStoppedTyping(p) => {
                (EVENT_USER_STOPPED_TYPING, serde_json::to_value(p)?)
            }
            SocketEvent::NotificationNew(n) => (EVENT_NOTIFICATION_NEW, serde_json::to_value(n)?),
            SocketEvent::NewOrder(o) => (EVENT_NEW_ORDER, serde_json::to_value(o)?),
        };
        encode_frame(event, data)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            SocketEvent::NewMessage { .. } => EventKind::Message,
            SocketEvent::MessagesRead(_) => EventKind::MessagesRead,
            SocketEvent::UserTyping(_) | SocketEvent::UserStoppedTyping(_) => EventKind::Typing,
            SocketEvent::NotificationNew(_) => EventKind::Notification,
            SocketEvent::NewOrder(_) => EventKind::Order,
        }
    }
}

/// Events the client emits to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinConversation(ConversationId),
    LeaveConversation(ConversationId),
    Typing(ConversationId),
    StopTyping(ConversationId),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationRef<'a> {
    conversation_id: &'a ConversationId,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinConversation(_) => EVENT_JOIN_CONVERSATION,
            ClientEvent::LeaveConversation(_) => EVENT_LEAVE_CONVERSATION,
            ClientEvent::Typing(_) => EVENT_TYPING,
            ClientEvent::StopTyping(_) => EVENT_STOP_TYPING,
        }
    }

    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        let conversation_id = match self {
            ClientEvent::JoinConversation(id)
            | ClientEvent::LeaveConversation(id)
            | ClientEvent::Typing(id)
            | ClientEvent::StopTyping(id) => id,
        };
        encode_frame(
            self.name(),
            serde_json::to_value(ConversationRef { conversation_id })?,
        )
    }
}

fn encode_frame(event: &str, data: serde_json::Value) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&Frame {
        event: event.to_string(),
        data,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    #[test]
    fn decodes_both_message_aliases() {
        let bare = r#"{"event":"new_message","data":{"_id":"m1","conversationId":"c1","sender":"u2","text":"hi","createdAt":"2026-03-01T10:00:00Z"}}"#;
        let wrapped = r#"{"event":"message:new","data":{"conversationId":"c1","message":{"_id":"m1","conversationId":"c1","sender":"u2","text":"hi","createdAt":"2026-03-01T10:00:00Z"}}}"#;

        let a = SocketEvent::from_frame(bare).unwrap();
        let b = SocketEvent::from_frame(wrapped).unwrap();

        match (a, b) {
            (
                SocketEvent::NewMessage { message: ma, alias: MessageAlias::NewMessage },
                SocketEvent::NewMessage { message: mb, alias: MessageAlias::MessageNew },
            ) => assert_eq!(ma, mb),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn messages_read_without_payload() {
        let ev = SocketEvent::from_frame(r#"{"event":"messages_read"}"#).unwrap();
        assert_eq!(ev, SocketEvent::MessagesRead(MessagesRead::default()));
        assert_eq!(ev.kind(), EventKind::MessagesRead);
    }

    #[test]
    fn messages_read_accepts_reader_alias() {
        let ev = SocketEvent::from_frame(
            r#"{"event":"messages_read","data":{"conversationId":"c1","readerId":"u1"}}"#,
        )
        .unwrap();
        let SocketEvent::MessagesRead(read) = ev else {
            panic!("expected messages_read");
        };
        assert_eq!(read.user_id, Some(UserId::new("u1")));
    }

    #[test]
    fn notification_frame_decodes() {
        let ev = SocketEvent::from_frame(
            r#"{"event":"notification:new","data":{"_id":"n1","type":"like","text":"Ana liked your post","createdAt":"2026-03-01T10:00:00Z"}}"#,
        )
        .unwrap();
        let SocketEvent::NotificationNew(n) = ev else {
            panic!("expected notification");
        };
        assert_eq!(n.kind, NotificationKind::Like);
    }

    #[test]
    fn unknown_event_is_reported() {
        let err = SocketEvent::from_frame(r#"{"event":"presence","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "presence"));
    }

    #[test]
    fn bad_payload_names_the_event() {
        let err = SocketEvent::from_frame(r#"{"event":"user_typing","data":{"userId":"u1"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { ref event, .. } if event == "user_typing"));
    }

    #[test]
    fn encoded_event_decodes_to_itself() {
        let ev = SocketEvent::UserTyping(TypingPayload {
            conversation_id: ConversationId::new("c1"),
            user_id: UserId::new("u1"),
        });
        let frame = ev.to_frame().unwrap();
        assert_eq!(SocketEvent::from_frame(&frame).unwrap(), ev);
    }

    #[test]
    fn client_event_frame_shape() {
        let frame = ClientEvent::Typing(ConversationId::new("c1")).to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "typing");
        assert_eq!(value["data"]["conversationId"], "c1");
    }
}
