use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation;
use crate::user::{self, model::Profile};

use super::{DELETED_PLACEHOLDER, Id};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    id: Id,
    conversation_id: conversation::Id,
    sender_id: user::Id,
    content: String,
    kind: Kind,
    attachment_url: Option<String>,
    attachment_type: Option<String>,
    is_edited: bool,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        conversation_id: conversation::Id,
        sender_id: user::Id,
        content: impl Into<String>,
        kind: Kind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Id::random(),
            conversation_id,
            sender_id,
            content: content.into(),
            kind,
            attachment_url: None,
            attachment_type: None,
            is_edited: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_attachment(mut self, url: impl Into<String>, kind: Option<String>) -> Self {
        self.attachment_url = Some(url.into());
        self.attachment_type = kind;
        self
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn conversation_id(&self) -> &conversation::Id {
        &self.conversation_id
    }

    pub const fn sender_id(&self) -> &user::Id {
        &self.sender_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }

    pub const fn is_edited(&self) -> bool {
        self.is_edited
    }

    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Canonical position in the conversation's total order. `created_at` is
    /// immutable, so the key never changes after creation.
    pub const fn sort_key(&self) -> (DateTime<Utc>, Id) {
        (self.created_at, self.id)
    }

    pub fn edit(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.content = content.into();
        self.is_edited = true;
        self.updated_at = at;
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.content = DELETED_PLACEHOLDER.to_owned();
        self.updated_at = at;
    }
}

/// Unique per (message, user); re-marking only refreshes the timestamp.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRead {
    pub message_id: Id,
    pub user_id: user::Id,
    pub read_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Id,
    pub conversation_id: conversation::Id,
    pub sender_id: user::Id,
    pub sender: Profile,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub read_by: Vec<MessageRead>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageDto {
    pub fn new(message: Message, sender: Profile, read_by: Vec<MessageRead>) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender,
            content: message.content,
            kind: message.kind,
            attachment_url: message.attachment_url,
            attachment_type: message.attachment_type,
            is_edited: message.is_edited,
            is_deleted: message.is_deleted,
            read_by,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }

    pub const fn sort_key(&self) -> (DateTime<Utc>, Id) {
        (self.created_at, self.id)
    }
}

/// Roster preview of the newest message in a conversation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: Id,
    pub sender_id: user::Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<&MessageDto> for LastMessage {
    fn from(message: &MessageDto) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// One page of history, chronological, with the cursor pointing past its
/// oldest entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<MessageDto>,
    pub next_cursor: Option<Id>,
    pub has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<Kind>,
    pub attachment_url: Option<String>,
    pub attachment_type: Option<String>,
}
