use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::model::LastMessage;
use crate::user::{self, model::Profile};

use super::Id;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Conversation {
    id: Id,
    is_group: bool,
    name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(is_group: bool, name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Id::random(),
            is_group,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn is_group(&self) -> bool {
        self.is_group
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Bumps the watermark used to order the roster.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Participant {
    conversation_id: Id,
    user_id: user::Id,
    joined_at: DateTime<Utc>,
    last_read_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(conversation_id: Id, user_id: user::Id, now: DateTime<Utc>) -> Self {
        Self {
            conversation_id,
            user_id,
            joined_at: now,
            last_read_at: now,
        }
    }

    pub const fn conversation_id(&self) -> &Id {
        &self.conversation_id
    }

    pub const fn user_id(&self) -> &user::Id {
        &self.user_id
    }

    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub const fn last_read_at(&self) -> DateTime<Utc> {
        self.last_read_at
    }

    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        self.last_read_at = at;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub user: Profile,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    pub id: Id,
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub participants: Vec<ParticipantDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub participant_ids: Vec<user::Id>,
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}
