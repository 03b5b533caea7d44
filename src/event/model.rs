use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation;
use crate::message::{self, model::MessageDto};
use crate::user::{self, model::Profile};

/// Events delivered on a conversation channel. The wire form is the
/// `{event, data}` envelope every channel carries.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ConversationEvent {
    NewMessage(MessageDto),
    MessageUpdated(MessageDto),
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: message::Id,
        conversation_id: conversation::Id,
    },
    #[serde(rename_all = "camelCase")]
    MessageRead {
        message_id: message::Id,
        conversation_id: conversation::Id,
        user_id: user::Id,
        read_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    TypingStart {
        user_id: user::Id,
        user_name: String,
    },
    #[serde(rename_all = "camelCase")]
    TypingStop {
        user_id: user::Id,
        user_name: String,
    },
}

/// Events delivered on a personal channel. `new-message` here is the
/// out-of-conversation notification envelope, not the full conversation
/// event.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum UserEvent {
    #[serde(rename_all = "camelCase")]
    NewMessage {
        conversation_id: conversation::Id,
        message: MessageDto,
    },
}

/// Broker-native membership signals of a presence channel.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum MembershipEvent {
    SubscriptionSucceeded { members: Vec<Member> },
    MemberAdded(Member),
    MemberRemoved(Member),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Member {
    pub id: user::Id,
    pub info: Profile,
}

impl From<Profile> for Member {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            info: profile,
        }
    }
}
