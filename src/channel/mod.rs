use std::fmt::Display;
use std::str::FromStr;

use axum::Router;
use axum::routing::post;

use crate::state::AppState;
use crate::{conversation, user};

pub mod handler;
pub mod model;
pub mod service;

type Result<T> = std::result::Result<T, Error>;

pub const GLOBAL_PRESENCE: &str = "presence-global";
const CONVERSATION_PREFIX: &str = "private-conversation-";
const USER_PREFIX: &str = "private-user-";
const PRESENCE_CONVERSATION_PREFIX: &str = "presence-conversation-";

/// Broker channel identity. Wire names are parsed once here; everything past
/// the boundary works with the tagged variant.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Channel {
    Global,
    Conversation(conversation::Id),
    User(user::Id),
    PresenceConversation(conversation::Id),
}

impl Channel {
    pub const fn is_presence(&self) -> bool {
        matches!(self, Self::Global | Self::PresenceConversation(_))
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str(GLOBAL_PRESENCE),
            Self::Conversation(id) => write!(f, "{CONVERSATION_PREFIX}{id}"),
            Self::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Self::PresenceConversation(id) => write!(f, "{PRESENCE_CONVERSATION_PREFIX}{id}"),
        }
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        if name == GLOBAL_PRESENCE {
            return Ok(Self::Global);
        }

        let parsed = if let Some(id) = name.strip_prefix(PRESENCE_CONVERSATION_PREFIX) {
            id.parse().ok().map(Self::PresenceConversation)
        } else if let Some(id) = name.strip_prefix(CONVERSATION_PREFIX) {
            id.parse().ok().map(Self::Conversation)
        } else if let Some(id) = name.strip_prefix(USER_PREFIX) {
            id.parse().ok().map(Self::User)
        } else {
            None
        };

        parsed.ok_or_else(|| Error::Unknown(name.to_owned()))
    }
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/channels/auth", post(handler::authorize))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("unknown channel: {0}")]
    Unknown(String),
    #[error("channel access denied")]
    Forbidden,

    _Conversation(#[from] conversation::Error),
    _User(#[from] user::Error),
}
