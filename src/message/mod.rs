use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use crate::{conversation, user};

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::MessageRepository + Send + Sync>;

/// Content a soft-deleted message is left with.
pub const DELETED_PLACEHOLDER: &str = "This message was deleted";

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id(Uuid);

impl Id {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn get(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub fn api<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/conversations/{id}/messages",
            get(handler::list).post(handler::create),
        )
        .route(
            "/messages/{id}",
            patch(handler::edit).delete(handler::delete),
        )
        .route("/messages/{id}/read", post(handler::mark_read))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("message not found: {0:?}")]
    NotFound(Option<Id>),
    #[error("not the sender of the message")]
    NotSender,
    #[error("not a participant of the conversation")]
    NotParticipant,
    #[error("message content is empty")]
    EmptyContent,
    #[error("cannot edit a deleted message")]
    EditDeleted,

    _Conversation(#[from] conversation::Error),
    _User(#[from] user::Error),
}
