use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use crate::{message, user};

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn repository::ConversationRepository + Send + Sync>;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Hash, PartialEq, Eq)]
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
        .route("/conversations", get(handler::list).post(handler::create))
        .route(
            "/conversations/{id}",
            get(handler::find_one).delete(handler::leave),
        )
        .route("/conversations/{id}/typing", post(handler::typing))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    #[error("conversation not found: {0:?}")]
    NotFound(Option<Id>),
    #[error("not enough participants: {0}")]
    NotEnoughParticipants(usize),
    #[error("missing group name")]
    MissingName,

    _Message(#[from] Box<message::Error>),
    _User(#[from] user::Error),
}
