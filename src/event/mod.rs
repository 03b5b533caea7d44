use std::sync::Arc;

pub mod model;
pub mod service;

pub type Result<T> = std::result::Result<T, Error>;
pub type Broker = Arc<dyn service::Broker + Send + Sync>;

pub const NEW_MESSAGE: &str = "new-message";
pub const MESSAGE_UPDATED: &str = "message-updated";
pub const MESSAGE_DELETED: &str = "message-deleted";
pub const MESSAGE_READ: &str = "message-read";
pub const TYPING_START: &str = "typing-start";
pub const TYPING_STOP: &str = "typing-stop";

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _ParseJson(#[from] serde_json::Error),
    _Publish(#[from] async_nats::PublishError),
    _Jwt(#[from] jsonwebtoken::errors::Error),
}
