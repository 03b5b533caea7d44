use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::debug;
use serde::Serialize;

use crate::{auth, channel, conversation, event, message, user};

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Channel(#[from] channel::Error),
    _Conversation(#[from] conversation::Error),
    _Event(#[from] event::Error),
    _Message(#[from] message::Error),
    _User(#[from] user::Error),
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Self::_Auth(_) => StatusCode::UNAUTHORIZED,
            Self::_Channel(e) => channel_status(e),
            Self::_Conversation(e) => conversation_status(e),
            Self::_Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::_Message(e) => message_status(e),
            Self::_User(e) => user_status(e),
        }
    }
}

fn channel_status(e: &channel::Error) -> StatusCode {
    match e {
        channel::Error::Unknown(_) => StatusCode::BAD_REQUEST,
        channel::Error::Forbidden => StatusCode::FORBIDDEN,
        channel::Error::_Conversation(e) => conversation_status(e),
        channel::Error::_User(e) => user_status(e),
    }
}

fn conversation_status(e: &conversation::Error) -> StatusCode {
    match e {
        conversation::Error::NotFound(_) => StatusCode::NOT_FOUND,
        conversation::Error::NotEnoughParticipants(_) | conversation::Error::MissingName => {
            StatusCode::BAD_REQUEST
        }
        conversation::Error::_Message(e) => message_status(e),
        conversation::Error::_User(e) => user_status(e),
    }
}

fn message_status(e: &message::Error) -> StatusCode {
    match e {
        message::Error::NotFound(_) => StatusCode::NOT_FOUND,
        message::Error::NotSender | message::Error::NotParticipant => StatusCode::FORBIDDEN,
        message::Error::EmptyContent => StatusCode::BAD_REQUEST,
        message::Error::EditDeleted => StatusCode::CONFLICT,
        message::Error::_Conversation(e) => conversation_status(e),
        message::Error::_User(e) => user_status(e),
    }
}

fn user_status(e: &user::Error) -> StatusCode {
    match e {
        user::Error::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let status = self.status();
        let message = if status.is_server_error() {
            debug!("request failed: {self:?}");
            "Something went wrong".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
