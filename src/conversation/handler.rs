use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::model::Principal;

use super::Id;
use super::model::{ConversationDto, CreateParams};
use super::service::ConversationService;

pub async fn list(
    principal: Extension<Principal>,
    service: State<ConversationService>,
) -> crate::Result<Json<Vec<ConversationDto>>> {
    let conversations = service.find_all(principal.id()).await?;
    Ok(Json(conversations))
}

pub async fn create(
    principal: Extension<Principal>,
    service: State<ConversationService>,
    Json(params): Json<CreateParams>,
) -> crate::Result<impl IntoResponse> {
    let conversation = service.create(principal.id(), &params).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn find_one(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<ConversationService>,
) -> crate::Result<Json<ConversationDto>> {
    let conversation = service.find_one(principal.id(), &id).await?;
    Ok(Json(conversation))
}

pub async fn leave(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<ConversationService>,
) -> crate::Result<StatusCode> {
    service.leave(principal.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingParams {
    is_typing: bool,
}

pub async fn typing(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<ConversationService>,
    Json(params): Json<TypingParams>,
) -> crate::Result<StatusCode> {
    service
        .typing(principal.id(), &id, params.is_typing)
        .await?;

    Ok(StatusCode::ACCEPTED)
}
