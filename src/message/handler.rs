use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::model::Principal;
use crate::conversation;

use super::Id;
use super::model::{MessageDto, MessagePage, MessageRead, SendParams};
use super::service::MessageService;

pub async fn create(
    principal: Extension<Principal>,
    conversation_id: Path<conversation::Id>,
    service: State<MessageService>,
    Json(params): Json<SendParams>,
) -> crate::Result<impl IntoResponse> {
    let message = service
        .create(principal.id(), &conversation_id, &params)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Deserialize)]
pub struct PageParams {
    cursor: Option<Id>,
    limit: Option<usize>,
}

pub async fn list(
    principal: Extension<Principal>,
    conversation_id: Path<conversation::Id>,
    Query(params): Query<PageParams>,
    service: State<MessageService>,
) -> crate::Result<Json<MessagePage>> {
    let page = service
        .page(principal.id(), &conversation_id, params.cursor, params.limit)
        .await?;

    Ok(Json(page))
}

#[derive(Deserialize)]
pub struct EditParams {
    content: String,
}

pub async fn edit(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<MessageService>,
    Json(params): Json<EditParams>,
) -> crate::Result<Json<MessageDto>> {
    let message = service.edit(principal.id(), &id, &params.content).await?;
    Ok(Json(message))
}

pub async fn delete(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<MessageService>,
) -> crate::Result<StatusCode> {
    service.delete(principal.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_read(
    principal: Extension<Principal>,
    id: Path<Id>,
    service: State<MessageService>,
) -> crate::Result<Json<Option<MessageRead>>> {
    let read = service.mark_read(principal.id(), &id).await?;
    Ok(Json(read))
}
