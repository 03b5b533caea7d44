use axum::extract::State;
use axum::{Extension, Form, Json};
use serde::Deserialize;

use crate::auth::model::Principal;
use crate::event;

use super::Channel;
use super::model::Grant;
use super::service::ChannelService;

#[derive(Deserialize)]
pub struct AuthParams {
    socket_id: String,
    channel_name: String,
}

pub async fn authorize(
    principal: Extension<Principal>,
    channel_service: State<ChannelService>,
    broker: State<event::Broker>,
    Form(params): Form<AuthParams>,
) -> crate::Result<Json<Grant>> {
    let channel: Channel = params.channel_name.parse()?;
    let presence = channel_service.authorize(principal.id(), &channel).await?;
    let grant = broker.authorize_channel(&params.socket_id, &channel, presence.as_ref())?;

    Ok(Json(grant))
}
