use async_trait::async_trait;
use futures::future::join_all;
use log::error;
use serde_json::{Value, json};

use crate::channel::Channel;
use crate::channel::model::{Grant, PresenceData};
use crate::message::model::{MessageDto, MessageRead};
use crate::{conversation, event, message, user};

/// Managed pub/sub boundary: server-side publish plus subscribe-grant
/// signing. The engine never talks to the transport directly.
#[async_trait]
pub trait Broker {
    async fn trigger(&self, channel: &Channel, event: &str, payload: Value) -> super::Result<()>;

    fn authorize_channel(
        &self,
        socket_id: &str,
        channel: &Channel,
        presence: Option<&PresenceData>,
    ) -> super::Result<Grant>;
}

/// Publishes live events after durable mutations. Everything here is
/// fire-and-forget: the mutation is already committed, so failures are
/// logged and swallowed, never retried or surfaced.
#[derive(Clone)]
pub struct FanoutService {
    broker: event::Broker,
}

impl FanoutService {
    pub fn new(broker: event::Broker) -> Self {
        Self { broker }
    }
}

impl FanoutService {
    /// `new-message` on the conversation channel, plus an independent
    /// notification envelope on every other participant's personal channel.
    /// The publishes carry no atomicity or ordering guarantee between them.
    pub async fn message_created(&self, recipients: &[user::Id], message: &MessageDto) {
        let conversation_id = message.conversation_id;

        let mut publishes = vec![self.publish(
            Channel::Conversation(conversation_id),
            event::NEW_MESSAGE,
            serde_json::to_value(message),
        )];

        for recipient in recipients {
            publishes.push(self.publish(
                Channel::User(*recipient),
                event::NEW_MESSAGE,
                Ok(json!({
                    "conversationId": conversation_id,
                    "message": message,
                })),
            ));
        }

        join_all(publishes).await;
    }

    pub async fn message_updated(&self, message: &MessageDto) {
        self.publish(
            Channel::Conversation(message.conversation_id),
            event::MESSAGE_UPDATED,
            serde_json::to_value(message),
        )
        .await;
    }

    pub async fn message_deleted(
        &self,
        conversation_id: &conversation::Id,
        message_id: &message::Id,
    ) {
        self.publish(
            Channel::Conversation(*conversation_id),
            event::MESSAGE_DELETED,
            Ok(json!({
                "messageId": message_id,
                "conversationId": conversation_id,
            })),
        )
        .await;
    }

    pub async fn message_read(&self, conversation_id: &conversation::Id, read: &MessageRead) {
        self.publish(
            Channel::Conversation(*conversation_id),
            event::MESSAGE_READ,
            Ok(json!({
                "messageId": read.message_id,
                "conversationId": conversation_id,
                "userId": read.user_id,
                "readAt": read.read_at,
            })),
        )
        .await;
    }

    pub async fn typing(
        &self,
        conversation_id: &conversation::Id,
        user_id: &user::Id,
        user_name: &str,
        started: bool,
    ) {
        let event = if started {
            event::TYPING_START
        } else {
            event::TYPING_STOP
        };

        self.publish(
            Channel::Conversation(*conversation_id),
            event,
            Ok(json!({
                "userId": user_id,
                "userName": user_name,
            })),
        )
        .await;
    }

    async fn publish(
        &self,
        channel: Channel,
        event: &str,
        payload: Result<Value, serde_json::Error>,
    ) {
        match payload {
            Ok(payload) => {
                if let Err(e) = self.broker.trigger(&channel, event, payload).await {
                    error!("failed to publish {event} to {channel}: {e:?}");
                }
            }
            Err(e) => error!("could not serialize {event} payload: {e:?}"),
        }
    }
}
