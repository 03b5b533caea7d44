use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{self, service::JwtAuthService};
use crate::channel::service::ChannelService;
use crate::conversation::{self, repository::InMemoryConversationRepository};
use crate::conversation::service::ConversationService;
use crate::event::{self, service::FanoutService};
use crate::integration;
use crate::integration::pubsub::NatsBroker;
use crate::message::{self, repository::InMemoryMessageRepository};
use crate::message::service::MessageService;
use crate::user::{self, repository::InMemoryProfileRepository};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub broker: event::Broker,
    pub channel_service: ChannelService,
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
}

impl AppState {
    pub async fn init(config: &integration::Config) -> Self {
        let pubsub = config.pubsub.connect().await;
        let broker: event::Broker = Arc::new(NatsBroker::new(pubsub, &config.secrets.grants));

        let profiles: user::Profiles = Arc::new(InMemoryProfileRepository::default());
        let conversations: conversation::Repository =
            Arc::new(InMemoryConversationRepository::default());
        let messages: message::Repository = Arc::new(InMemoryMessageRepository::default());

        let fanout = FanoutService::new(broker.clone());

        Self {
            auth_service: Arc::new(JwtAuthService::new(&config.secrets.auth)),
            broker: broker.clone(),
            channel_service: ChannelService::new(conversations.clone(), profiles.clone()),
            conversation_service: ConversationService::new(
                conversations.clone(),
                messages.clone(),
                profiles.clone(),
                fanout.clone(),
            ),
            message_service: MessageService::new(messages, conversations, profiles, fanout),
        }
    }
}
