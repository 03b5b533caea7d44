use std::env;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use log::warn;
use serde::Serialize;
use serde_json::{Value, json};

use crate::channel::Channel;
use crate::channel::model::{Grant, PresenceData};
use crate::event;

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 4222,
        }
    }
}

impl Config {
    pub fn env() -> Option<Self> {
        let host = env::var("NATS_HOST").ok();
        let port = env::var("NATS_PORT")
            .unwrap_or_else(|_| "4222".to_string())
            .parse()
            .ok();

        if let (Some(host), Some(port)) = (host, port) {
            Some(Self { host, port })
        } else {
            warn!("NATS env is not configured");
            None
        }
    }

    pub async fn connect(&self) -> async_nats::Client {
        match async_nats::connect(&format!("{}:{}", self.host, self.port)).await {
            Ok(con) => con,
            Err(e) => panic!("Failed to connect to NATS: {e}"),
        }
    }
}

impl async_nats::subject::ToSubject for &Channel {
    fn to_subject(&self) -> async_nats::Subject {
        match self {
            Channel::Global => String::from("presence.global").into(),
            Channel::Conversation(id) => format!("conversation.{id}").into(),
            Channel::User(id) => format!("user.{id}").into(),
            Channel::PresenceConversation(id) => format!("presence.conversation.{id}").into(),
        }
    }
}

/// Broker adapter over a NATS connection. Events travel as `{event, data}`
/// envelopes on the subject derived from the channel; grants are short-lived
/// HS256 tokens over (socket, channel, presence).
pub struct NatsBroker {
    client: async_nats::Client,
    grant_key: EncodingKey,
}

impl NatsBroker {
    pub fn new(client: async_nats::Client, grant_secret: &str) -> Self {
        Self {
            client,
            grant_key: EncodingKey::from_secret(grant_secret.as_bytes()),
        }
    }
}

#[derive(Serialize)]
struct GrantClaims<'a> {
    socket_id: &'a str,
    channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence: Option<&'a PresenceData>,
    exp: i64,
}

#[async_trait]
impl event::service::Broker for NatsBroker {
    async fn trigger(&self, channel: &Channel, event: &str, payload: Value) -> event::Result<()> {
        let envelope = json!({ "event": event, "data": payload });
        let bytes = serde_json::to_vec(&envelope)?;

        self.client.publish(channel, Bytes::from(bytes)).await?;
        Ok(())
    }

    fn authorize_channel(
        &self,
        socket_id: &str,
        channel: &Channel,
        presence: Option<&PresenceData>,
    ) -> event::Result<Grant> {
        let claims = GrantClaims {
            socket_id,
            channel: channel.to_string(),
            presence,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };

        let auth = encode(&Header::default(), &claims, &self.grant_key)?;

        Ok(Grant {
            auth,
            channel_data: presence.cloned(),
        })
    }
}
