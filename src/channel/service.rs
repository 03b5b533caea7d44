use log::debug;

use crate::{conversation, user};

use super::Channel;
use super::model::PresenceData;

/// Decides subscribe eligibility; the broker signs the actual grant.
#[derive(Clone)]
pub struct ChannelService {
    conversations: conversation::Repository,
    profiles: user::Profiles,
}

impl ChannelService {
    pub fn new(conversations: conversation::Repository, profiles: user::Profiles) -> Self {
        Self {
            conversations,
            profiles,
        }
    }
}

impl ChannelService {
    /// Fails closed: anything not explicitly granted is rejected. Presence
    /// grants carry the requester's public profile for the member roster.
    pub async fn authorize(
        &self,
        requester: &user::Id,
        channel: &Channel,
    ) -> super::Result<Option<PresenceData>> {
        match channel {
            Channel::Global => self.presence_data(requester).await.map(Some),
            Channel::User(id) => {
                if id == requester {
                    Ok(None)
                } else {
                    debug!("{requester} requested foreign user channel {channel}");
                    Err(super::Error::Forbidden)
                }
            }
            Channel::Conversation(id) => {
                self.check_participant(id, requester).await?;
                Ok(None)
            }
            Channel::PresenceConversation(id) => {
                self.check_participant(id, requester).await?;
                self.presence_data(requester).await.map(Some)
            }
        }
    }

    async fn check_participant(
        &self,
        conversation_id: &conversation::Id,
        requester: &user::Id,
    ) -> super::Result<()> {
        self.conversations
            .find_participant(conversation_id, requester)
            .await?
            .map(|_| ())
            .ok_or(super::Error::Forbidden)
    }

    async fn presence_data(&self, requester: &user::Id) -> super::Result<PresenceData> {
        let profile = self.profiles.find_by_id(requester).await?;
        Ok(PresenceData::new(profile))
    }
}
