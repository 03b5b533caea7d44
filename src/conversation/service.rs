use std::collections::HashSet;

use chrono::Utc;

use crate::event::service::FanoutService;
use crate::{conversation, message, user};

use super::model::{Conversation, ConversationDto, CreateParams, Participant, ParticipantDto};

#[derive(Clone)]
pub struct ConversationService {
    repository: conversation::Repository,
    messages: message::Repository,
    profiles: user::Profiles,
    fanout: FanoutService,
}

impl ConversationService {
    pub fn new(
        repository: conversation::Repository,
        messages: message::Repository,
        profiles: user::Profiles,
        fanout: FanoutService,
    ) -> Self {
        Self {
            repository,
            messages,
            profiles,
            fanout,
        }
    }
}

impl ConversationService {
    pub async fn create(
        &self,
        creator: &user::Id,
        params: &CreateParams,
    ) -> super::Result<ConversationDto> {
        let mut seen = HashSet::new();
        let members: Vec<user::Id> = std::iter::once(*creator)
            .chain(params.participant_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect();

        if members.len() < 2 {
            return Err(super::Error::NotEnoughParticipants(members.len()));
        }

        let name = params.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        if params.is_group && name.is_none() {
            return Err(super::Error::MissingName);
        }

        for id in &members {
            if !self.profiles.exists(id).await? {
                return Err(user::Error::NotFound(*id).into());
            }
        }

        if !params.is_group && members.len() == 2 {
            if let Some(existing) = self.repository.find_direct(&members[0], &members[1]).await? {
                return self.to_dto(existing, creator).await;
            }
        }

        let now = Utc::now();
        let conversation = Conversation::new(
            params.is_group,
            params.is_group.then(|| name.unwrap_or_default().to_owned()),
            now,
        );
        let participants: Vec<Participant> = members
            .iter()
            .map(|id| Participant::new(*conversation.id(), *id, now))
            .collect();

        self.repository.insert(&conversation, &participants).await?;
        self.to_dto(conversation, creator).await
    }

    pub async fn find_all(&self, requester: &user::Id) -> super::Result<Vec<ConversationDto>> {
        let conversations = self.repository.find_for_user(requester).await?;

        let mut dtos = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            dtos.push(self.to_dto(conversation, requester).await?);
        }

        Ok(dtos)
    }

    pub async fn find_one(
        &self,
        requester: &user::Id,
        id: &super::Id,
    ) -> super::Result<ConversationDto> {
        self.check_participant(id, requester).await?;

        let conversation = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(super::Error::NotFound(Some(*id)))?;

        self.to_dto(conversation, requester).await
    }

    pub async fn leave(&self, requester: &user::Id, id: &super::Id) -> super::Result<()> {
        self.check_participant(id, requester).await?;

        let empty = self.repository.remove_participant(id, requester).await?;
        if empty {
            self.messages
                .delete_by_conversation(id)
                .await
                .map_err(Box::new)?;
        }

        Ok(())
    }

    pub async fn typing(
        &self,
        requester: &user::Id,
        id: &super::Id,
        is_typing: bool,
    ) -> super::Result<()> {
        self.check_participant(id, requester).await?;

        let profile = self.profiles.find_by_id(requester).await?;
        self.fanout
            .typing(id, requester, &profile.name, is_typing)
            .await;

        Ok(())
    }
}

impl ConversationService {
    /// Membership gate; a non-participant is told the conversation does not
    /// exist.
    async fn check_participant(&self, id: &super::Id, user_id: &user::Id) -> super::Result<()> {
        self.repository
            .find_participant(id, user_id)
            .await?
            .map(|_| ())
            .ok_or(super::Error::NotFound(Some(*id)))
    }

    async fn to_dto(
        &self,
        conversation: Conversation,
        viewer: &user::Id,
    ) -> super::Result<ConversationDto> {
        let participants = self.repository.participants(conversation.id()).await?;

        let mut participant_dtos = Vec::with_capacity(participants.len());
        for participant in &participants {
            let user = self.profiles.find_by_id(participant.user_id()).await?;
            participant_dtos.push(ParticipantDto {
                user,
                joined_at: participant.joined_at(),
                last_read_at: participant.last_read_at(),
            });
        }

        let last_message = self
            .messages
            .find_last(conversation.id())
            .await
            .map_err(Box::new)?
            .map(|m| (&m).into());

        let unread_count = match participants
            .iter()
            .find(|p| p.user_id() == viewer)
            .map(|p| p.last_read_at())
        {
            Some(since) => self
                .messages
                .count_unread(conversation.id(), viewer, since)
                .await
                .map_err(Box::new)?,
            None => 0,
        };

        Ok(ConversationDto {
            id: *conversation.id(),
            is_group: conversation.is_group(),
            name: conversation.name().map(str::to_owned),
            participants: participant_dtos,
            last_message,
            unread_count,
            updated_at: conversation.updated_at(),
        })
    }
}
