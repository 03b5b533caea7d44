use chrono::Utc;

use crate::event::service::FanoutService;
use crate::{conversation, message, user};

use super::model::{Message, MessageDto, MessagePage, MessageRead, SendParams};
use super::{DEFAULT_PAGE_SIZE, Id};

#[derive(Clone)]
pub struct MessageService {
    repository: message::Repository,
    conversations: conversation::Repository,
    profiles: user::Profiles,
    fanout: FanoutService,
}

impl MessageService {
    pub fn new(
        repository: message::Repository,
        conversations: conversation::Repository,
        profiles: user::Profiles,
        fanout: FanoutService,
    ) -> Self {
        Self {
            repository,
            conversations,
            profiles,
            fanout,
        }
    }
}

impl MessageService {
    pub async fn create(
        &self,
        sender: &user::Id,
        conversation_id: &conversation::Id,
        params: &SendParams,
    ) -> super::Result<MessageDto> {
        self.check_participant(conversation_id, sender).await?;

        let content = params.content.clone().unwrap_or_default();
        if content.trim().is_empty() && params.attachment_url.is_none() {
            return Err(super::Error::EmptyContent);
        }

        let now = Utc::now();
        let mut message = Message::new(
            *conversation_id,
            *sender,
            content,
            params.kind.unwrap_or_default(),
            now,
        );
        if let Some(url) = params.attachment_url.clone() {
            message = message.with_attachment(url, params.attachment_type.clone());
        }

        self.repository.insert(&message).await?;
        self.conversations.touch(conversation_id, now).await?;
        self.conversations
            .bump_last_read(conversation_id, sender, now)
            .await?;

        let sender_profile = self.profiles.find_by_id(sender).await?;
        let dto = MessageDto::new(message, sender_profile, Vec::new());

        let recipients: Vec<user::Id> = self
            .conversations
            .participants(conversation_id)
            .await?
            .iter()
            .map(|p| *p.user_id())
            .filter(|id| id != sender)
            .collect();

        self.fanout.message_created(&recipients, &dto).await;

        Ok(dto)
    }

    pub async fn edit(&self, editor: &user::Id, id: &Id, content: &str) -> super::Result<MessageDto> {
        let message = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(super::Error::NotFound(Some(*id)))?;

        if message.sender_id() != editor {
            return Err(super::Error::NotSender);
        }
        if message.is_deleted() {
            return Err(super::Error::EditDeleted);
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(super::Error::EmptyContent);
        }

        let updated = self.repository.edit(id, content, Utc::now()).await?;
        let dto = self.to_dto(updated).await?;

        self.fanout.message_updated(&dto).await;

        Ok(dto)
    }

    pub async fn delete(&self, requester: &user::Id, id: &Id) -> super::Result<()> {
        let message = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(super::Error::NotFound(Some(*id)))?;

        if message.sender_id() != requester {
            return Err(super::Error::NotSender);
        }

        let deleted = self.repository.soft_delete(id, Utc::now()).await?;

        self.fanout
            .message_deleted(deleted.conversation_id(), id)
            .await;

        Ok(())
    }

    /// Both halves of a read acknowledgement: the receipt row and the silent
    /// participant watermark bump. Reading an own message is a no-op, not an
    /// error.
    pub async fn mark_read(
        &self,
        viewer: &user::Id,
        id: &Id,
    ) -> super::Result<Option<MessageRead>> {
        let message = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(super::Error::NotFound(Some(*id)))?;

        let conversation_id = *message.conversation_id();
        self.conversations
            .find_participant(&conversation_id, viewer)
            .await?
            .ok_or(super::Error::NotParticipant)?;

        if message.sender_id() == viewer {
            return Ok(None);
        }

        let read = MessageRead {
            message_id: *id,
            user_id: *viewer,
            read_at: Utc::now(),
        };

        self.repository.upsert_read(&read).await?;
        self.conversations
            .bump_last_read(&conversation_id, viewer, read.read_at)
            .await?;

        self.fanout.message_read(&conversation_id, &read).await;

        Ok(Some(read))
    }

    pub async fn page(
        &self,
        viewer: &user::Id,
        conversation_id: &conversation::Id,
        cursor: Option<Id>,
        limit: Option<usize>,
    ) -> super::Result<MessagePage> {
        self.check_participant(conversation_id, viewer).await?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let mut rows = self
            .repository
            .find_page(conversation_id, cursor.as_ref(), limit)
            .await?;

        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = has_more.then(|| rows.last().map(|m| *m.id())).flatten();

        rows.reverse();

        let mut messages = Vec::with_capacity(rows.len());
        for message in rows {
            messages.push(self.to_dto(message).await?);
        }

        self.conversations
            .bump_last_read(conversation_id, viewer, Utc::now())
            .await?;

        Ok(MessagePage {
            messages,
            next_cursor,
            has_more,
        })
    }
}

impl MessageService {
    async fn check_participant(
        &self,
        conversation_id: &conversation::Id,
        user_id: &user::Id,
    ) -> super::Result<()> {
        self.conversations
            .find_participant(conversation_id, user_id)
            .await?
            .map(|_| ())
            .ok_or(conversation::Error::NotFound(Some(*conversation_id)).into())
    }

    async fn to_dto(&self, message: Message) -> super::Result<MessageDto> {
        let sender = self.profiles.find_by_id(message.sender_id()).await?;
        let read_by = self.repository.find_reads(message.id()).await?;

        Ok(MessageDto::new(message, sender, read_by))
    }
}
