use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{conversation, user};

use super::Id;
use super::model::{Message, MessageRead};

#[async_trait]
pub trait MessageRepository {
    async fn insert(&self, message: &Message) -> super::Result<()>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Message>>;

    /// Up to `limit` non-deleted messages strictly older than the cursor,
    /// newest first. Probes one extra row so the caller can detect a further
    /// page.
    async fn find_page(
        &self,
        conversation_id: &conversation::Id,
        before: Option<&Id>,
        limit: usize,
    ) -> super::Result<Vec<Message>>;

    /// Newest message regardless of deletion; deleted rows already carry the
    /// placeholder content.
    async fn find_last(&self, conversation_id: &conversation::Id)
    -> super::Result<Option<Message>>;

    async fn edit(&self, id: &Id, content: &str, at: DateTime<Utc>) -> super::Result<Message>;

    async fn soft_delete(&self, id: &Id, at: DateTime<Utc>) -> super::Result<Message>;

    async fn upsert_read(&self, read: &MessageRead) -> super::Result<()>;

    async fn find_reads(&self, message_id: &Id) -> super::Result<Vec<MessageRead>>;

    async fn count_unread(
        &self,
        conversation_id: &conversation::Id,
        viewer: &user::Id,
        since: DateTime<Utc>,
    ) -> super::Result<u32>;

    async fn delete_by_conversation(&self, conversation_id: &conversation::Id)
    -> super::Result<()>;
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    messages: HashMap<Id, Message>,
    reads: Vec<MessageRead>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> super::Result<()> {
        let mut state = self.state.write().await;
        state.messages.insert(*message.id(), message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Message>> {
        Ok(self.state.read().await.messages.get(id).cloned())
    }

    async fn find_page(
        &self,
        conversation_id: &conversation::Id,
        before: Option<&Id>,
        limit: usize,
    ) -> super::Result<Vec<Message>> {
        let state = self.state.read().await;

        let cursor_key = match before {
            Some(id) => {
                let cursor = state
                    .messages
                    .get(id)
                    .ok_or(super::Error::NotFound(Some(*id)))?;
                Some(cursor.sort_key())
            }
            None => None,
        };

        let mut page: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.conversation_id() == conversation_id && !m.is_deleted())
            .filter(|m| cursor_key.is_none_or(|key| m.sort_key() < key))
            .cloned()
            .collect();

        page.sort_by_key(|m| std::cmp::Reverse(m.sort_key()));
        page.truncate(limit + 1);

        Ok(page)
    }

    async fn find_last(
        &self,
        conversation_id: &conversation::Id,
    ) -> super::Result<Option<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .values()
            .filter(|m| m.conversation_id() == conversation_id)
            .max_by_key(|m| m.sort_key())
            .cloned())
    }

    async fn edit(&self, id: &Id, content: &str, at: DateTime<Utc>) -> super::Result<Message> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .get_mut(id)
            .ok_or(super::Error::NotFound(Some(*id)))?;

        message.edit(content, at);
        Ok(message.clone())
    }

    async fn soft_delete(&self, id: &Id, at: DateTime<Utc>) -> super::Result<Message> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .get_mut(id)
            .ok_or(super::Error::NotFound(Some(*id)))?;

        message.soft_delete(at);
        Ok(message.clone())
    }

    async fn upsert_read(&self, read: &MessageRead) -> super::Result<()> {
        let mut state = self.state.write().await;
        match state
            .reads
            .iter_mut()
            .find(|r| r.message_id == read.message_id && r.user_id == read.user_id)
        {
            Some(existing) => existing.read_at = read.read_at,
            None => state.reads.push(read.clone()),
        }

        Ok(())
    }

    async fn find_reads(&self, message_id: &Id) -> super::Result<Vec<MessageRead>> {
        let state = self.state.read().await;
        Ok(state
            .reads
            .iter()
            .filter(|r| r.message_id == *message_id)
            .cloned()
            .collect())
    }

    async fn count_unread(
        &self,
        conversation_id: &conversation::Id,
        viewer: &user::Id,
        since: DateTime<Utc>,
    ) -> super::Result<u32> {
        let state = self.state.read().await;
        let count = state
            .messages
            .values()
            .filter(|m| {
                m.conversation_id() == conversation_id
                    && m.sender_id() != viewer
                    && m.created_at() > since
            })
            .count();

        Ok(count as u32)
    }

    async fn delete_by_conversation(
        &self,
        conversation_id: &conversation::Id,
    ) -> super::Result<()> {
        let mut state = self.state.write().await;
        state
            .messages
            .retain(|_, m| m.conversation_id() != conversation_id);
        let remaining: Vec<Id> = state.messages.keys().copied().collect();
        state.reads.retain(|r| remaining.contains(&r.message_id));

        Ok(())
    }
}
