use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::user;

use super::Id;
use super::model::{Conversation, Participant};

#[async_trait]
pub trait ConversationRepository {
    async fn insert(
        &self,
        conversation: &Conversation,
        participants: &[Participant],
    ) -> super::Result<()>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Conversation>>;

    /// Conversations the user participates in, most recently updated first.
    async fn find_for_user(&self, user_id: &user::Id) -> super::Result<Vec<Conversation>>;

    /// The 1:1 conversation whose participant set is exactly {a, b}, if any.
    async fn find_direct(&self, a: &user::Id, b: &user::Id)
    -> super::Result<Option<Conversation>>;

    async fn find_participant(
        &self,
        id: &Id,
        user_id: &user::Id,
    ) -> super::Result<Option<Participant>>;

    async fn participants(&self, id: &Id) -> super::Result<Vec<Participant>>;

    async fn touch(&self, id: &Id, at: DateTime<Utc>) -> super::Result<()>;

    async fn bump_last_read(
        &self,
        id: &Id,
        user_id: &user::Id,
        at: DateTime<Utc>,
    ) -> super::Result<()>;

    /// Removes the participant. Returns true when the conversation was left
    /// empty and deleted with it.
    async fn remove_participant(&self, id: &Id, user_id: &user::Id) -> super::Result<bool>;
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    conversations: HashMap<Id, Conversation>,
    participants: Vec<Participant>,
}

impl State {
    fn member_ids(&self, id: &Id) -> Vec<user::Id> {
        self.participants
            .iter()
            .filter(|p| p.conversation_id() == id)
            .map(|p| *p.user_id())
            .collect()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn insert(
        &self,
        conversation: &Conversation,
        participants: &[Participant],
    ) -> super::Result<()> {
        let mut state = self.state.write().await;
        state
            .conversations
            .insert(*conversation.id(), conversation.clone());
        state.participants.extend_from_slice(participants);
        Ok(())
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Conversation>> {
        Ok(self.state.read().await.conversations.get(id).cloned())
    }

    async fn find_for_user(&self, user_id: &user::Id) -> super::Result<Vec<Conversation>> {
        let state = self.state.read().await;
        let mut conversations: Vec<Conversation> = state
            .participants
            .iter()
            .filter(|p| p.user_id() == user_id)
            .filter_map(|p| state.conversations.get(p.conversation_id()).cloned())
            .collect();

        conversations.sort_by_key(|c| std::cmp::Reverse(c.updated_at()));
        Ok(conversations)
    }

    async fn find_direct(
        &self,
        a: &user::Id,
        b: &user::Id,
    ) -> super::Result<Option<Conversation>> {
        let state = self.state.read().await;
        let found = state
            .conversations
            .values()
            .find(|c| {
                if c.is_group() {
                    return false;
                }
                let members = state.member_ids(c.id());
                members.len() == 2 && members.contains(a) && members.contains(b)
            })
            .cloned();

        Ok(found)
    }

    async fn find_participant(
        &self,
        id: &Id,
        user_id: &user::Id,
    ) -> super::Result<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .find(|p| p.conversation_id() == id && p.user_id() == user_id)
            .cloned())
    }

    async fn participants(&self, id: &Id) -> super::Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.conversation_id() == id)
            .cloned()
            .collect())
    }

    async fn touch(&self, id: &Id, at: DateTime<Utc>) -> super::Result<()> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(id)
            .ok_or(super::Error::NotFound(Some(*id)))?;

        conversation.touch(at);
        Ok(())
    }

    async fn bump_last_read(
        &self,
        id: &Id,
        user_id: &user::Id,
        at: DateTime<Utc>,
    ) -> super::Result<()> {
        let mut state = self.state.write().await;
        let participant = state
            .participants
            .iter_mut()
            .find(|p| p.conversation_id() == id && p.user_id() == user_id)
            .ok_or(super::Error::NotFound(Some(*id)))?;

        participant.mark_read(at);
        Ok(())
    }

    async fn remove_participant(&self, id: &Id, user_id: &user::Id) -> super::Result<bool> {
        let mut state = self.state.write().await;
        state
            .participants
            .retain(|p| !(p.conversation_id() == id && p.user_id() == user_id));

        let empty = state.member_ids(id).is_empty();
        if empty {
            state.conversations.remove(id);
        }

        Ok(empty)
    }
}
