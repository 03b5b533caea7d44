use chrono::{DateTime, Utc};

use crate::conversation::{self, model::ConversationDto};
use crate::message::{
    self,
    model::{LastMessage, MessageDto, MessagePage, MessageRead},
};

/// Partial conversation update applied on live events, so the roster stays
/// fresh without a refetch.
#[derive(Clone, Debug, Default)]
pub struct ConversationPatch {
    pub name: Option<String>,
    pub last_message: Option<LastMessage>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationPatch {
    fn apply(self, conversation: &mut ConversationDto) {
        if let Some(name) = self.name {
            conversation.name = Some(name);
        }
        if let Some(last_message) = self.last_message {
            conversation.last_message = Some(last_message);
        }
        if let Some(updated_at) = self.updated_at {
            conversation.updated_at = updated_at;
        }
    }
}

/// Partial message update applied by identity.
#[derive(Clone, Debug, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub is_edited: Option<bool>,
    pub is_deleted: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&MessageDto> for MessagePatch {
    fn from(message: &MessageDto) -> Self {
        Self {
            content: Some(message.content.clone()),
            is_edited: Some(message.is_edited),
            is_deleted: Some(message.is_deleted),
            updated_at: Some(message.updated_at),
        }
    }
}

impl MessagePatch {
    fn apply(self, message: &mut MessageDto) {
        if let Some(content) = self.content {
            message.content = content;
        }
        if let Some(is_edited) = self.is_edited {
            message.is_edited = is_edited;
        }
        if let Some(is_deleted) = self.is_deleted {
            message.is_deleted = is_deleted;
        }
        if let Some(updated_at) = self.updated_at {
            message.updated_at = updated_at;
        }
    }
}

/// Client-resident merge of the pull path (pages) and the push path (live
/// events). Both feed the same window; identity keys and the (created_at, id)
/// order make the merge insensitive to arrival interleaving.
#[derive(Debug, Default)]
pub struct ChatStore {
    conversations: Vec<ConversationDto>,
    active_conversation: Option<conversation::Id>,
    messages: Vec<MessageDto>,
    has_more: bool,
    next_cursor: Option<message::Id>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// conversation roster
impl ChatStore {
    pub fn set_conversations(&mut self, conversations: Vec<ConversationDto>) {
        self.conversations = conversations;
    }

    /// Dedupes by identity and moves the conversation to the front.
    pub fn add_conversation(&mut self, conversation: ConversationDto) {
        self.conversations.retain(|c| c.id != conversation.id);
        self.conversations.insert(0, conversation);
    }

    /// Merging into an unknown conversation is a silent no-op; the next
    /// roster fetch will carry it.
    pub fn update_conversation(&mut self, id: &conversation::Id, patch: ConversationPatch) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == *id) {
            patch.apply(conversation);
        }
    }

    pub fn increment_unread(&mut self, id: &conversation::Id) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == *id) {
            conversation.unread_count += 1;
        }
    }

    pub fn reset_unread(&mut self, id: &conversation::Id) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == *id) {
            conversation.unread_count = 0;
        }
    }

    /// Activating a conversation is the single place the unread counter
    /// resets.
    pub fn set_active_conversation(&mut self, id: Option<conversation::Id>) {
        self.active_conversation = id;
        if let Some(id) = id {
            self.reset_unread(&id);
        }
    }

    pub const fn active_conversation(&self) -> Option<conversation::Id> {
        self.active_conversation
    }

    pub fn conversations(&self) -> &[ConversationDto] {
        &self.conversations
    }
}

// message window
impl ChatStore {
    /// Replaces the window with a freshly fetched page.
    pub fn set_messages(&mut self, page: MessagePage) {
        self.messages = page.messages;
        self.messages.sort_by_key(MessageDto::sort_key);
        self.messages.dedup_by_key(|m| m.id);
        self.has_more = page.has_more;
        self.next_cursor = page.next_cursor;
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.has_more = false;
        self.next_cursor = None;
    }

    /// Idempotent by identity: both delivery paths may surface the same
    /// message, and the broker may redeliver.
    pub fn add_message(&mut self, message: MessageDto) {
        if self.contains(&message.id) {
            return;
        }

        let key = message.sort_key();
        let at = self.messages.partition_point(|m| m.sort_key() <= key);
        self.messages.insert(at, message);
    }

    /// Splices an older page in front of the window.
    pub fn prepend_messages(&mut self, page: MessagePage) {
        let mut merged: Vec<MessageDto> = page
            .messages
            .into_iter()
            .filter(|m| !self.contains(&m.id))
            .collect();
        merged.append(&mut self.messages);
        merged.sort_by_key(MessageDto::sort_key);

        self.messages = merged;
        self.has_more = page.has_more;
        self.next_cursor = page.next_cursor;
    }

    /// Updating an identity not in the window is a silent no-op; the next
    /// page fetch restores consistency.
    pub fn update_message(&mut self, id: &message::Id, patch: MessagePatch) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == *id) {
            patch.apply(message);
        }
    }

    /// Receipts are upserts keyed by (message, user).
    pub fn apply_read(&mut self, read: MessageRead) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == read.message_id) else {
            return;
        };

        match message.read_by.iter_mut().find(|r| r.user_id == read.user_id) {
            Some(existing) => existing.read_at = read.read_at,
            None => message.read_by.push(read),
        }
    }

    pub fn remove_message(&mut self, id: &message::Id) {
        self.messages.retain(|m| m.id != *id);
    }

    pub fn messages(&self) -> &[MessageDto] {
        &self.messages
    }

    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    pub const fn next_cursor(&self) -> Option<message::Id> {
        self.next_cursor
    }

    fn contains(&self, id: &message::Id) -> bool {
        self.messages.iter().any(|m| m.id == *id)
    }
}
