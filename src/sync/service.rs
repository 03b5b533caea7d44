use std::time::Instant;

use log::debug;

use crate::channel::Channel;
use crate::conversation::{self, model::ConversationDto};
use crate::event;
use crate::event::model::{ConversationEvent, MembershipEvent, UserEvent};
use crate::message::model::{LastMessage, MessagePage, MessageRead};
use crate::presence::PresenceTracker;
use crate::typing::{Typist, TypingTracker};
use crate::user;

use super::store::{ChatStore, ConversationPatch, MessagePatch};
use super::subscription::Subscriptions;

/// One delivery from a bound channel.
#[derive(Clone, Debug)]
pub enum RemoteEvent {
    Conversation(ConversationEvent),
    User(UserEvent),
    Membership(MembershipEvent),
}

/// One client's live view: the reconciliation store plus the ephemeral
/// trackers, wired to the channel stream. Event handling runs to completion
/// per delivery, so no locking is needed beyond the store contracts.
pub struct SyncClient {
    me: user::Id,
    store: ChatStore,
    typing: TypingTracker,
    global_presence: PresenceTracker,
    conversation_presence: PresenceTracker,
    subscriptions: Subscriptions,
}

impl SyncClient {
    pub fn new(me: user::Id, broker: super::Broker) -> Self {
        Self {
            me,
            store: ChatStore::new(),
            typing: TypingTracker::new(),
            global_presence: PresenceTracker::new(),
            conversation_presence: PresenceTracker::new(),
            subscriptions: Subscriptions::new(broker),
        }
    }

    /// Binds the always-on channels: app-wide presence and the personal
    /// notification channel.
    pub async fn connect(&mut self) -> Result<(), event::Error> {
        self.subscriptions.acquire(Channel::Global).await?;
        self.subscriptions.acquire(Channel::User(self.me)).await
    }

    /// Switches the active conversation. The previous conversation's channels
    /// are released and the window cleared before the new ones are bound, so
    /// in-flight events cannot land in the wrong window.
    pub async fn activate_conversation(
        &mut self,
        id: Option<conversation::Id>,
    ) -> Result<(), event::Error> {
        if self.store.active_conversation() == id {
            return Ok(());
        }

        if let Some(previous) = self.store.active_conversation() {
            self.subscriptions
                .release(&Channel::Conversation(previous))
                .await?;
            self.subscriptions
                .release(&Channel::PresenceConversation(previous))
                .await?;
            self.typing.clear(&previous);
        }

        self.store.clear_messages();
        self.conversation_presence = PresenceTracker::new();
        self.store.set_active_conversation(id);

        if let Some(id) = id {
            self.subscriptions.acquire(Channel::Conversation(id)).await?;
            self.subscriptions
                .acquire(Channel::PresenceConversation(id))
                .await?;
        }

        Ok(())
    }
}

// pull path
impl SyncClient {
    pub fn apply_conversations(&mut self, conversations: Vec<ConversationDto>) {
        self.store.set_conversations(conversations);
    }

    pub fn apply_page(&mut self, page: MessagePage) {
        self.store.set_messages(page);
    }

    pub fn apply_older_page(&mut self, page: MessagePage) {
        self.store.prepend_messages(page);
    }
}

// push path
impl SyncClient {
    pub fn handle(&mut self, channel: Channel, event: RemoteEvent, now: Instant) {
        match (channel, event) {
            (Channel::Conversation(id), RemoteEvent::Conversation(event)) => {
                self.on_conversation_event(id, event, now);
            }
            (Channel::User(id), RemoteEvent::User(event)) if id == self.me => {
                self.on_user_event(event);
            }
            (Channel::Global, RemoteEvent::Membership(event)) => {
                self.global_presence.apply(event);
            }
            (Channel::PresenceConversation(id), RemoteEvent::Membership(event))
                if self.store.active_conversation() == Some(id) =>
            {
                self.conversation_presence.apply(event);
            }
            (channel, _) => debug!("dropping event for unbound channel {channel}"),
        }
    }

    fn on_conversation_event(
        &mut self,
        conversation_id: conversation::Id,
        event: ConversationEvent,
        now: Instant,
    ) {
        if self.store.active_conversation() != Some(conversation_id) {
            debug!("dropping event for inactive conversation {conversation_id}");
            return;
        }

        match event {
            ConversationEvent::NewMessage(message) => {
                self.store.update_conversation(
                    &conversation_id,
                    ConversationPatch {
                        last_message: Some(LastMessage::from(&message)),
                        updated_at: Some(message.created_at),
                        ..Default::default()
                    },
                );
                self.store.add_message(message);
            }
            ConversationEvent::MessageUpdated(message) => {
                self.store
                    .update_message(&message.id, MessagePatch::from(&message));
            }
            ConversationEvent::MessageDeleted { message_id, .. } => {
                self.store.remove_message(&message_id);
            }
            ConversationEvent::MessageRead {
                message_id,
                user_id,
                read_at,
                ..
            } => {
                self.store.apply_read(MessageRead {
                    message_id,
                    user_id,
                    read_at,
                });
            }
            ConversationEvent::TypingStart { user_id, user_name } => {
                if user_id != self.me {
                    self.typing
                        .observe_start(conversation_id, Typist { user_id, user_name }, now);
                }
            }
            ConversationEvent::TypingStop { user_id, .. } => {
                self.typing.observe_stop(&conversation_id, &user_id);
            }
        }
    }

    fn on_user_event(&mut self, event: UserEvent) {
        match event {
            UserEvent::NewMessage {
                conversation_id,
                message,
            } => {
                // the conversation channel owns the active window
                if self.store.active_conversation() == Some(conversation_id) {
                    return;
                }

                self.store.update_conversation(
                    &conversation_id,
                    ConversationPatch {
                        last_message: Some(LastMessage::from(&message)),
                        updated_at: Some(message.created_at),
                        ..Default::default()
                    },
                );
                self.store.increment_unread(&conversation_id);
            }
        }
    }
}

// views
impl SyncClient {
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn typists(&mut self, now: Instant) -> Vec<Typist> {
        match self.store.active_conversation() {
            Some(id) => self.typing.typists(&id, now),
            None => Vec::new(),
        }
    }

    pub fn is_online(&self, user_id: &user::Id) -> bool {
        self.global_presence.is_online(user_id)
    }

    pub fn conversation_presence(&self) -> &PresenceTracker {
        &self.conversation_presence
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }
}
