use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use messenger_sync::channel::Channel;
use messenger_sync::channel::model::{Grant, PresenceData};
use messenger_sync::conversation::model::{ConversationDto, CreateParams};
use messenger_sync::conversation::repository::InMemoryConversationRepository;
use messenger_sync::conversation::service::ConversationService;
use messenger_sync::event::service::{Broker, FanoutService};
use messenger_sync::message::model::{Kind, SendParams};
use messenger_sync::message::repository::InMemoryMessageRepository;
use messenger_sync::message::service::MessageService;
use messenger_sync::user::model::Profile;
use messenger_sync::user::repository::InMemoryProfileRepository;
use messenger_sync::{conversation, event, message, user};

#[derive(Default)]
struct RecordingBroker {
    published: Mutex<Vec<(Channel, String, Value)>>,
}

impl RecordingBroker {
    fn published(&self) -> Vec<(Channel, String, Value)> {
        self.published.lock().unwrap().clone()
    }

    fn events_on(&self, channel: &Channel) -> Vec<(String, Value)> {
        self.published()
            .into_iter()
            .filter(|(c, _, _)| c == channel)
            .map(|(_, event, payload)| (event, payload))
            .collect()
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn trigger(
        &self,
        channel: &Channel,
        event: &str,
        payload: Value,
    ) -> Result<(), event::Error> {
        self.published
            .lock()
            .unwrap()
            .push((channel.clone(), event.to_owned(), payload));
        Ok(())
    }

    fn authorize_channel(
        &self,
        socket_id: &str,
        channel: &Channel,
        presence: Option<&PresenceData>,
    ) -> Result<Grant, event::Error> {
        Ok(Grant {
            auth: format!("{socket_id}:{channel}"),
            channel_data: presence.cloned(),
        })
    }
}

struct Harness {
    conversations: ConversationService,
    messages: MessageService,
    broker: Arc<RecordingBroker>,
    ada: user::Id,
    bob: user::Id,
}

impl Harness {
    async fn direct_conversation(&self) -> ConversationDto {
        self.conversations
            .create(
                &self.ada,
                &CreateParams {
                    participant_ids: vec![self.bob],
                    name: None,
                    is_group: false,
                },
            )
            .await
            .unwrap()
    }

    async fn send(&self, sender: &user::Id, conversation_id: &conversation::Id, content: &str) -> message::model::MessageDto {
        self.messages
            .create(
                sender,
                conversation_id,
                &SendParams {
                    content: Some(content.to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }
}

async fn harness() -> Harness {
    let profile_store = Arc::new(InMemoryProfileRepository::default());
    let ada = user::Id::random();
    let bob = user::Id::random();
    profile_store.insert(Profile::new(ada, "Ada", None)).await;
    profile_store.insert(Profile::new(bob, "Bob", None)).await;

    let profiles: user::Profiles = profile_store;
    let conversations: conversation::Repository = Arc::new(InMemoryConversationRepository::default());
    let messages: message::Repository = Arc::new(InMemoryMessageRepository::default());

    let broker = Arc::new(RecordingBroker::default());
    let fanout = FanoutService::new(broker.clone());

    Harness {
        conversations: ConversationService::new(
            conversations.clone(),
            messages.clone(),
            profiles.clone(),
            fanout.clone(),
        ),
        messages: MessageService::new(messages, conversations, profiles, fanout),
        broker,
        ada,
        bob,
    }
}

#[tokio::test]
async fn sending_a_message_fans_out_to_conversation_and_personal_channels() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    assert_eq!(sent.kind, Kind::Text);
    assert_eq!(sent.content, "hi");
    assert!(sent.read_by.is_empty());

    let refreshed = h
        .conversations
        .find_one(&h.bob, &conversation.id)
        .await
        .unwrap();
    assert_eq!(refreshed.updated_at, sent.created_at);

    let on_conversation = h.broker.events_on(&Channel::Conversation(conversation.id));
    assert_eq!(on_conversation.len(), 1);
    let (event, payload) = &on_conversation[0];
    assert_eq!(event, event::NEW_MESSAGE);
    assert_eq!(payload["content"], json!("hi"));
    assert_eq!(payload["readBy"], json!([]));

    let on_personal = h.broker.events_on(&Channel::User(h.bob));
    assert_eq!(on_personal.len(), 1);
    let (event, envelope) = &on_personal[0];
    assert_eq!(event, event::NEW_MESSAGE);
    assert_eq!(
        envelope["conversationId"],
        serde_json::to_value(conversation.id).unwrap()
    );
    assert_eq!(envelope["message"]["content"], json!("hi"));

    assert!(h.broker.events_on(&Channel::User(h.ada)).is_empty());
}

#[tokio::test]
async fn empty_content_without_attachment_is_rejected_before_any_write() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    let result = h
        .messages
        .create(&h.ada, &conversation.id, &SendParams::default())
        .await;

    assert!(matches!(result, Err(message::Error::EmptyContent)));
    assert!(h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .is_empty());
}

#[tokio::test]
async fn attachment_alone_carries_an_empty_content_message() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    let sent = h
        .messages
        .create(
            &h.ada,
            &conversation.id,
            &SendParams {
                kind: Some(Kind::Image),
                attachment_url: Some("https://cdn.example/cat.png".into()),
                attachment_type: Some("image/png".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(sent.content, "");
    assert_eq!(sent.kind, Kind::Image);
    assert_eq!(sent.attachment_url.as_deref(), Some("https://cdn.example/cat.png"));
}

#[tokio::test]
async fn outsiders_are_told_the_conversation_does_not_exist() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let outsider = user::Id::random();

    let result = h
        .messages
        .create(
            &outsider,
            &conversation.id,
            &SendParams {
                content: Some("hi".into()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(message::Error::_Conversation(
            conversation::Error::NotFound(_)
        ))
    ));
}

#[tokio::test]
async fn marking_read_upserts_the_receipt_and_publishes_once_per_mark() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    let first = h
        .messages
        .mark_read(&h.bob, &sent.id)
        .await
        .unwrap()
        .expect("receipt expected");
    assert_eq!(first.user_id, h.bob);

    let second = h
        .messages
        .mark_read(&h.bob, &sent.id)
        .await
        .unwrap()
        .expect("receipt expected");
    assert!(second.read_at >= first.read_at);

    let page = h
        .messages
        .page(&h.bob, &conversation.id, None, None)
        .await
        .unwrap();
    assert_eq!(page.messages[0].read_by.len(), 1);

    let reads: Vec<(String, Value)> = h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .into_iter()
        .filter(|(event, _)| event == event::MESSAGE_READ)
        .collect();
    assert_eq!(reads.len(), 2);
    assert_eq!(
        reads[0].1["userId"],
        serde_json::to_value(h.bob).unwrap()
    );
}

#[tokio::test]
async fn reading_an_own_message_is_a_noop() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    let receipt = h.messages.mark_read(&h.ada, &sent.id).await.unwrap();
    assert!(receipt.is_none());

    let reads = h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .into_iter()
        .filter(|(event, _)| event == event::MESSAGE_READ)
        .count();
    assert_eq!(reads, 0);
}

#[tokio::test]
async fn editing_a_deleted_message_conflicts_and_stays_silent() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    h.messages.delete(&h.ada, &sent.id).await.unwrap();

    let result = h.messages.edit(&h.ada, &sent.id, "hi again").await;
    assert!(matches!(result, Err(message::Error::EditDeleted)));

    let updates = h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .into_iter()
        .filter(|(event, _)| event == event::MESSAGE_UPDATED)
        .count();
    assert_eq!(updates, 0);
}

#[tokio::test]
async fn only_the_sender_may_edit_or_delete() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    let edit = h.messages.edit(&h.bob, &sent.id, "hijacked").await;
    assert!(matches!(edit, Err(message::Error::NotSender)));

    let delete = h.messages.delete(&h.bob, &sent.id).await;
    assert!(matches!(delete, Err(message::Error::NotSender)));
}

#[tokio::test]
async fn editing_publishes_the_full_updated_message() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    let edited = h.messages.edit(&h.ada, &sent.id, "  hi there  ").await.unwrap();
    assert_eq!(edited.content, "hi there");
    assert!(edited.is_edited);
    assert_eq!(edited.created_at, sent.created_at);

    let updates: Vec<(String, Value)> = h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .into_iter()
        .filter(|(event, _)| event == event::MESSAGE_UPDATED)
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1["content"], json!("hi there"));
    assert_eq!(updates[0].1["isEdited"], json!(true));
}

#[tokio::test]
async fn deleting_soft_deletes_and_publishes_identities_only() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    let sent = h.send(&h.ada, &conversation.id, "hi").await;

    h.messages.delete(&h.ada, &sent.id).await.unwrap();

    let page = h
        .messages
        .page(&h.bob, &conversation.id, None, None)
        .await
        .unwrap();
    assert!(page.messages.is_empty());

    let deletes: Vec<(String, Value)> = h
        .broker
        .events_on(&Channel::Conversation(conversation.id))
        .into_iter()
        .filter(|(event, _)| event == event::MESSAGE_DELETED)
        .collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(
        deletes[0].1,
        json!({
            "messageId": sent.id,
            "conversationId": conversation.id,
        })
    );
}

#[tokio::test]
async fn pagination_walks_history_backwards() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    for i in 0..5 {
        h.send(&h.ada, &conversation.id, &format!("m{i}")).await;
    }

    let newest = h
        .messages
        .page(&h.bob, &conversation.id, None, Some(2))
        .await
        .unwrap();
    assert_eq!(newest.messages.len(), 2);
    assert!(newest.has_more);
    let contents: Vec<&str> = newest.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m3", "m4"]);
    assert_eq!(newest.next_cursor, Some(newest.messages[0].id));

    let older = h
        .messages
        .page(&h.bob, &conversation.id, newest.next_cursor, Some(2))
        .await
        .unwrap();
    let contents: Vec<&str> = older.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m1", "m2"]);
    assert!(older.has_more);

    let oldest = h
        .messages
        .page(&h.bob, &conversation.id, older.next_cursor, Some(2))
        .await
        .unwrap();
    let contents: Vec<&str> = oldest.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m0"]);
    assert!(!oldest.has_more);
    assert_eq!(oldest.next_cursor, None);
}

#[tokio::test]
async fn unread_counts_follow_the_read_watermark() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    h.send(&h.ada, &conversation.id, "one").await;
    h.send(&h.ada, &conversation.id, "two").await;

    let for_bob = h.conversations.find_all(&h.bob).await.unwrap();
    assert_eq!(for_bob[0].unread_count, 2);

    let for_ada = h.conversations.find_all(&h.ada).await.unwrap();
    assert_eq!(for_ada[0].unread_count, 0);

    h.messages
        .page(&h.bob, &conversation.id, None, None)
        .await
        .unwrap();

    let for_bob = h.conversations.find_all(&h.bob).await.unwrap();
    assert_eq!(for_bob[0].unread_count, 0);
}

#[tokio::test]
async fn direct_conversations_are_deduplicated_by_participant_set() {
    let h = harness().await;
    let first = h.direct_conversation().await;

    let second = h
        .conversations
        .create(
            &h.bob,
            &CreateParams {
                participant_ids: vec![h.ada],
                name: None,
                is_group: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn leaving_the_last_participant_cascades_the_conversation() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;
    h.send(&h.ada, &conversation.id, "hi").await;

    h.conversations.leave(&h.ada, &conversation.id).await.unwrap();
    h.conversations.leave(&h.bob, &conversation.id).await.unwrap();

    let gone = h.conversations.find_one(&h.bob, &conversation.id).await;
    assert!(matches!(gone, Err(conversation::Error::NotFound(_))));
    assert!(h.conversations.find_all(&h.ada).await.unwrap().is_empty());
}

#[tokio::test]
async fn typing_signals_fan_out_with_the_sender_name() {
    let h = harness().await;
    let conversation = h.direct_conversation().await;

    h.conversations
        .typing(&h.ada, &conversation.id, true)
        .await
        .unwrap();
    h.conversations
        .typing(&h.ada, &conversation.id, false)
        .await
        .unwrap();

    let events = h.broker.events_on(&Channel::Conversation(conversation.id));
    let typing: Vec<&(String, Value)> = events
        .iter()
        .filter(|(event, _)| event == event::TYPING_START || event == event::TYPING_STOP)
        .collect();

    assert_eq!(typing.len(), 2);
    assert_eq!(typing[0].0, event::TYPING_START);
    assert_eq!(typing[0].1["userName"], json!("Ada"));
    assert_eq!(typing[1].0, event::TYPING_STOP);
}
