use std::collections::HashMap;

use async_trait::async_trait;

use crate::channel::Channel;
use crate::event;

/// Client half of the broker connection. One connection is shared by every
/// consumer; implementations only need raw subscribe/unsubscribe.
#[async_trait]
pub trait ClientBroker {
    async fn subscribe(&self, channel: &Channel) -> event::Result<()>;

    async fn unsubscribe(&self, channel: &Channel) -> event::Result<()>;
}

/// Ref-counted channel subscriptions. Multiple consumers can watch the same
/// channel; the broker sees one subscribe and one unsubscribe.
pub struct Subscriptions {
    broker: super::Broker,
    counts: HashMap<Channel, usize>,
}

impl Subscriptions {
    pub fn new(broker: super::Broker) -> Self {
        Self {
            broker,
            counts: HashMap::new(),
        }
    }

    pub async fn acquire(&mut self, channel: Channel) -> event::Result<()> {
        let count = self.counts.entry(channel.clone()).or_insert(0);
        if *count == 0 {
            self.broker.subscribe(&channel).await?;
        }
        *count += 1;

        Ok(())
    }

    /// Releasing a channel that was never acquired is a no-op.
    pub async fn release(&mut self, channel: &Channel) -> event::Result<()> {
        let Some(count) = self.counts.get_mut(channel) else {
            return Ok(());
        };

        *count -= 1;
        if *count == 0 {
            self.counts.remove(channel);
            self.broker.unsubscribe(channel).await?;
        }

        Ok(())
    }

    pub fn is_subscribed(&self, channel: &Channel) -> bool {
        self.counts.contains_key(channel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use crate::conversation;

    use super::*;

    #[derive(Default)]
    struct CountingBroker {
        subscribes: Mutex<Vec<Channel>>,
        unsubscribes: Mutex<Vec<Channel>>,
    }

    #[async_trait]
    impl ClientBroker for CountingBroker {
        async fn subscribe(&self, channel: &Channel) -> event::Result<()> {
            self.subscribes.lock().unwrap().push(channel.clone());
            Ok(())
        }

        async fn unsubscribe(&self, channel: &Channel) -> event::Result<()> {
            self.unsubscribes.lock().unwrap().push(channel.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn shared_channel_subscribes_once() {
        let broker = Arc::new(CountingBroker::default());
        let mut subs = Subscriptions::new(broker.clone());
        let channel = Channel::Conversation(conversation::Id::random());

        subs.acquire(channel.clone()).await.unwrap();
        subs.acquire(channel.clone()).await.unwrap();

        assert_eq!(broker.subscribes.lock().unwrap().len(), 1);

        subs.release(&channel).await.unwrap();
        assert!(subs.is_subscribed(&channel));
        assert!(broker.unsubscribes.lock().unwrap().is_empty());

        subs.release(&channel).await.unwrap();
        assert!(!subs.is_subscribed(&channel));
        assert_eq!(broker.unsubscribes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn releasing_unknown_channel_is_idempotent() {
        let broker = Arc::new(CountingBroker::default());
        let mut subs = Subscriptions::new(broker.clone());
        let channel = Channel::Global;

        subs.release(&channel).await.unwrap();
        assert!(broker.unsubscribes.lock().unwrap().is_empty());
    }
}
