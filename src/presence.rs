use std::collections::HashMap;

use crate::event::model::{Member, MembershipEvent};
use crate::user;

/// Online roster derived solely from presence-channel membership signals.
/// If the broker never reports a removal the member stays online; that
/// staleness bound belongs to the broker's membership timeout, not to us.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    members: HashMap<user::Id, Member>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: MembershipEvent) {
        match event {
            MembershipEvent::SubscriptionSucceeded { members } => {
                self.members = members.into_iter().map(|m| (m.id, m)).collect();
            }
            MembershipEvent::MemberAdded(member) => {
                self.members.insert(member.id, member);
            }
            MembershipEvent::MemberRemoved(member) => {
                self.members.remove(&member.id);
            }
        }
    }

    pub fn is_online(&self, id: &user::Id) -> bool {
        self.members.contains_key(id)
    }

    pub fn online_ids(&self) -> Vec<user::Id> {
        self.members.keys().copied().collect()
    }

    pub fn online_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::user::model::Profile;

    use super::*;

    fn member(name: &str) -> Member {
        Member::from(Profile::new(user::Id::random(), name, None))
    }

    #[test]
    fn snapshot_replaces_local_knowledge() {
        let mut tracker = PresenceTracker::new();
        let stale = member("stale");
        tracker.apply(MembershipEvent::MemberAdded(stale.clone()));

        let fresh = member("fresh");
        tracker.apply(MembershipEvent::SubscriptionSucceeded {
            members: vec![fresh.clone()],
        });

        assert!(!tracker.is_online(&stale.id));
        assert!(tracker.is_online(&fresh.id));
        assert_eq!(tracker.online_count(), 1);
    }

    #[test]
    fn members_come_and_go() {
        let mut tracker = PresenceTracker::new();
        let m = member("ada");

        tracker.apply(MembershipEvent::MemberAdded(m.clone()));
        assert!(tracker.is_online(&m.id));

        tracker.apply(MembershipEvent::MemberAdded(m.clone()));
        assert_eq!(tracker.online_count(), 1);

        tracker.apply(MembershipEvent::MemberRemoved(m.clone()));
        assert!(!tracker.is_online(&m.id));
    }

    #[test]
    fn removal_of_unknown_member_is_ignored() {
        let mut tracker = PresenceTracker::new();
        tracker.apply(MembershipEvent::MemberRemoved(member("ghost")));
        assert_eq!(tracker.online_count(), 0);
    }
}
