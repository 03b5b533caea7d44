use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{conversation, user};

/// Liveness window after the last observed start signal. A stop that never
/// arrives is covered by expiry alone.
pub const TYPING_WINDOW: Duration = Duration::from_secs(3);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Typist {
    pub user_id: user::Id,
    pub user_name: String,
}

#[derive(Debug)]
struct Session {
    user_name: String,
    expires_at: Instant,
}

/// Observer side: remote typists as seen by one viewer, keyed per
/// (conversation, user). A repeated start rearms the window instead of
/// creating a duplicate entry.
#[derive(Debug, Default)]
pub struct TypingTracker {
    sessions: HashMap<(conversation::Id, user::Id), Session>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_start(&mut self, conversation_id: conversation::Id, typist: Typist, now: Instant) {
        self.sessions.insert(
            (conversation_id, typist.user_id),
            Session {
                user_name: typist.user_name,
                expires_at: now + TYPING_WINDOW,
            },
        );
    }

    pub fn observe_stop(&mut self, conversation_id: &conversation::Id, user_id: &user::Id) {
        self.sessions.remove(&(*conversation_id, *user_id));
    }

    /// Live typists in the conversation; expired sessions are dropped on the
    /// way out.
    pub fn typists(&mut self, conversation_id: &conversation::Id, now: Instant) -> Vec<Typist> {
        self.sessions.retain(|_, session| now < session.expires_at);

        self.sessions
            .iter()
            .filter(|((c, _), _)| c == conversation_id)
            .map(|((_, user_id), session)| Typist {
                user_id: *user_id,
                user_name: session.user_name.clone(),
            })
            .collect()
    }

    pub fn clear(&mut self, conversation_id: &conversation::Id) {
        self.sessions.retain(|(c, _), _| c != conversation_id);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Start,
    Stop,
}

/// Sender side: debounces keystrokes into a single start per burst and
/// guarantees a stop, either after the silence window or on message send.
#[derive(Debug, Default)]
pub struct TypingEmitter {
    armed: bool,
    deadline: Option<Instant>,
}

impl TypingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keystroke(&mut self, now: Instant) -> Option<Signal> {
        self.deadline = Some(now + TYPING_WINDOW);

        if self.armed {
            None
        } else {
            self.armed = true;
            Some(Signal::Start)
        }
    }

    pub fn tick(&mut self, now: Instant) -> Option<Signal> {
        match self.deadline {
            Some(deadline) if self.armed && now >= deadline => {
                self.armed = false;
                self.deadline = None;
                Some(Signal::Stop)
            }
            _ => None,
        }
    }

    pub fn message_sent(&mut self) -> Option<Signal> {
        self.deadline = None;

        if self.armed {
            self.armed = false;
            Some(Signal::Stop)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typist(name: &str) -> Typist {
        Typist {
            user_id: user::Id::random(),
            user_name: name.into(),
        }
    }

    #[test]
    fn session_expires_after_exactly_the_window() {
        let mut tracker = TypingTracker::new();
        let conversation_id = conversation::Id::random();
        let t0 = Instant::now();

        tracker.observe_start(conversation_id, typist("ada"), t0);

        assert_eq!(
            tracker
                .typists(&conversation_id, t0 + TYPING_WINDOW - Duration::from_millis(1))
                .len(),
            1
        );
        assert!(tracker.typists(&conversation_id, t0 + TYPING_WINDOW).is_empty());
    }

    #[test]
    fn restart_rearms_the_window() {
        let mut tracker = TypingTracker::new();
        let conversation_id = conversation::Id::random();
        let ada = typist("ada");
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);

        tracker.observe_start(conversation_id, ada.clone(), t0);
        tracker.observe_start(conversation_id, ada.clone(), t1);

        // still alive where the first window alone would have expired
        assert_eq!(tracker.typists(&conversation_id, t0 + TYPING_WINDOW).len(), 1);
        assert!(tracker.typists(&conversation_id, t1 + TYPING_WINDOW).is_empty());
    }

    #[test]
    fn restart_does_not_duplicate_the_typist() {
        let mut tracker = TypingTracker::new();
        let conversation_id = conversation::Id::random();
        let ada = typist("ada");
        let t0 = Instant::now();

        tracker.observe_start(conversation_id, ada.clone(), t0);
        tracker.observe_start(conversation_id, ada, t0 + Duration::from_millis(100));

        assert_eq!(tracker.typists(&conversation_id, t0 + Duration::from_secs(1)).len(), 1);
    }

    #[test]
    fn stop_wins_over_expiry() {
        let mut tracker = TypingTracker::new();
        let conversation_id = conversation::Id::random();
        let ada = typist("ada");
        let t0 = Instant::now();

        tracker.observe_start(conversation_id, ada.clone(), t0);
        tracker.observe_stop(&conversation_id, &ada.user_id);

        assert!(tracker
            .typists(&conversation_id, t0 + Duration::from_millis(1))
            .is_empty());
    }

    #[test]
    fn emitter_sends_one_start_per_burst() {
        let mut emitter = TypingEmitter::new();
        let t0 = Instant::now();

        assert_eq!(emitter.keystroke(t0), Some(Signal::Start));
        assert_eq!(emitter.keystroke(t0 + Duration::from_millis(200)), None);
        assert_eq!(emitter.keystroke(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn emitter_stops_after_silence() {
        let mut emitter = TypingEmitter::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);

        emitter.keystroke(t0);
        emitter.keystroke(t1);

        // the last keystroke owns the deadline
        assert_eq!(emitter.tick(t0 + TYPING_WINDOW), None);
        assert_eq!(emitter.tick(t1 + TYPING_WINDOW), Some(Signal::Stop));
        assert_eq!(emitter.tick(t1 + TYPING_WINDOW + TYPING_WINDOW), None);
    }

    #[test]
    fn emitter_stops_immediately_on_send() {
        let mut emitter = TypingEmitter::new();
        let t0 = Instant::now();

        emitter.keystroke(t0);
        assert_eq!(emitter.message_sent(), Some(Signal::Stop));
        assert_eq!(emitter.message_sent(), None);

        // next burst starts fresh
        assert_eq!(emitter.keystroke(t0 + Duration::from_secs(1)), Some(Signal::Start));
    }
}
