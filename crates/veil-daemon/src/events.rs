//! Event emission.
//!
//! Events are pushed from the daemon to subscribed connections as JSON-RPC
//! notifications, and only after the transaction that caused them has
//! committed. Each subscriber has an independent buffer; a slow subscriber
//! loses the oldest events rather than blocking writers.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use veil_disclosure::AnswerOutcome;
use veil_types::{QuizSession, Timestamp};

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "TierUnlocked", "DaemonStarted").
    pub event_type: String,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event_type: &str, timestamp: Timestamp, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            timestamp,
            payload,
        }
    }

    pub fn session_started(session: &QuizSession) -> Self {
        Self::new(
            "SessionStarted",
            session.started_at,
            serde_json::json!({
                "session_id": session.id,
                "asker_id": session.asker_id,
                "target_id": session.target_id,
                "entry_cost": session.entry_cost,
            }),
        )
    }

    pub fn session_ended(session: &QuizSession, now: Timestamp) -> Self {
        Self::new(
            "SessionEnded",
            session.ended_at.unwrap_or(now),
            serde_json::json!({
                "session_id": session.id,
                "asker_id": session.asker_id,
                "target_id": session.target_id,
            }),
        )
    }

    /// One `TierUnlocked` per tier the pair reached for the first time, plus
    /// `MeetingEligible` when that includes T3. Photo catch-ups emit nothing.
    pub fn from_answer(outcome: &AnswerOutcome, now: Timestamp) -> Vec<Self> {
        let mut events: Vec<Self> = outcome
            .stages_reached
            .iter()
            .map(|tier| {
                Self::new(
                    "TierUnlocked",
                    now,
                    serde_json::json!({
                        "viewer_id": outcome.viewer_id,
                        "target_id": outcome.target_id,
                        "tier": tier,
                        "score": outcome.score,
                    }),
                )
            })
            .collect();
        if outcome.reached_top_tier() {
            events.push(Self::new(
                "MeetingEligible",
                now,
                serde_json::json!({
                    "viewer_id": outcome.viewer_id,
                    "target_id": outcome.target_id,
                }),
            ));
        }
        events
    }
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "quiz", "disclosure", "system".
    pub categories: Option<Vec<String>>,
    /// Only events whose payload names one of these users as viewer,
    /// target or asker.
    pub user_ids: Option<Vec<i64>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref categories) = self.categories {
            let event_category = categorize_event(&event.event_type);
            if !categories.iter().any(|c| c == event_category) {
                return false;
            }
        }

        if let Some(ref user_ids) = self.user_ids {
            let involved: BTreeSet<i64> = ["viewer_id", "target_id", "asker_id"]
                .iter()
                .filter_map(|key| event.payload.get(*key).and_then(|v| v.as_i64()))
                .collect();
            if !user_ids.iter().any(|id| involved.contains(id)) {
                return false;
            }
        }

        true
    }
}

/// Categorize an event type into a category.
fn categorize_event(event_type: &str) -> &'static str {
    match event_type {
        s if s.starts_with("Session") => "quiz",
        s if s.starts_with("Tier") || s.starts_with("Meeting") => "disclosure",
        _ => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::{AnswerRecord, Choice, QuizMode, Tier};

    fn outcome(reached: &[Tier], crossed: &[Tier]) -> AnswerOutcome {
        AnswerOutcome {
            viewer_id: 1,
            target_id: 2,
            correct: true,
            target_choice: Choice::Left,
            delta_affinity: 3,
            delta_currency: 0,
            score: 61,
            stages_reached: reached.iter().copied().collect(),
            crossed_tiers: crossed.iter().copied().collect(),
            upgrades: Vec::new(),
            answer: AnswerRecord {
                id: 1,
                session_id: 1,
                question_id: 1,
                asker_guess: Choice::Left,
                target_choice: Choice::Left,
                correct: true,
                delta_affinity: 3,
                delta_currency: 0,
                created_at: 0,
            },
        }
    }

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(Event::new(
            "DaemonStarted",
            1000,
            serde_json::json!({"version": "0.1.0"}),
        ));

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, "DaemonStarted");
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_answer_events() {
        let reached = [Tier::T2, Tier::T3];
        let events = Event::from_answer(&outcome(&reached, &reached), 5);
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["TierUnlocked", "TierUnlocked", "MeetingEligible"]);
        assert_eq!(events[0].payload["tier"], "T2");

        assert!(Event::from_answer(&outcome(&[], &[]), 5).is_empty());
    }

    #[test]
    fn test_photo_catch_up_emits_nothing() {
        let crossed = [Tier::T1, Tier::T2, Tier::T3];
        assert!(Event::from_answer(&outcome(&[], &crossed), 5).is_empty());
    }

    #[test]
    fn test_session_events() {
        let session = QuizSession {
            id: 7,
            asker_id: 1,
            target_id: 2,
            mode: QuizMode::Standard,
            entry_cost: 1,
            started_at: 100,
            ended_at: Some(160),
        };
        assert_eq!(Event::session_started(&session).timestamp, 100);
        assert_eq!(Event::session_ended(&session, 999).timestamp, 160);
    }

    #[test]
    fn test_event_filter_categories() {
        let filter = EventFilter {
            categories: Some(vec!["disclosure".to_string()]),
            user_ids: None,
        };
        let tier = Event::new("TierUnlocked", 0, serde_json::json!({}));
        assert!(filter.matches(&tier));
        let session = Event::new("SessionStarted", 0, serde_json::json!({}));
        assert!(!filter.matches(&session));
    }

    #[test]
    fn test_event_filter_users() {
        let filter = EventFilter {
            categories: None,
            user_ids: Some(vec![2]),
        };
        let mine = Event::new("TierUnlocked", 0, serde_json::json!({"viewer_id": 1, "target_id": 2}));
        let other = Event::new("TierUnlocked", 0, serde_json::json!({"viewer_id": 3, "target_id": 4}));
        assert!(filter.matches(&mine));
        assert!(!filter.matches(&other));
    }

    #[test]
    fn test_categorize_event() {
        assert_eq!(categorize_event("SessionStarted"), "quiz");
        assert_eq!(categorize_event("SessionEnded"), "quiz");
        assert_eq!(categorize_event("TierUnlocked"), "disclosure");
        assert_eq!(categorize_event("MeetingEligible"), "disclosure");
        assert_eq!(categorize_event("DaemonStarted"), "system");
    }
}
