//! Client-side state derived from relay callbacks.
//!
//! Browsers keep a copy of presence membership and of the currently pinned
//! question. These types hold the same state for Rust clients: feed them
//! the `(event name, data)` pairs a subscription delivers and read the
//! result back.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::events::RelayEvent;

/// Membership changes announced on a presence channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Subscription confirmed, carrying the full member list.
    SubscriptionSucceeded { members: HashMap<String, Value> },
    MemberAdded { user_id: String, user_info: Value },
    MemberRemoved { user_id: String },
}

impl PresenceEvent {
    /// Parse a presence callback. Accepts both the public (`pusher:`) and the
    /// protocol-level (`pusher_internal:`) spellings.
    pub fn from_wire(name: &str, data: &Value) -> Option<Self> {
        let kind = name
            .strip_prefix("pusher:")
            .or_else(|| name.strip_prefix("pusher_internal:"))?;

        match kind {
            "subscription_succeeded" => {
                let hash = data
                    .get("presence")
                    .and_then(|p| p.get("hash"))
                    .and_then(Value::as_object);
                let members = hash
                    .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                Some(Self::SubscriptionSucceeded { members })
            }
            "member_added" => Some(Self::MemberAdded {
                user_id: member_id(data)?,
                user_info: data.get("user_info").cloned().unwrap_or(Value::Null),
            }),
            "member_removed" => Some(Self::MemberRemoved {
                user_id: member_id(data)?,
            }),
            _ => None,
        }
    }
}

/// The relay sends ids either as strings or as numbers.
fn member_id(data: &Value) -> Option<String> {
    match data.get("user_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Local copy of a presence channel's member map.
#[derive(Debug, Default, Clone)]
pub struct PresenceRoster {
    members: HashMap<String, Value>,
    subscribed: bool,
}

impl PresenceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::SubscriptionSucceeded { members } => {
                self.members = members;
                self.subscribed = true;
            }
            PresenceEvent::MemberAdded { user_id, user_info } => {
                self.members.insert(user_id, user_info);
            }
            PresenceEvent::MemberRemoved { user_id } => {
                self.members.remove(&user_id);
            }
        }
        debug!("presence roster now has {} members", self.members.len());
    }

    /// Convenience for raw callbacks. Returns false for events that are not
    /// presence updates.
    pub fn apply_wire(&mut self, name: &str, data: &Value) -> bool {
        match PresenceEvent::from_wire(name, data) {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members other than the local session, as shown by the "connected"
    /// counter.
    pub fn others_connected(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.members.contains_key(user_id)
    }
}

/// What the embed overlay is showing.
#[derive(Debug, Default, Clone)]
pub struct PinnedQuestion {
    current: Option<String>,
}

impl PinnedQuestion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::QuestionPinned { question } => self.current = Some(question.clone()),
            RelayEvent::QuestionUnpinned => self.current = None,
            RelayEvent::NewQuestion => {}
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn succeeded(ids: &[&str]) -> Value {
        let hash: serde_json::Map<String, Value> = ids
            .iter()
            .map(|id| (id.to_string(), json!({ "name": "guest" })))
            .collect();
        json!({ "presence": { "ids": ids, "hash": hash, "count": ids.len() } })
    }

    #[test]
    fn roster_follows_membership_callbacks() {
        let mut roster = PresenceRoster::new();
        assert_eq!(roster.others_connected(), 0);

        assert!(roster.apply_wire("pusher:subscription_succeeded", &succeeded(&["me", "a"])));
        assert!(roster.is_subscribed());
        assert_eq!(roster.member_count(), 2);
        assert_eq!(roster.others_connected(), 1);

        roster.apply_wire("pusher:member_added", &json!({ "user_id": "b", "user_info": {} }));
        assert_eq!(roster.member_count(), 3);
        assert!(roster.contains("b"));

        roster.apply_wire("pusher_internal:member_removed", &json!({ "user_id": "a" }));
        assert_eq!(roster.member_count(), 2);
        assert!(!roster.contains("a"));
    }

    #[test]
    fn duplicate_add_does_not_double_count() {
        let mut roster = PresenceRoster::new();
        roster.apply_wire("pusher:member_added", &json!({ "user_id": 7 }));
        roster.apply_wire("pusher:member_added", &json!({ "user_id": "7" }));
        assert_eq!(roster.member_count(), 1);
    }

    #[test]
    fn non_presence_events_are_ignored() {
        let mut roster = PresenceRoster::new();
        assert!(!roster.apply_wire("new-question", &json!({})));
        assert!(!roster.apply_wire("pusher:member_removed", &json!({})));
        assert_eq!(roster.member_count(), 0);
    }

    #[test]
    fn resubscribe_replaces_members() {
        let mut roster = PresenceRoster::new();
        roster.apply_wire("pusher:subscription_succeeded", &succeeded(&["a", "b", "c"]));
        roster.apply_wire("pusher:subscription_succeeded", &succeeded(&["me"]));
        assert_eq!(roster.member_count(), 1);
        assert_eq!(roster.others_connected(), 0);
    }

    #[test]
    fn pinned_question_tracks_pin_and_unpin() {
        let mut pinned = PinnedQuestion::new();
        assert_eq!(pinned.current(), None);

        pinned.apply(&RelayEvent::QuestionPinned {
            question: "first".into(),
        });
        pinned.apply(&RelayEvent::NewQuestion);
        assert_eq!(pinned.current(), Some("first"));

        pinned.apply(&RelayEvent::QuestionPinned {
            question: "second".into(),
        });
        assert_eq!(pinned.current(), Some("second"));

        pinned.apply(&RelayEvent::QuestionUnpinned);
        assert_eq!(pinned.current(), None);
    }
}
