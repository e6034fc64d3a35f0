//! Time-bounded, in-memory conversation history.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{ConversationRecord, Turn};

/// Idle time after which a conversation is dropped by the sweep.
pub const CONVERSATION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often the background sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// History cap, in entries (20 user/model exchanges).
pub const MAX_HISTORY_ENTRIES: usize = 40;

/// Held while a turn on one conversation is in flight.
pub type ConversationGuard = OwnedMutexGuard<()>;

/// Maps conversation ids to their history.
///
/// Every method is safe to call from concurrent handlers. Callers that read a
/// history and later append to it should hold the guard from [`Self::lock`] for
/// the whole span so that concurrent turns on the same id are serialized.
pub struct ConversationStore {
    timeout: Duration,
    max_history: usize,
    records: DashMap<String, ConversationRecord>,
    gates: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(CONVERSATION_TIMEOUT, MAX_HISTORY_ENTRIES)
    }
}

impl ConversationStore {
    pub fn new(timeout: Duration, max_history: usize) -> Self {
        Self {
            timeout,
            max_history,
            records: DashMap::new(),
            gates: DashMap::new(),
        }
    }

    /// Waits for exclusive use of the conversation `id`.
    pub async fn lock(&self, id: &str) -> ConversationGuard {
        // The entry guard is released before awaiting the gate.
        let gate = self
            .gates
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .value()
            .clone();
        gate.lock_owned().await
    }

    /// Returns a snapshot of the record and marks it as active.
    pub fn get(&self, id: &str) -> Option<ConversationRecord> {
        let mut record = self.records.get_mut(id)?;
        record.last_activity = Utc::now();
        Some(record.value().clone())
    }

    /// Creates the record if it does not exist yet and marks it as active.
    pub fn upsert(&self, id: &str, context: Option<&str>) -> ConversationRecord {
        let now = Utc::now();
        let mut record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(conversation_id = %id, "created conversation");
                ConversationRecord {
                    id: id.to_string(),
                    history: Vec::new(),
                    created_at: now,
                    last_activity: now,
                    context: context.map(str::to_string),
                }
            });
        record.last_activity = now;
        record.value().clone()
    }

    /// Pushes one user/model exchange, dropping the oldest entries past the cap.
    ///
    /// Returns the new history length, or `None` if no record exists for `id`.
    pub fn append(&self, id: &str, user_text: &str, model_text: &str) -> Option<usize> {
        let mut record = self.records.get_mut(id)?;
        record.history.push(Turn::user(user_text));
        record.history.push(Turn::model(model_text));

        if record.history.len() > self.max_history {
            let excess = record.history.len() - self.max_history;
            record.history.drain(..excess);
        }
        record.last_activity = Utc::now();
        Some(record.history.len())
    }

    /// Removes every record idle for longer than the timeout. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.records.retain(|id, record| {
            let expired = now
                .signed_duration_since(record.last_activity)
                .to_std()
                .map(|idle| idle > self.timeout)
                .unwrap_or(false);
            if expired {
                tracing::debug!(conversation_id = %id, "evicting idle conversation");
                removed += 1;
            }
            !expired
        });

        // Gates nobody is holding and whose record is gone can go too.
        self.gates
            .retain(|id, gate| self.records.contains_key(id) || Arc::strong_count(gate) > 1);

        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn get_on_unknown_id_is_none() {
        let store = ConversationStore::default();
        assert!(store.get("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn upsert_creates_once_and_keeps_context() {
        let store = ConversationStore::default();
        let first = store.upsert("c1", Some("legal_assistant"));
        let second = store.upsert("c1", None);

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.context.as_deref(), Some("legal_assistant"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_requires_an_existing_record() {
        let store = ConversationStore::default();
        assert_eq!(store.append("c1", "hi", "hello"), None);
        assert!(!store.contains("c1"));
    }

    #[test]
    fn append_keeps_turn_order() {
        let store = ConversationStore::default();
        store.upsert("c1", None);
        store.append("c1", "q1", "a1");
        store.append("c1", "q2", "a2");

        let history = store.get("c1").unwrap().history;
        let texts: Vec<_> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["q1", "a1", "q2", "a2"]);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Model);
    }

    #[test]
    fn history_is_capped_by_dropping_the_oldest_pair() {
        let store = ConversationStore::default();
        store.upsert("c1", None);
        for i in 0..21 {
            store.append("c1", &format!("q{i}"), &format!("a{i}"));
        }

        let history = store.get("c1").unwrap().history;
        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(history[0], Turn::user("q1"));
        assert_eq!(history[MAX_HISTORY_ENTRIES - 1], Turn::model("a20"));
    }

    #[test]
    fn sweep_evicts_idle_records() {
        let store = ConversationStore::default();
        store.upsert("old", None);

        let now = Utc::now();
        assert_eq!(store.sweep(now), 0);
        assert!(store.contains("old"));

        let later = now + chrono::Duration::minutes(31);
        assert_eq!(store.sweep(later), 1);
        assert!(!store.contains("old"));
    }

    #[tokio::test]
    async fn lock_serializes_the_same_conversation() {
        let store = Arc::new(ConversationStore::default());
        let guard = store.lock("c1").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let _guard = store.lock("c1").await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        // A different conversation is not blocked.
        let _other = store.lock("c2").await;

        drop(guard);
        contender.await.unwrap();
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = ConversationStore::new(CONVERSATION_TIMEOUT, 1_000);
        store.upsert("shared", None);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..25 {
                        store.append("shared", &format!("q{worker}-{i}"), "a");
                    }
                });
            }
        });

        assert_eq!(store.get("shared").unwrap().history.len(), 8 * 25 * 2);
    }

    #[tokio::test]
    async fn sweep_keeps_gates_that_are_held() {
        let store = ConversationStore::new(Duration::from_millis(0), MAX_HISTORY_ENTRIES);
        store.upsert("busy", None);
        let guard = store.lock("busy").await;

        let later = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.sweep(later), 1);
        assert!(!store.contains("busy"));
        assert_eq!(store.gates.len(), 1);

        drop(guard);
        store.sweep(later);
        assert!(store.gates.is_empty());
    }
}
