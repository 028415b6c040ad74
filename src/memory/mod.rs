//! Conversation memory: a bounded, ordered log of exchanges per session.
//!
//! Sessions are memory-resident only; a process restart loses all of them.
//! The retained window is `max_exchanges` (user, assistant) pairs with
//! strict FIFO eviction, mirroring a sliding conversation buffer.
//!
//! Locking is two-level: a short-lived `parking_lot` lock guards the
//! session map, and each session carries its own `tokio` mutex. Requests
//! for different sessions never contend; concurrent appends to the same
//! session are serialized so pairs cannot interleave. Session entries are
//! created lazily and never removed, which is acceptable for a demo-scale
//! slow-growing map.

use crate::types::Turn;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One completed (user, assistant) pair.
#[derive(Debug, Clone)]
struct Exchange {
    user: Turn,
    assistant: Turn,
}

type SessionLog = Arc<Mutex<VecDeque<Exchange>>>;

pub struct ConversationMemory {
    max_exchanges: usize,
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl ConversationMemory {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            max_exchanges,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the lock for a session, creating it on first use.
    fn session(&self, session_id: &str) -> SessionLog {
        if let Some(log) = self.sessions.read().get(session_id) {
            return Arc::clone(log);
        }
        let mut sessions = self.sessions.write();
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new()))),
        )
    }

    /// Append a completed exchange, evicting the oldest pair when the
    /// session exceeds its window.
    pub async fn append(&self, session_id: &str, user: Turn, assistant: Turn) {
        let log = self.session(session_id);
        let mut log = log.lock().await;
        log.push_back(Exchange { user, assistant });
        while log.len() > self.max_exchanges {
            log.pop_front();
        }
    }

    /// All retained turns for a session, oldest first. An unknown session
    /// yields an empty sequence, not an error, and creates no entry.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        let log = {
            let sessions = self.sessions.read();
            match sessions.get(session_id) {
                Some(log) => Arc::clone(log),
                None => return Vec::new(),
            }
        };
        let log = log.lock().await;
        log.iter()
            .flat_map(|exchange| [exchange.user.clone(), exchange.assistant.clone()])
            .collect()
    }

    /// Number of retained pairs for a session.
    pub async fn exchange_count(&self, session_id: &str) -> usize {
        self.history(session_id).await.len() / 2
    }

    /// Clear one session, or every session when `session_id` is `None`.
    pub async fn clear(&self, session_id: Option<&str>) {
        match session_id {
            Some(id) => {
                let log = {
                    let sessions = self.sessions.read();
                    sessions.get(id).map(Arc::clone)
                };
                if let Some(log) = log {
                    log.lock().await.clear();
                }
            }
            None => {
                let logs: Vec<SessionLog> =
                    self.sessions.read().values().map(Arc::clone).collect();
                for log in logs {
                    log.lock().await.clear();
                }
            }
        }
    }
}
