use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;

use crate::services::cart::Cart;
use crate::services::normalize::Normalizer;

struct Session {
    cart: Cart,
    last_activity: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub summary: String,
    pub cups: u32,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

/// Carts keyed by dialogue sender id. A session idle for longer than the TTL is dropped
/// the next time the store is touched.
pub struct SessionStore {
    normalizer: Arc<Normalizer>,
    ttl: Duration,
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new(normalizer: Arc<Normalizer>, ttl_minutes: i64) -> Self {
        Self {
            normalizer,
            ttl: Duration::minutes(ttl_minutes),
            sessions: HashMap::new(),
        }
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    /// Removes idle sessions, returning how many went.
    pub fn expire(&mut self, now: NaiveDateTime) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_activity + ttl > now);
        let expired = before - self.sessions.len();
        if expired > 0 {
            tracing::info!(expired, "expired idle sessions");
        }
        expired
    }

    /// The session's cart, created empty on first use. Touching it renews the session.
    pub fn cart_at(&mut self, session_id: &str, now: NaiveDateTime) -> &mut Cart {
        self.expire(now);
        let normalizer = &self.normalizer;
        let session = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session = %session_id, "new session");
                Session {
                    cart: Cart::new(Arc::clone(normalizer)),
                    last_activity: now,
                }
            });
        session.last_activity = now;
        &mut session.cart
    }

    pub fn cart(&mut self, session_id: &str) -> &mut Cart {
        self.cart_at(session_id, Self::now())
    }

    /// Empties one cart. Returns false for an unknown or expired session.
    pub fn clear(&mut self, session_id: &str) -> bool {
        self.expire(Self::now());
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.cart.clear();
                true
            }
            None => false,
        }
    }

    pub fn summaries_at(&mut self, now: NaiveDateTime) -> Vec<SessionSummary> {
        self.expire(now);
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|(id, session)| SessionSummary {
                session_id: id.clone(),
                summary: session.cart.summary(),
                cups: session.cart.total_cups(),
                last_activity: session.last_activity,
                expires_at: session.last_activity + self.ttl,
            })
            .collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    pub fn summaries(&mut self) -> Vec<SessionSummary> {
        self.summaries_at(Self::now())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
