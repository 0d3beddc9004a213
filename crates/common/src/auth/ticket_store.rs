//! Ticket persistence with expiry awareness
//!
//! The store always keeps the current ticket in an in-memory slot and writes
//! it through to the configured [`KeyValueCache`]. Without a real cache
//! ([`NoOpCache`]) the slot is all there is, scoped to the owning login
//! manager.
//!
//! Reads never fail. A cache read error, an undecodable cached value, or an
//! expired ticket all read as "absent", which makes the caller log in again
//! instead of blocking on a broken cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::types::Ticket;
use crate::cache::{KeyValueCache, NoOpCache};

/// Prefix for cache keys written by the store
pub const TICKET_CACHE_KEY_PREFIX: &str = "ticketauth.ticket";

/// Cache key for the ticket belonging to `username`.
pub fn ticket_cache_key(username: &str) -> String {
    format!("{TICKET_CACHE_KEY_PREFIX}.{username}")
}

/// Holds the current ticket
pub struct TicketStore {
    slot: RwLock<Option<Arc<Ticket>>>,
    cache: Arc<dyn KeyValueCache>,
    cache_key: String,
}

impl TicketStore {
    pub fn new(cache: Arc<dyn KeyValueCache>, cache_key: impl Into<String>) -> Self {
        Self { slot: RwLock::new(None), cache, cache_key: cache_key.into() }
    }

    /// Store backed only by its in-memory slot.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(NoOpCache), TICKET_CACHE_KEY_PREFIX)
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Get the current ticket, if one exists and has not expired.
    pub async fn get(&self) -> Option<Arc<Ticket>> {
        let held = self.slot.read().clone();
        if let Some(ticket) = held {
            if !ticket.is_expired() {
                return Some(ticket);
            }
            debug!(issued_at = %ticket.issued_at, "held ticket expired");
        }

        let raw = match self.cache.get(&self.cache_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.cache_key, error = %err, "ticket cache read failed");
                return None;
            }
        };

        let ticket = match serde_json::from_str::<Ticket>(&raw) {
            Ok(ticket) => ticket,
            Err(err) => {
                warn!(key = %self.cache_key, error = %err, "cached ticket could not be decoded");
                return None;
            }
        };

        if ticket.is_expired() {
            debug!(key = %self.cache_key, "cached ticket expired");
            return None;
        }

        let ticket = Arc::new(ticket);
        *self.slot.write() = Some(Arc::clone(&ticket));
        debug!(key = %self.cache_key, "ticket loaded from cache");
        Some(ticket)
    }

    /// Ticket currently held in memory, without expiry checks or cache reads.
    pub fn current(&self) -> Option<Arc<Ticket>> {
        self.slot.read().clone()
    }

    /// Replace the current ticket and write it through to the cache.
    ///
    /// The in-memory swap happens first, so a failing cache never loses a
    /// freshly issued ticket.
    pub async fn put(&self, ticket: Ticket) -> Arc<Ticket> {
        let ticket = Arc::new(ticket);
        *self.slot.write() = Some(Arc::clone(&ticket));

        match serde_json::to_string(ticket.as_ref()) {
            Ok(raw) => {
                if let Err(err) =
                    self.cache.put(&self.cache_key, raw, ticket.remaining_lifetime()).await
                {
                    warn!(key = %self.cache_key, error = %err, "ticket cache write failed");
                }
            }
            Err(err) => {
                warn!(key = %self.cache_key, error = %err, "ticket could not be encoded for cache");
            }
        }

        ticket
    }
}

impl std::fmt::Debug for TicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketStore")
            .field("cache_key", &self.cache_key)
            .field("holds_ticket", &self.slot.read().is_some())
            .finish()
    }
}
