//! Per-user dialogue state
//!
//! Each user owns one slot behind an async mutex, so at most one message of a
//! user is being handled at a time. Slots expire after a period of inactivity
//! and the number of tracked users is bounded.

use crate::error::{BotError, Result};
use folio_core::{PurchaseConversation, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default inactivity period after which a dialogue is dropped
pub const DEFAULT_CONVERSATION_TTL: Duration = Duration::from_secs(30 * 60);

/// Default bound on tracked users
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10_000;

/// What the bot is waiting for from a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialogue {
    /// Purchase flow in progress
    Purchase(PurchaseConversation),
    /// `/checkStock` without argument; the next message is the ticker
    Lookup,
}

#[derive(Debug)]
struct Slot {
    dialogue: Option<Dialogue>,
    last_active: Instant,
}

impl Slot {
    fn new() -> Self {
        Self {
            dialogue: None,
            last_active: Instant::now(),
        }
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.dialogue.is_none() || self.last_active.elapsed() > ttl
    }
}

/// Exclusive access to one user's slot, released on drop
#[derive(Debug)]
pub struct UserSlot {
    user: UserId,
    guard: OwnedMutexGuard<Slot>,
}

impl UserSlot {
    /// User owning this slot
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Active dialogue, if any
    pub fn dialogue(&self) -> Option<&Dialogue> {
        self.guard.dialogue.as_ref()
    }

    /// Whether a dialogue is in progress
    pub fn is_active(&self) -> bool {
        self.guard.dialogue.is_some()
    }

    /// Remove the dialogue; put it back with [`UserSlot::set`] to keep it
    pub fn take(&mut self) -> Option<Dialogue> {
        self.guard.dialogue.take()
    }

    /// Replace the dialogue
    pub fn set(&mut self, dialogue: Dialogue) {
        self.guard.dialogue = Some(dialogue);
    }
}

/// Keyed store of dialogues, one writer per user
#[derive(Debug)]
pub struct ConversationStore {
    slots: Mutex<HashMap<UserId, Arc<AsyncMutex<Slot>>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSATION_TTL, DEFAULT_MAX_CONVERSATIONS)
    }
}

impl ConversationStore {
    /// Create a store dropping dialogues idle for `ttl` and tracking at most `capacity` users
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Idle period after which a dialogue is dropped
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of users currently tracked
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or_default()
    }

    /// Whether no user is tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for exclusive access to `user`'s slot. An expired dialogue is
    /// dropped before the slot is handed out.
    pub async fn lock(&self, user: UserId) -> Result<UserSlot> {
        let slot = self.slot(user)?;
        let mut guard = slot.lock_owned().await;

        if guard.dialogue.is_some() && guard.last_active.elapsed() > self.ttl {
            info!(%user, "dialogue expired");
            guard.dialogue = None;
        }
        guard.last_active = Instant::now();

        Ok(UserSlot { user, guard })
    }

    fn slot(&self, user: UserId) -> Result<Arc<AsyncMutex<Slot>>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| BotError::Other(format!("conversation store lock poisoned: {e}")))?;

        if let Some(slot) = slots.get(&user) {
            return Ok(Arc::clone(slot));
        }

        if slots.len() >= self.capacity {
            let pruned = prune_slots(&mut slots, self.ttl);
            if pruned == 0 && !evict_oldest(&mut slots) {
                warn!(
                    capacity = self.capacity,
                    "every tracked conversation is busy, exceeding capacity"
                );
            }
        }

        let slot = Arc::new(AsyncMutex::new(Slot::new()));
        slots.insert(user, Arc::clone(&slot));
        Ok(slot)
    }

    /// Drop slots that are not in use and hold no live dialogue
    pub fn prune(&self) -> usize {
        let Ok(mut slots) = self.slots.lock() else {
            return 0;
        };
        let pruned = prune_slots(&mut slots, self.ttl);
        if pruned > 0 {
            debug!(pruned, remaining = slots.len(), "conversation store pruned");
        }
        pruned
    }

    /// Prune every `period` until the returned task is aborted
    pub fn spawn_janitor(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                store.prune();
            }
        })
    }
}

/// A slot only the map refers to is neither locked nor awaited
fn is_unused(slot: &Arc<AsyncMutex<Slot>>) -> bool {
    Arc::strong_count(slot) == 1
}

fn prune_slots(slots: &mut HashMap<UserId, Arc<AsyncMutex<Slot>>>, ttl: Duration) -> usize {
    let before = slots.len();
    slots.retain(|_, slot| {
        if !is_unused(slot) {
            return true;
        }
        !slot.try_lock().is_ok_and(|slot| slot.is_idle(ttl))
    });
    before - slots.len()
}

fn evict_oldest(slots: &mut HashMap<UserId, Arc<AsyncMutex<Slot>>>) -> bool {
    let oldest = slots
        .iter()
        .filter(|(_, slot)| is_unused(slot))
        .filter_map(|(user, slot)| slot.try_lock().ok().map(|s| (*user, s.last_active)))
        .min_by_key(|(_, last_active)| *last_active)
        .map(|(user, _)| user);

    match oldest {
        Some(user) => {
            warn!(%user, "conversation store full, evicting least recently active dialogue");
            slots.remove(&user);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dialogue_survives_between_locks() {
        let store = ConversationStore::default();
        {
            let mut slot = store.lock(UserId(1)).await.unwrap();
            assert!(!slot.is_active());
            slot.set(Dialogue::Lookup);
        }

        let mut slot = store.lock(UserId(1)).await.unwrap();
        assert_eq!(slot.dialogue(), Some(&Dialogue::Lookup));
        assert_eq!(slot.take(), Some(Dialogue::Lookup));
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let store = ConversationStore::default();
        let mut first = store.lock(UserId(1)).await.unwrap();
        first.set(Dialogue::Purchase(PurchaseConversation::start(UserId(1))));

        // A second user is not blocked by the first user's held slot
        let second = store.lock(UserId(2)).await.unwrap();
        assert!(!second.is_active());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_dialogue_is_dropped() {
        let store = ConversationStore::new(Duration::from_millis(10), 10);
        store.lock(UserId(1)).await.unwrap().set(Dialogue::Lookup);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let slot = store.lock(UserId(1)).await.unwrap();
        assert!(!slot.is_active());
    }

    #[tokio::test]
    async fn test_prune_keeps_live_and_busy_slots() {
        let store = ConversationStore::default();
        store.lock(UserId(1)).await.unwrap().set(Dialogue::Lookup);
        drop(store.lock(UserId(2)).await.unwrap());
        let _busy = store.lock(UserId(3)).await.unwrap();

        assert_eq!(store.prune(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_active() {
        let store = ConversationStore::new(Duration::from_secs(60), 2);
        store.lock(UserId(1)).await.unwrap().set(Dialogue::Lookup);
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.lock(UserId(2)).await.unwrap().set(Dialogue::Lookup);

        store.lock(UserId(3)).await.unwrap().set(Dialogue::Lookup);
        assert_eq!(store.len(), 2);

        assert!(!store.lock(UserId(1)).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_janitor_prunes() {
        let store = Arc::new(ConversationStore::new(Duration::from_millis(5), 10));
        drop(store.lock(UserId(1)).await.unwrap());

        let janitor = store.spawn_janitor(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        janitor.abort();

        assert!(store.is_empty());
    }
}
