//! Hand-off point between whatever produces movement intents
//! (keyboard mapping, AI, replays) and the tick loop that consumes them.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::physics::{BodyKey, Intent, IntentSet};

/// Intents per body, written to from anywhere and taken out once per frame.
///
/// Held intents stay in place until changed with [`set`][Self::set] or [`release`][Self::release],
/// one-shot intents ([`Intent::is_one_shot`]) are cleared every time a snapshot is taken
/// so that a single press only acts once.
#[derive(Debug, Default)]
pub struct InputExchange {
    pending: Mutex<HashMap<BodyKey, IntentSet>>,
}

impl InputExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything a body is trying to do.
    pub fn set(&self, key: BodyKey, intents: IntentSet) {
        self.pending.lock().insert(key, intents);
    }

    pub fn press(&self, key: BodyKey, intent: Intent) {
        self.pending.lock().entry(key).or_default().insert(intent);
    }

    pub fn release(&self, key: BodyKey, intent: Intent) {
        if let Some(intents) = self.pending.lock().get_mut(&key) {
            intents.remove(intent);
        }
    }

    /// Stop tracking a body entirely, e.g. because it was despawned.
    pub fn forget(&self, key: BodyKey) {
        self.pending.lock().remove(&key);
    }

    pub fn clear(&self) {
        self.pending.lock().clear();
    }

    /// Get a consistent snapshot of every body's intents.
    ///
    /// The lock is held only for the duration of the copy.
    pub fn take(&self) -> HashMap<BodyKey, IntentSet> {
        let mut pending = self.pending.lock();
        let snapshot = pending.clone();
        pending.retain(|_, intents| {
            *intents = intents.held();
            !intents.is_empty()
        });
        snapshot
    }
}
