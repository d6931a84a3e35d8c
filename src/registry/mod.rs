use crate::error::RegistryError;
use crate::event::{EventKind, EventSink, Notification};
use crate::model::Streamer;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;


/// Id set and id map, always mutated together under one lock
#[derive(Default)]
struct Tracked {
    uids: HashSet<i64>,
    by_uid: HashMap<i64, Streamer>,
}

/// Live set of tracked streamers.
///
/// `add`, `remove` and `update` are the only mutators. Each runs under a
/// single write lock, so readers never see the id set and the id map
/// disagree. The notification for a mutation is sent before the lock is
/// released, which keeps delivery order equal to application order.
pub struct Registry {
    tracked: RwLock<Tracked>,
    sink: Arc<dyn EventSink>,
}

impl Registry {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            tracked: RwLock::new(Tracked::default()),
            sink,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tracked> {
        self.tracked.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tracked> {
        self.tracked.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking a streamer. Fails if its uid is already tracked.
    pub fn add(&self, streamer: Streamer) -> Result<(), RegistryError> {
        let mut tracked = self.write();
        if tracked.uids.contains(&streamer.uid) {
            return Err(RegistryError::DuplicateEntity(streamer.uid));
        }

        tracked.uids.insert(streamer.uid);
        tracked.by_uid.insert(streamer.uid, streamer.clone());

        debug!(uid = streamer.uid, "Streamer added");
        self.sink.notify(Notification::new(streamer, EventKind::Added));
        Ok(())
    }

    /// Stop tracking a streamer, returning its last known value
    pub fn remove(&self, uid: i64) -> Result<Streamer, RegistryError> {
        let mut tracked = self.write();
        let streamer = tracked
            .by_uid
            .remove(&uid)
            .ok_or(RegistryError::NotFound(uid))?;
        tracked.uids.remove(&uid);

        debug!(uid, "Streamer removed");
        self.sink
            .notify(Notification::new(streamer.clone(), EventKind::Removed));
        Ok(streamer)
    }

    /// Replace the tracked value for `streamer.uid`, returning the old value
    pub fn update(&self, streamer: Streamer) -> Result<Streamer, RegistryError> {
        let mut tracked = self.write();
        let old = tracked
            .by_uid
            .remove(&streamer.uid)
            .ok_or(RegistryError::NotFound(streamer.uid))?;
        tracked.by_uid.insert(streamer.uid, streamer.clone());

        debug!(uid = streamer.uid, "Streamer updated");
        self.sink.notify(Notification::new(streamer, EventKind::Updated));
        Ok(old)
    }

    pub fn get(&self, uid: i64) -> Result<Streamer, RegistryError> {
        self.read()
            .by_uid
            .get(&uid)
            .cloned()
            .ok_or(RegistryError::NotFound(uid))
    }

    pub fn contains(&self, uid: i64) -> bool {
        self.read().uids.contains(&uid)
    }

    pub fn len(&self) -> usize {
        self.read().uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().uids.is_empty()
    }

    /// Snapshot of the tracked uids
    pub fn uids(&self) -> HashSet<i64> {
        self.read().uids.clone()
    }

    /// Snapshot of the tracked streamers, keyed by uid
    pub fn snapshot(&self) -> HashMap<i64, Streamer> {
        self.read().by_uid.clone()
    }

    /// Snapshot of the tracked streamers, ascending by uid
    pub fn streamers(&self) -> Vec<Streamer> {
        let mut all: Vec<Streamer> = self.read().by_uid.values().cloned().collect();
        all.sort_by_key(|s| s.uid);
        all
    }

    /// Id set and id map agree, checked under one read lock
    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let tracked = self.read();
        tracked.uids.len() == tracked.by_uid.len()
            && tracked.uids.iter().all(|uid| tracked.by_uid.contains_key(uid))
    }
}
