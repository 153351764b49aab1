//! Shared cache of prepared parameters.
//!
//! Lookups take a read lock. A miss is prepared under a per-name build slot,
//! so concurrent callers asking for the same missing parameter wait for one
//! build instead of each loading it. Slots live only while someone holds
//! them. Invalidation bumps the slot's epoch; a build that started before the
//! bump hands its result to its own caller but never publishes it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::index::PreparedParameter;

// Lock order: `state` before `slots`.
#[derive(Debug, Default)]
pub struct PreparedParamCache {
    state: RwLock<CacheState>,
    slots: Mutex<HashMap<String, Arc<BuildSlot>>>,
}

#[derive(Debug, Default)]
struct CacheState {
    prepared: HashMap<String, Arc<PreparedParameter>>,
    generation: u64,
}

#[derive(Debug, Default)]
struct BuildSlot {
    lock: Mutex<()>,
    epoch: AtomicU64,
}

/// Snapshot taken before a build: the global generation and the slot epoch.
type Stamp = (u64, u64);

impl BuildSlot {
    // Read and bumped only under the state lock.
    fn stamp(&self, state: &CacheState) -> Stamp {
        (state.generation, self.epoch.load(Ordering::Relaxed))
    }
}

impl PreparedParamCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<PreparedParameter>> {
        self.state.read().prepared.get(name).cloned()
    }

    /// Publish a prepared parameter, replacing any previous one.
    pub fn put(&self, name: &str, prepared: Arc<PreparedParameter>) {
        self.state.write().prepared.insert(name.to_owned(), prepared);
    }

    /// Drop a parameter so the next lookup prepares it again. Builds already
    /// running for `name` will not publish their result.
    ///
    /// Returns `true` if a prepared parameter was removed.
    pub fn invalidate(&self, name: &str) -> bool {
        let mut state = self.state.write();
        if let Some(slot) = self.slots.lock().get(name) {
            slot.epoch.fetch_add(1, Ordering::Relaxed);
        }
        let removed = state.prepared.remove(name).is_some();
        debug!(parameter = name, removed, "parameter invalidated");
        removed
    }

    /// Drop every parameter. Builds already running will not publish.
    pub fn invalidate_all(&self) {
        let mut state = self.state.write();
        state.generation += 1;
        let removed = state.prepared.len();
        state.prepared.clear();
        debug!(removed, "cache cleared");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().prepared.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the cached parameters, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().prepared.keys().cloned().collect();
        names.sort();
        names
    }

    /// Return the cached parameter or prepare it with `build`.
    ///
    /// At most one `build` per name runs at a time. A failed build publishes
    /// nothing and the next caller tries again.
    ///
    /// # Errors
    ///
    /// Returns whatever `build` returns.
    pub fn get_or_try_prepare<E>(
        &self,
        name: &str,
        build: impl FnOnce() -> Result<PreparedParameter, E>,
    ) -> Result<Arc<PreparedParameter>, E> {
        if let Some(hit) = self.get(name) {
            return Ok(hit);
        }

        let slot = self.acquire_slot(name);
        let result = {
            let _guard = slot.lock.lock();
            self.prepare_locked(name, &slot, build)
        };
        self.release_slot(name, slot);
        result
    }

    fn prepare_locked<E>(
        &self,
        name: &str,
        slot: &BuildSlot,
        build: impl FnOnce() -> Result<PreparedParameter, E>,
    ) -> Result<Arc<PreparedParameter>, E> {
        let stamp = {
            let state = self.state.read();
            if let Some(hit) = state.prepared.get(name) {
                debug!(parameter = name, "prepared by a concurrent caller");
                return Ok(Arc::clone(hit));
            }
            slot.stamp(&state)
        };

        debug!(parameter = name, "cache miss, preparing");
        let prepared = Arc::new(build()?);

        let mut state = self.state.write();
        if slot.stamp(&state) == stamp {
            state
                .prepared
                .insert(name.to_owned(), Arc::clone(&prepared));
            debug!(parameter = name, "prepared parameter published");
        } else {
            warn!(
                parameter = name,
                "parameter invalidated while preparing; result not cached"
            );
        }
        Ok(prepared)
    }

    fn acquire_slot(&self, name: &str) -> Arc<BuildSlot> {
        Arc::clone(self.slots.lock().entry(name.to_owned()).or_default())
    }

    /// Drop the caller's handle; the last holder removes the slot.
    fn release_slot(&self, name: &str, slot: Arc<BuildSlot>) {
        let mut slots = self.slots.lock();
        drop(slot);
        if slots.get(name).is_some_and(|held| Arc::strong_count(held) == 1) {
            slots.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::index::prepare;
    use crate::types::{Level, Parameter};
    use crate::{MatcherRegistry, ParamError, TypeRegistry};

    fn build(name: &str) -> Result<PreparedParameter, ParamError> {
        let parameter = Parameter::builder(name).level(Level::new("string")).build();
        prepare(
            &parameter,
            "test",
            &TypeRegistry::with_builtins(),
            &MatcherRegistry::with_builtins(),
        )
    }

    #[test]
    fn miss_then_hit() {
        let cache = PreparedParamCache::new();
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache
                .get_or_try_prepare("p", || {
                    calls.set(calls.get() + 1);
                    build("p")
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.names(), vec!["p"]);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = PreparedParamCache::new();
        let result = cache.get_or_try_prepare("p", || {
            Err::<PreparedParameter, _>(ParamError::UnknownParameter { name: "p".into() })
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_try_prepare("p", || build("p")).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let cache = PreparedParamCache::new();
        let first = cache.get_or_try_prepare("p", || build("p")).unwrap();
        assert!(cache.invalidate("p"));
        assert!(!cache.invalidate("p"));
        let second = cache.get_or_try_prepare("p", || build("p")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidation_during_build_discards_result() {
        let cache = PreparedParamCache::new();
        let prepared = cache
            .get_or_try_prepare("p", || {
                cache.invalidate("p");
                build("p")
            })
            .unwrap();
        assert_eq!(prepared.name(), "p");
        assert!(cache.get("p").is_none());
    }

    #[test]
    fn invalidate_all_during_build_discards_result() {
        let cache = PreparedParamCache::new();
        cache
            .get_or_try_prepare("p", || {
                cache.invalidate_all();
                build("p")
            })
            .unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidating_other_names_does_not_discard() {
        let cache = PreparedParamCache::new();
        cache
            .get_or_try_prepare("p", || {
                cache.invalidate("q");
                build("p")
            })
            .unwrap();
        assert!(cache.get("p").is_some());
    }

    #[test]
    fn failed_builds_leave_no_slots() {
        let cache = PreparedParamCache::new();
        for i in 0..50 {
            let name = format!("nope-{i}");
            let result = cache.get_or_try_prepare(&name, || {
                Err::<PreparedParameter, _>(ParamError::UnknownParameter { name: name.clone() })
            });
            assert!(result.is_err());
        }
        assert!(cache.is_empty());
        assert!(cache.slots.lock().is_empty());
    }

    #[test]
    fn successful_builds_release_their_slot() {
        let cache = PreparedParamCache::new();
        cache.get_or_try_prepare("p", || build("p")).unwrap();
        cache.get_or_try_prepare("p", || build("p")).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.slots.lock().is_empty());
    }

    #[test]
    fn invalidating_unknown_names_keeps_no_state() {
        let cache = PreparedParamCache::new();
        for i in 0..50 {
            assert!(!cache.invalidate(&format!("q-{i}")));
        }
        assert!(cache.slots.lock().is_empty());
        cache.get_or_try_prepare("q-0", || build("q-0")).unwrap();
        assert!(cache.get("q-0").is_some());
    }

    #[test]
    fn slot_outlives_build_while_shared() {
        let cache = PreparedParamCache::new();
        let held = cache.acquire_slot("p");
        cache.get_or_try_prepare("p", || build("p")).unwrap();
        assert_eq!(cache.slots.lock().len(), 1);
        cache.release_slot("p", held);
        assert!(cache.slots.lock().is_empty());
    }

    #[test]
    fn put_publishes_directly() {
        let cache = PreparedParamCache::new();
        cache.put("p", Arc::new(build("p").unwrap()));
        assert!(cache.get("p").is_some());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
