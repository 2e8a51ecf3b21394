use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sonority_core::SoundId;

/// Decode-once cache of backend sources, keyed by catalog id.
///
/// Each id owns a slot with its own lock, and the slot stays locked while
/// the source is produced. Two callers asking for the same id therefore
/// never decode it twice, while different ids decode independently.
/// Entries are never evicted.
pub struct SourceCache<S> {
    slots: Mutex<HashMap<SoundId, Arc<Mutex<Option<S>>>>>,
}

impl<S: Clone> SourceCache<S> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached source for `id`, producing it with `init` on the
    /// first call. A failed `init` leaves the slot empty so a later call
    /// can retry.
    pub fn get_or_try_insert_with<E>(
        &self,
        id: SoundId,
        init: impl FnOnce() -> Result<S, E>,
    ) -> Result<S, E> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(id).or_default())
        };

        let mut slot = slot.lock();
        if let Some(source) = slot.as_ref() {
            return Ok(source.clone());
        }
        let source = init()?;
        *slot = Some(source.clone());
        Ok(source)
    }

    /// The cached source for `id`, if it has been produced.
    pub fn get(&self, id: SoundId) -> Option<S> {
        let slot = self.slots.lock().get(&id).cloned()?;
        let slot = slot.lock();
        slot.clone()
    }

    pub fn contains(&self, id: SoundId) -> bool {
        self.get(id).is_some()
    }

    /// Number of ids with a produced source.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone> Default for SourceCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn init_runs_once() {
        let cache = SourceCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let value: Result<_, ()> = cache.get_or_try_insert_with(SoundId(1), || {
                calls += 1;
                Ok("decoded")
            });
            assert_eq!(value, Ok("decoded"));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failure_is_not_cached() {
        let cache: SourceCache<u32> = SourceCache::new();

        let failed: Result<u32, &str> = cache.get_or_try_insert_with(SoundId(9), || Err("bad data"));
        assert!(failed.is_err());
        assert!(!cache.contains(SoundId(9)));

        let retried: Result<u32, &str> = cache.get_or_try_insert_with(SoundId(9), || Ok(5));
        assert_eq!(retried, Ok(5));
        assert_eq!(cache.get(SoundId(9)), Some(5));
    }

    #[test]
    fn concurrent_callers_decode_once() {
        let cache = Arc::new(SourceCache::new());
        let decodes = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let decodes = Arc::clone(&decodes);
                thread::spawn(move || {
                    let value: Result<u32, ()> = cache.get_or_try_insert_with(SoundId(3), || {
                        decodes.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        Ok(77)
                    });
                    value.unwrap()
                })
            })
            .collect();

        for worker in workers {
            assert_eq!(worker.join().unwrap(), 77);
        }
        assert_eq!(decodes.load(Ordering::SeqCst), 1);
    }
}
