use sonority_core::{ObjectRef, SoundId};

use crate::backend::AudioSample;

/// What a pool entry is matched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKey {
    /// Inserted by `play_new`; never matched.
    Anonymous,
    /// At most one entry per sound id.
    Sound(SoundId),
    /// At most one entry per originating object.
    Object(ObjectRef),
}

struct PoolEntry<S> {
    sample: S,
    key: PoolKey,
}

/// Active samples of one category.
///
/// The pool has no fixed capacity. Samples that report stopped are pruned
/// at the start of every `play_*`, `pause`, `resume`, `set_volume` and
/// `has_playing` call, and by `update`.
pub struct SamplePool<S> {
    entries: Vec<PoolEntry<S>>,
    looping: bool,
}

impl<S: AudioSample> SamplePool<S> {
    /// Create a pool. Every sample a looping pool starts plays in a loop.
    pub fn new(looping: bool) -> Self {
        Self {
            entries: Vec::new(),
            looping,
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Start `sample` unconditionally.
    pub fn play_new(&mut self, sample: S, positional: bool) -> bool {
        self.update();
        self.start(sample, PoolKey::Anonymous, positional);
        true
    }

    /// Start `sample` unless an entry for `id` is still active, in which
    /// case the new sample is dropped unplayed.
    pub fn play_unique_sound_id(&mut self, sample: S, id: SoundId, positional: bool) -> bool {
        self.play_unique(sample, PoolKey::Sound(id), positional)
    }

    /// Start `sample` unless an entry for `object` is still active, in
    /// which case the new sample is dropped unplayed.
    pub fn play_unique_object(&mut self, sample: S, object: ObjectRef, positional: bool) -> bool {
        self.play_unique(sample, PoolKey::Object(object), positional)
    }

    fn play_unique(&mut self, sample: S, key: PoolKey, positional: bool) -> bool {
        self.update();
        if self.entries.iter().any(|entry| entry.key == key) {
            return true;
        }
        self.start(sample, key, positional);
        true
    }

    fn start(&mut self, mut sample: S, key: PoolKey, positional: bool) {
        sample.play(self.looping, positional);
        self.entries.push(PoolEntry { sample, key });
    }

    /// Stop and remove every entry for `id`. Returns how many were removed.
    pub fn stop_sound_id(&mut self, id: SoundId) -> usize {
        debug_assert!(id.is_valid(), "stop_sound_id called with the invalid sound id");
        self.stop_matching(PoolKey::Sound(id))
    }

    /// Stop and remove every entry for `object`. Returns how many were removed.
    pub fn stop_object(&mut self, object: ObjectRef) -> usize {
        self.stop_matching(PoolKey::Object(object))
    }

    fn stop_matching(&mut self, key: PoolKey) -> usize {
        let before = self.entries.len();
        self.entries.retain_mut(|entry| {
            if entry.key == key {
                entry.sample.stop();
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    pub fn pause(&mut self) {
        self.update();
        for entry in &mut self.entries {
            entry.sample.pause();
        }
    }

    pub fn resume(&mut self) {
        self.update();
        for entry in &mut self.entries {
            entry.sample.resume();
        }
    }

    /// Stop every sample and empty the pool.
    pub fn stop(&mut self) {
        for mut entry in self.entries.drain(..) {
            entry.sample.stop();
        }
    }

    /// Apply `gain` to every current sample.
    pub fn set_volume(&mut self, gain: f32) {
        self.update();
        for entry in &mut self.entries {
            entry.sample.set_volume(gain);
        }
    }

    /// Whether any sample is still playing.
    pub fn has_playing(&mut self) -> bool {
        self.update();
        self.entries.iter().any(|entry| !entry.sample.is_stopped())
    }

    /// Drop entries whose sample has stopped.
    pub fn update(&mut self) {
        self.entries.retain(|entry| !entry.sample.is_stopped());
    }

    /// Number of entries, including any that stopped since the last prune.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys of the current entries, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = PoolKey> + '_ {
        self.entries.iter().map(|entry| entry.key)
    }
}
