use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::thread;
use std::time::{Duration, Instant};

use sonority_core::{MusicId, SoundId};
use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, AudioSample};
use crate::cache::SourceCache;
use crate::catalog::SoundCatalog;
use crate::config::AudioConfig;
use crate::dispatch::{self, Channel, DispatchTarget, Policy, PoolKind, Route, WorldPositions};
use crate::error::AudioError;
use crate::loader::SoundLoader;
use crate::music::{MusicPlayer, MusicState};
use crate::pool::SamplePool;
use crate::spatial::Listener;
use crate::volume;

/// Interval between polls while draining.
const DRAIN_POLL: Duration = Duration::from_millis(1);

/// Result of a sound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The request was handed to a pool or the walking slot.
    Played,
    /// Sound is disabled, muted, or the id is the invalid sentinel.
    Skipped,
    /// The sound is unknown or could not be loaded or decoded.
    Failed,
}

/// The audio subsystem. Owns the backend, the catalog and archive, the
/// sample pools and the music track, and routes every sound request.
pub struct AudioPlayer<B: AudioBackend, R = BufReader<File>> {
    backend: B,
    config: AudioConfig,
    catalog: SoundCatalog,
    loader: SoundLoader<R>,
    sources: SourceCache<B::Source>,
    regular: SamplePool<B::Sample>,
    looping: SamplePool<B::Sample>,
    voice: SamplePool<B::Sample>,
    walking: Option<B::Sample>,
    music: MusicPlayer<B::Track>,
    master_volume: f32,
    voice_volume: f32,
}

impl<B: AudioBackend> AudioPlayer<B> {
    /// Open the sound archive under the configured data directory and
    /// create a ready player.
    pub fn new(backend: B, config: AudioConfig, catalog: SoundCatalog) -> Result<Self, AudioError> {
        let loader = SoundLoader::open(config.archive_path())?;
        Ok(Self::with_loader(backend, config, catalog, loader))
    }
}

impl<B: AudioBackend, R: Read + Seek> AudioPlayer<B, R> {
    /// Create a player around an already-open archive.
    pub fn with_loader(
        backend: B,
        config: AudioConfig,
        catalog: SoundCatalog,
        loader: SoundLoader<R>,
    ) -> Self {
        let config = config.clamped();
        let music = MusicPlayer::new(
            config.music_dir(),
            volume::level_to_gain(config.music_level),
        );

        info!(
            "Audio player initialized: {} catalog sounds, {} archive records",
            catalog.len(),
            loader.index().len()
        );

        Self {
            backend,
            master_volume: volume::level_to_gain(config.sound_level),
            voice_volume: volume::level_to_gain(config.voice_level),
            config,
            catalog,
            loader,
            sources: SourceCache::new(),
            regular: SamplePool::new(false),
            looping: SamplePool::new(true),
            voice: SamplePool::new(false),
            walking: None,
            music,
        }
    }

    // ---- Sound Effects ----

    /// Play a catalog sound for `target`. Object targets look up their
    /// position in `world`.
    pub fn play_sound(
        &mut self,
        sound_id: SoundId,
        target: DispatchTarget,
        world: &dyn WorldPositions,
    ) -> PlayOutcome {
        if !self.config.effects_audible() || !sound_id.is_valid() {
            return PlayOutcome::Skipped;
        }

        let Some(entry) = self.catalog.get(sound_id) else {
            warn!("Sound id {} not found in catalog", sound_id);
            return PlayOutcome::Failed;
        };

        let loader = &mut self.loader;
        let backend = &mut self.backend;
        let source = self.sources.get_or_try_insert_with(sound_id, || {
            let data = loader.load_entry(entry)?;
            backend.create_source(data)
        });
        let source = match source {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to load sound {} ('{}'): {}", sound_id, entry.name, e);
                return PlayOutcome::Failed;
            }
        };

        let mut sample = self.backend.create_sample(&source);
        sample.set_volume(self.master_volume);

        let played = match dispatch::route(target, world) {
            Route::Walking => {
                if let Some(mut previous) = self.walking.take() {
                    previous.stop();
                }
                sample.play(false, false);
                self.walking = Some(sample);
                true
            }
            Route::Pool {
                pool,
                policy,
                channel,
                placement,
            } => {
                sample.set_volume(self.channel_volume(channel));
                if let Some(placement) = placement {
                    sample.set_position(placement.position, placement.max_distance);
                }
                let positional = placement.is_some();
                let pool = self.pool_mut(pool);
                match policy {
                    Policy::New => pool.play_new(sample, positional),
                    Policy::UniqueSound { restart } => {
                        if restart {
                            pool.stop_sound_id(sound_id);
                        }
                        pool.play_unique_sound_id(sample, sound_id, positional)
                    }
                    Policy::UniqueObject(object) => pool.play_unique_object(sample, object, positional),
                }
            }
        };

        let name = self.catalog.get(sound_id).map_or("", |e| e.name.as_str());
        match (played, name.is_empty()) {
            (true, true) => debug!("Playing sound {}", sound_id),
            (true, false) => debug!("Playing sound {} ('{}')", sound_id, name),
            (false, true) => warn!("Failed to play sound {}", sound_id),
            (false, false) => warn!("Failed to play sound {} ('{}')", sound_id, name),
        }

        if played {
            PlayOutcome::Played
        } else {
            PlayOutcome::Failed
        }
    }

    /// Play the cast or impact sound of a spell. Impact sounds directly
    /// follow their cast sound in the catalog.
    pub fn play_spell_sound(
        &mut self,
        cast_sound: SoundId,
        impact: bool,
        target: DispatchTarget,
        world: &dyn WorldPositions,
    ) -> PlayOutcome {
        if !cast_sound.is_valid() {
            return PlayOutcome::Skipped;
        }
        self.play_sound(cast_sound.offset(u32::from(impact)), target, world)
    }

    fn channel_volume(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Master => self.master_volume,
            Channel::Voice => self.voice_volume,
            Channel::Music => self.music.volume(),
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut SamplePool<B::Sample> {
        match kind {
            PoolKind::Regular => &mut self.regular,
            PoolKind::Looping => &mut self.looping,
            PoolKind::Voice => &mut self.voice,
        }
    }

    /// The pool of the given category.
    pub fn pool(&self, kind: PoolKind) -> &SamplePool<B::Sample> {
        match kind {
            PoolKind::Regular => &self.regular,
            PoolKind::Looping => &self.looping,
            PoolKind::Voice => &self.voice,
        }
    }

    pub fn has_walking_sample(&self) -> bool {
        self.walking.is_some()
    }

    // ---- Volume ----

    /// Set the effects level (0–9). Applies to regular and looping sounds
    /// and the walking sample immediately.
    pub fn set_master_volume(&mut self, level: i32) {
        self.config.sound_level = volume::clamp_level(level);
        self.master_volume = volume::level_to_gain(level);

        self.regular.set_volume(self.master_volume);
        self.looping.set_volume(self.master_volume);
        if let Some(walking) = self.walking.as_mut() {
            walking.set_volume(self.master_volume);
        }
    }

    /// Set the voice level (0–9).
    pub fn set_voice_volume(&mut self, level: i32) {
        self.config.voice_level = volume::clamp_level(level);
        self.voice_volume = volume::level_to_gain(level);
        self.voice.set_volume(self.voice_volume);
    }

    /// Set the music level (0–9). Level 0 pauses the track, any other
    /// level resumes it.
    pub fn set_music_volume(&mut self, level: i32) {
        self.config.music_level = volume::clamp_level(level);
        self.music
            .set_volume(&mut self.backend, volume::level_to_gain(level));
    }

    // ---- Transport ----

    /// Stop every sound effect, voice line and the walking sound.
    pub fn stop_sounds(&mut self) {
        self.voice.stop();
        self.regular.stop();
        self.looping.stop();
        self.stop_walking_sounds();
    }

    pub fn stop_voice_sounds(&mut self) {
        self.voice.stop();
    }

    pub fn stop_walking_sounds(&mut self) {
        if let Some(mut walking) = self.walking.take() {
            walking.stop();
        }
    }

    pub fn pause_all_sounds(&mut self) {
        self.voice.pause();
        self.regular.pause();
        self.looping.pause();
        if let Some(walking) = self.walking.as_mut() {
            walking.pause();
        }
    }

    pub fn pause_looping(&mut self) {
        self.looping.pause();
    }

    pub fn resume_sounds(&mut self) {
        self.voice.resume();
        self.regular.resume();
        self.looping.resume();
        if let Some(walking) = self.walking.as_mut() {
            walking.resume();
        }
    }

    /// Per-frame update: move the listener and drop finished sounds.
    pub fn update_sounds(&mut self, listener: &Listener) {
        self.backend.set_listener(listener);
        self.prune();
    }

    fn prune(&mut self) {
        self.voice.update();
        self.regular.update();
        self.looping.update();
        if self.walking.as_ref().is_some_and(|w| w.is_stopped()) {
            self.walking = None;
        }
    }

    /// Block until voice lines and then regular sounds have finished.
    /// Looping sounds are not waited for. Gives up once `timeout` has
    /// elapsed.
    pub fn drain(&mut self, timeout: Duration) -> Result<(), AudioError> {
        let deadline = Instant::now() + timeout;
        for kind in [PoolKind::Voice, PoolKind::Regular] {
            while self.pool_mut(kind).has_playing() {
                if Instant::now() >= deadline {
                    warn!("Sounds still playing after {:?}, giving up drain", timeout);
                    return Err(AudioError::DrainTimeout(timeout));
                }
                thread::sleep(DRAIN_POLL);
                self.pool_mut(kind).update();
            }
        }
        Ok(())
    }

    // ---- Music ----

    /// Switch the music to `track`. Does nothing when sound is disabled or
    /// the track is already current.
    pub fn music_play_track(&mut self, track: MusicId) -> Result<(), AudioError> {
        if self.config.no_sound {
            return Ok(());
        }
        self.music.play(&mut self.backend, track)
    }

    pub fn music_stop(&mut self) {
        self.music.stop();
    }

    pub fn music_pause(&mut self) {
        self.music.pause();
    }

    pub fn music_resume(&mut self) {
        self.music.resume(&mut self.backend);
    }

    pub fn music_state(&self) -> MusicState {
        self.music.state()
    }

    pub fn current_music_track(&self) -> Option<MusicId> {
        self.music.current_track()
    }

    // ---- Accessors ----

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn loader(&self) -> &SoundLoader<R> {
        &self.loader
    }

    pub fn sources(&self) -> &SourceCache<B::Source> {
        &self.sources
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
