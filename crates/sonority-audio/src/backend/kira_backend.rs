//! Audio output through kira.

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Weak};

use glam::Vec3;
use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackState;
use kira::tween::Tween;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::{AudioBackend, AudioSample, MusicTrack};
use crate::error::AudioError;
use crate::spatial::{self, Emitter, Listener};

type SharedManager = Arc<Mutex<AudioManager<DefaultBackend>>>;

/// kira takes panning in `[0, 1]` with 0.5 as center.
fn kira_panning(panning: f64) -> f64 {
    (panning + 1.0) / 2.0
}

struct Voice {
    manager: SharedManager,
    data: StaticSoundData,
    handle: Option<StaticSoundHandle>,
    gain: f32,
    emitter: Option<Emitter>,
    positional: bool,
    listener: Listener,
}

impl Voice {
    /// Gain and panning after spatial attenuation.
    fn mix(&self) -> (f64, f64) {
        match (self.positional, self.emitter) {
            (true, Some(emitter)) => {
                let params = spatial::compute_spatial(&self.listener, &emitter);
                (f64::from(self.gain) * params.volume, kira_panning(params.panning))
            }
            _ => (f64::from(self.gain), 0.5),
        }
    }

    fn apply_mix(&mut self) {
        let (volume, panning) = self.mix();
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(volume, Tween::default());
            handle.set_panning(panning, Tween::default());
        }
    }
}

/// A sample backed by a kira static sound.
pub struct KiraSample {
    voice: Arc<Mutex<Voice>>,
}

impl AudioSample for KiraSample {
    fn play(&mut self, looping: bool, positional: bool) {
        let mut voice = self.voice.lock();
        voice.positional = positional;
        let (volume, panning) = voice.mix();

        let mut settings = StaticSoundSettings::new().volume(volume).panning(panning);
        if looping {
            settings = settings.loop_region(..);
        }
        let data = voice.data.clone().with_settings(settings);

        let result = voice.manager.lock().play(data);
        match result {
            Ok(handle) => voice.handle = Some(handle),
            Err(e) => warn!("Failed to start sample: {}", e),
        }
    }

    fn pause(&mut self) {
        if let Some(handle) = self.voice.lock().handle.as_mut() {
            handle.pause(Tween::default());
        }
    }

    fn resume(&mut self) -> bool {
        match self.voice.lock().handle.as_mut() {
            Some(handle) if handle.state() != PlaybackState::Stopped => {
                handle.resume(Tween::default());
                true
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = self.voice.lock().handle.as_mut() {
            handle.stop(Tween::default());
        }
    }

    fn is_stopped(&self) -> bool {
        self.voice
            .lock()
            .handle
            .as_ref()
            .map_or(true, |h| h.state() == PlaybackState::Stopped)
    }

    fn set_volume(&mut self, gain: f32) {
        let mut voice = self.voice.lock();
        voice.gain = gain;
        voice.apply_mix();
    }

    fn set_position(&mut self, position: Vec3, max_distance: f32) {
        let mut voice = self.voice.lock();
        voice.emitter = Some(Emitter {
            position,
            max_distance,
        });
        voice.apply_mix();
    }
}

/// A music track decoded fully into memory, like the sound effects.
pub struct KiraTrack {
    manager: SharedManager,
    data: StaticSoundData,
    handle: Option<StaticSoundHandle>,
    gain: f32,
}

impl MusicTrack for KiraTrack {
    fn play(&mut self) {
        if let Some(mut old) = self.handle.take() {
            old.stop(Tween::default());
        }
        let settings = StaticSoundSettings::new().volume(f64::from(self.gain));
        let data = self.data.clone().with_settings(settings);
        match self.manager.lock().play(data) {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => warn!("Failed to start music track: {}", e),
        }
    }

    fn pause(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause(Tween::default());
        }
    }

    fn resume(&mut self) -> bool {
        match self.handle.as_mut() {
            Some(handle) if handle.state() != PlaybackState::Stopped => {
                handle.resume(Tween::default());
                true
            }
            _ => false,
        }
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop(Tween::default());
        }
    }

    fn set_volume(&mut self, gain: f32) {
        self.gain = gain;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(f64::from(gain), Tween::default());
        }
    }
}

/// Backend wrapping kira's `AudioManager`.
pub struct KiraBackend {
    manager: SharedManager,
    listener: Listener,
    voices: Vec<Weak<Mutex<Voice>>>,
}

impl KiraBackend {
    pub fn new() -> Result<Self, AudioError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::InitFailed(e.to_string()))?;

        info!("Audio backend: kira");

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
            listener: Listener::default(),
            voices: Vec::new(),
        })
    }
}

impl AudioBackend for KiraBackend {
    type Source = StaticSoundData;
    type Sample = KiraSample;
    type Track = KiraTrack;

    fn create_source(&mut self, data: Vec<u8>) -> Result<Self::Source, AudioError> {
        StaticSoundData::from_cursor(Cursor::new(data))
            .map_err(|e| AudioError::DecodeFailed(e.to_string()))
    }

    fn create_sample(&mut self, source: &Self::Source) -> Self::Sample {
        let voice = Arc::new(Mutex::new(Voice {
            manager: Arc::clone(&self.manager),
            data: source.clone(),
            handle: None,
            gain: 1.0,
            emitter: None,
            positional: false,
            listener: self.listener,
        }));
        self.voices.retain(|v| v.strong_count() > 0);
        self.voices.push(Arc::downgrade(&voice));
        KiraSample { voice }
    }

    fn open_track(&mut self, path: &Path) -> Result<Self::Track, AudioError> {
        let data = StaticSoundData::from_file(path)
            .map_err(|e| AudioError::DecodeFailed(format!("{}: {}", path.display(), e)))?;
        Ok(KiraTrack {
            manager: Arc::clone(&self.manager),
            data,
            handle: None,
            gain: 1.0,
        })
    }

    fn set_listener(&mut self, listener: &Listener) {
        self.listener = *listener;
        self.voices.retain(|v| v.strong_count() > 0);
        for voice in self.voices.iter().filter_map(Weak::upgrade) {
            let mut voice = voice.lock();
            voice.listener = *listener;
            if voice.positional {
                voice.apply_mix();
            }
        }
    }
}
