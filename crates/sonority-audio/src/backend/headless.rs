//! A backend that produces no output. Playback state is tracked in memory
//! so hosts without an audio device keep working and tests can observe
//! and steer what the subsystem does.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use glam::Vec3;
use parking_lot::Mutex;
use tracing::debug;

use super::{AudioBackend, AudioSample, MusicTrack};
use crate::error::AudioError;
use crate::spatial::{Emitter, Listener};

/// Playback state of a headless sample or track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

/// Observable state of one headless sample.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceState {
    pub state: PlaybackState,
    pub looping: bool,
    pub positional: bool,
    pub gain: f32,
    pub emitter: Option<Emitter>,
    /// Size of the source the sample was created from.
    pub source_len: usize,
}

/// Decoded source: the raw bytes it was created from.
#[derive(Debug, Clone)]
pub struct HeadlessSource {
    data: Arc<[u8]>,
}

impl HeadlessSource {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug)]
pub struct HeadlessSample {
    voice: Arc<Mutex<VoiceState>>,
}

impl AudioSample for HeadlessSample {
    fn play(&mut self, looping: bool, positional: bool) {
        let mut voice = self.voice.lock();
        voice.state = PlaybackState::Playing;
        voice.looping = looping;
        voice.positional = positional;
    }

    fn pause(&mut self) {
        let mut voice = self.voice.lock();
        if voice.state == PlaybackState::Playing {
            voice.state = PlaybackState::Paused;
        }
    }

    fn resume(&mut self) -> bool {
        let mut voice = self.voice.lock();
        match voice.state {
            PlaybackState::Paused => {
                voice.state = PlaybackState::Playing;
                true
            }
            PlaybackState::Playing => true,
            PlaybackState::Idle | PlaybackState::Stopped => false,
        }
    }

    fn stop(&mut self) {
        self.voice.lock().state = PlaybackState::Stopped;
    }

    fn is_stopped(&self) -> bool {
        self.voice.lock().state == PlaybackState::Stopped
    }

    fn set_volume(&mut self, gain: f32) {
        self.voice.lock().gain = gain;
    }

    fn set_position(&mut self, position: Vec3, max_distance: f32) {
        self.voice.lock().emitter = Some(Emitter {
            position,
            max_distance,
        });
    }
}

/// Observable state of one headless music track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    pub path: PathBuf,
    pub state: PlaybackState,
    pub gain: f32,
    /// Set when the backend handle went stale. Resume then fails.
    pub invalid: bool,
}

#[derive(Debug)]
pub struct HeadlessTrack {
    track: Arc<Mutex<TrackState>>,
}

impl MusicTrack for HeadlessTrack {
    fn play(&mut self) {
        self.track.lock().state = PlaybackState::Playing;
    }

    fn pause(&mut self) {
        let mut track = self.track.lock();
        if track.state == PlaybackState::Playing {
            track.state = PlaybackState::Paused;
        }
    }

    fn resume(&mut self) -> bool {
        let mut track = self.track.lock();
        if track.invalid || track.state == PlaybackState::Stopped {
            return false;
        }
        track.state = PlaybackState::Playing;
        true
    }

    fn stop(&mut self) {
        self.track.lock().state = PlaybackState::Stopped;
    }

    fn set_volume(&mut self, gain: f32) {
        self.track.lock().gain = gain;
    }
}

/// Backend without an output device.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    voices: Vec<Weak<Mutex<VoiceState>>>,
    tracks: Vec<Arc<Mutex<TrackState>>>,
    listener: Listener,
    decoded: usize,
    fail_decode: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        debug!("Audio backend: headless");
        Self::default()
    }

    /// Make every following decode fail, as a corrupt payload would.
    pub fn set_fail_decode(&mut self, fail: bool) {
        self.fail_decode = fail;
    }

    /// Number of sources decoded so far.
    pub fn decoded_sources(&self) -> usize {
        self.decoded
    }

    /// State of every sample still owned by someone.
    pub fn voices(&self) -> Vec<VoiceState> {
        self.voices
            .iter()
            .filter_map(Weak::upgrade)
            .map(|voice| voice.lock().clone())
            .collect()
    }

    /// Samples that are playing or paused.
    pub fn active_voices(&self) -> usize {
        self.voices()
            .iter()
            .filter(|v| matches!(v.state, PlaybackState::Playing | PlaybackState::Paused))
            .count()
    }

    /// End playback of every sample, as if each reached its end.
    pub fn finish_all(&mut self) {
        self.voices.retain(|voice| voice.strong_count() > 0);
        for voice in self.voices.iter().filter_map(Weak::upgrade) {
            voice.lock().state = PlaybackState::Stopped;
        }
    }

    /// Tracks still held by a handle, plus any released since the last
    /// `open_track`, oldest first.
    pub fn tracks(&self) -> Vec<TrackState> {
        self.tracks.iter().map(|t| t.lock().clone()).collect()
    }

    /// Make the handles of all open tracks stale.
    pub fn invalidate_tracks(&mut self) {
        for track in &self.tracks {
            track.lock().invalid = true;
        }
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

impl AudioBackend for HeadlessBackend {
    type Source = HeadlessSource;
    type Sample = HeadlessSample;
    type Track = HeadlessTrack;

    fn create_source(&mut self, data: Vec<u8>) -> Result<Self::Source, AudioError> {
        if self.fail_decode || data.is_empty() {
            return Err(AudioError::DecodeFailed(format!(
                "{} bytes of unreadable audio",
                data.len()
            )));
        }
        self.decoded += 1;
        Ok(HeadlessSource { data: data.into() })
    }

    fn create_sample(&mut self, source: &Self::Source) -> Self::Sample {
        let voice = Arc::new(Mutex::new(VoiceState {
            state: PlaybackState::Idle,
            looping: false,
            positional: false,
            gain: 1.0,
            emitter: None,
            source_len: source.len(),
        }));
        self.voices.retain(|voice| voice.strong_count() > 0);
        self.voices.push(Arc::downgrade(&voice));
        HeadlessSample { voice }
    }

    fn open_track(&mut self, path: &Path) -> Result<Self::Track, AudioError> {
        let track = Arc::new(Mutex::new(TrackState {
            path: path.to_path_buf(),
            state: PlaybackState::Idle,
            gain: 1.0,
            invalid: false,
        }));
        self.tracks.retain(|track| Arc::strong_count(track) > 1);
        self.tracks.push(Arc::clone(&track));
        Ok(HeadlessTrack { track })
    }

    fn set_listener(&mut self, listener: &Listener) {
        self.listener = *listener;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let source = backend.create_source(vec![1, 2, 3]).unwrap();
        let mut sample = backend.create_sample(&source);

        assert_eq!(backend.active_voices(), 0);
        sample.play(false, false);
        assert_eq!(backend.active_voices(), 1);

        sample.pause();
        assert!(sample.resume());
        assert!(!sample.is_stopped());

        backend.finish_all();
        assert!(sample.is_stopped());
        assert!(!sample.resume());
    }

    #[test]
    fn dropped_samples_are_forgotten() {
        let mut backend = HeadlessBackend::new();
        let source = backend.create_source(vec![0; 8]).unwrap();
        let sample = backend.create_sample(&source);
        assert_eq!(backend.voices().len(), 1);
        drop(sample);
        assert!(backend.voices().is_empty());
    }

    #[test]
    fn empty_data_fails_to_decode() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_source(Vec::new()).is_err());
        backend.set_fail_decode(true);
        assert!(backend.create_source(vec![1]).is_err());
        assert_eq!(backend.decoded_sources(), 0);
    }

    #[test]
    fn released_tracks_are_forgotten_on_next_open() {
        let mut backend = HeadlessBackend::new();
        for _ in 0..50 {
            let mut track = backend.open_track(Path::new("music/1.mp3")).unwrap();
            track.play();
            track.stop();
        }
        assert_eq!(backend.tracks().len(), 1);

        let held = backend.open_track(Path::new("music/2.mp3")).unwrap();
        let _next = backend.open_track(Path::new("music/3.mp3")).unwrap();
        assert_eq!(backend.tracks().len(), 2);
        drop(held);
    }

    #[test]
    fn stale_track_cannot_resume() {
        let mut backend = HeadlessBackend::new();
        let mut track = backend.open_track(Path::new("music/3.mp3")).unwrap();
        track.play();
        track.pause();
        backend.invalidate_tracks();
        assert!(!track.resume());
    }
}
