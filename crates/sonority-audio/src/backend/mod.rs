//! The platform audio capability the subsystem drives.
//!
//! The subsystem never talks to a device directly. It decodes sources,
//! creates samples and opens music tracks through [`AudioBackend`], and
//! controls playback through [`AudioSample`] and [`MusicTrack`].

use std::path::Path;

use glam::Vec3;

use crate::error::AudioError;
use crate::spatial::Listener;

mod headless;
#[cfg(feature = "kira_backend")]
mod kira_backend;

pub use headless::{
    HeadlessBackend, HeadlessSample, HeadlessSource, HeadlessTrack, PlaybackState, TrackState,
    VoiceState,
};
#[cfg(feature = "kira_backend")]
pub use kira_backend::{KiraBackend, KiraSample, KiraTrack};

/// One playable instance of a decoded source.
pub trait AudioSample {
    /// Start playback. Looping samples restart at the end until stopped.
    /// Non-positional samples ignore any position they were given.
    fn play(&mut self, looping: bool, positional: bool);

    fn pause(&mut self);

    /// Resume after a pause. Returns false when the backend could not resume.
    fn resume(&mut self) -> bool;

    fn stop(&mut self);

    /// True once playback has ended or been stopped.
    fn is_stopped(&self) -> bool;

    /// Gain in `[0, 1]`.
    fn set_volume(&mut self, gain: f32);

    /// Place the sample in audio space with the given maximum attenuation distance.
    fn set_position(&mut self, position: Vec3, max_distance: f32);
}

/// A streamed music track.
pub trait MusicTrack {
    fn play(&mut self);

    fn pause(&mut self);

    /// Resume after a pause. Returns false when the backend handle is no
    /// longer usable and the track must be reopened.
    fn resume(&mut self) -> bool;

    fn stop(&mut self);

    fn set_volume(&mut self, gain: f32);
}

/// Source decoding, sample creation and listener placement.
pub trait AudioBackend {
    /// A decoded source. Cloning must be cheap: every sample of the same
    /// sound shares one source.
    type Source: Clone;
    type Sample: AudioSample;
    type Track: MusicTrack;

    /// Decode an encoded sound file held in memory.
    fn create_source(&mut self, data: Vec<u8>) -> Result<Self::Source, AudioError>;

    fn create_sample(&mut self, source: &Self::Source) -> Self::Sample;

    /// Open a music track file.
    fn open_track(&mut self, path: &Path) -> Result<Self::Track, AudioError>;

    /// Move the listener. Positional samples are attenuated relative to it.
    fn set_listener(&mut self, listener: &Listener);
}
