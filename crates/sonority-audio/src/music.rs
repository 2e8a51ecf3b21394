use std::path::{Path, PathBuf};

use sonority_core::MusicId;
use tracing::{debug, warn};

use crate::backend::{AudioBackend, MusicTrack};
use crate::error::AudioError;

/// Observable music transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicState {
    Stopped,
    Playing,
    Paused,
}

/// Manages the single background music track.
pub struct MusicPlayer<T> {
    current: Option<(MusicId, T)>,
    state: MusicState,
    music_dir: PathBuf,
    music_volume: f32,
}

impl<T: MusicTrack> MusicPlayer<T> {
    pub fn new(music_dir: impl Into<PathBuf>, music_volume: f32) -> Self {
        Self {
            current: None,
            state: MusicState::Stopped,
            music_dir: music_dir.into(),
            music_volume,
        }
    }

    /// File a track id resolves to.
    pub fn track_path(&self, track: MusicId) -> PathBuf {
        self.music_dir.join(format!("{}.mp3", track))
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    pub fn current_track(&self) -> Option<MusicId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub fn state(&self) -> MusicState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.music_volume
    }

    /// Switch to `track`. Requesting the current track changes nothing.
    /// When the track file is missing or cannot be opened the music stays
    /// stopped.
    pub fn play<B>(&mut self, backend: &mut B, track: MusicId) -> Result<(), AudioError>
    where
        B: AudioBackend<Track = T>,
    {
        if self.current_track() == Some(track) {
            return Ok(());
        }
        self.stop();

        let path = self.track_path(track);
        if !path.is_file() {
            warn!("Music track {} not found", path.display());
            return Err(AudioError::TrackNotFound(path));
        }

        let mut handle = backend.open_track(&path).map_err(|e| {
            warn!("Failed to open music track {}: {}", path.display(), e);
            e
        })?;
        handle.set_volume(self.music_volume);
        handle.play();
        self.state = MusicState::Playing;
        if self.music_volume == 0.0 {
            handle.pause();
            self.state = MusicState::Paused;
        }

        debug!("Playing music track {}", track);
        self.current = Some((track, handle));
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some((_, mut handle)) = self.current.take() {
            handle.stop();
        }
        self.state = MusicState::Stopped;
    }

    pub fn pause(&mut self) {
        if let Some((_, handle)) = self.current.as_mut() {
            handle.pause();
            self.state = MusicState::Paused;
        }
    }

    /// Resume the current track. A stale backend handle is recovered by
    /// reopening the track and playing it from the start.
    pub fn resume<B>(&mut self, backend: &mut B)
    where
        B: AudioBackend<Track = T>,
    {
        let Some((track, handle)) = self.current.as_mut() else {
            return;
        };
        if handle.resume() {
            self.state = MusicState::Playing;
            return;
        }

        let track = *track;
        debug!("Music track {} failed to resume, restarting", track);
        self.stop();
        if let Err(e) = self.play(backend, track) {
            debug!("Music track {} could not be restarted: {}", track, e);
        }
    }

    /// Set the music gain. Zero gain pauses the track; any other gain
    /// resumes it.
    pub fn set_volume<B>(&mut self, backend: &mut B, gain: f32)
    where
        B: AudioBackend<Track = T>,
    {
        self.music_volume = gain;
        let Some((_, handle)) = self.current.as_mut() else {
            return;
        };
        handle.set_volume(gain);
        if gain == 0.0 {
            self.pause();
        } else {
            self.resume(backend);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, HeadlessTrack, PlaybackState};
    use std::fs;
    use tempfile::TempDir;

    /// A scratch music directory holding empty track files. Removed on drop.
    pub(crate) fn music_dir_with(tracks: &[u32]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for track in tracks {
            fs::write(dir.path().join(format!("{}.mp3", track)), b"ID3").unwrap();
        }
        dir
    }

    fn player(dir: &TempDir, gain: f32) -> MusicPlayer<HeadlessTrack> {
        MusicPlayer::new(dir.path(), gain)
    }

    #[test]
    fn scratch_tracks_are_removed_on_drop() {
        let dir = music_dir_with(&[1]);
        let path = dir.path().to_path_buf();
        assert!(path.join("1.mp3").is_file());
        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn plays_and_switches_tracks() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[2, 3]);
        let mut music = player(&dir, 0.5);

        music.play(&mut backend, MusicId(2)).unwrap();
        assert_eq!(music.current_track(), Some(MusicId(2)));
        assert_eq!(music.state(), MusicState::Playing);

        music.play(&mut backend, MusicId(3)).unwrap();
        let tracks = backend.tracks();
        assert_eq!(tracks.len(), 1, "previous track must be released");
        assert!(tracks[0].path.ends_with("3.mp3"));
        assert_eq!(tracks[0].state, PlaybackState::Playing);
        assert_eq!(tracks[0].gain, 0.5);
        assert_eq!(music.current_track(), Some(MusicId(3)));
    }

    #[test]
    fn same_track_is_a_no_op() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[4]);
        let mut music = player(&dir, 0.5);

        music.play(&mut backend, MusicId(4)).unwrap();
        music.play(&mut backend, MusicId(4)).unwrap();
        assert_eq!(backend.tracks().len(), 1);
        assert_eq!(backend.tracks()[0].state, PlaybackState::Playing);
    }

    #[test]
    fn missing_track_leaves_music_stopped() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[1]);
        let mut music = player(&dir, 0.5);

        music.play(&mut backend, MusicId(1)).unwrap();
        let result = music.play(&mut backend, MusicId(9));
        assert!(matches!(result, Err(AudioError::TrackNotFound(_))));
        assert_eq!(music.state(), MusicState::Stopped);
        assert_eq!(music.current_track(), None);
        assert_eq!(backend.tracks()[0].state, PlaybackState::Stopped);
    }

    #[test]
    fn silent_track_starts_paused() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[5]);
        let mut music = player(&dir, 0.0);

        music.play(&mut backend, MusicId(5)).unwrap();
        assert_eq!(music.state(), MusicState::Paused);
        assert_eq!(backend.tracks()[0].state, PlaybackState::Paused);
    }

    #[test]
    fn failed_resume_restarts_track() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[6]);
        let mut music = player(&dir, 0.5);

        music.play(&mut backend, MusicId(6)).unwrap();
        music.pause();
        backend.invalidate_tracks();
        music.resume(&mut backend);

        let tracks = backend.tracks();
        assert_eq!(tracks.len(), 1);
        assert!(!tracks[0].invalid, "track must be reopened");
        assert_eq!(tracks[0].state, PlaybackState::Playing);
        assert_eq!(music.current_track(), Some(MusicId(6)));
        assert_eq!(music.state(), MusicState::Playing);
    }

    #[test]
    fn failed_restart_leaves_music_stopped() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[9]);
        let mut music = player(&dir, 0.5);

        music.play(&mut backend, MusicId(9)).unwrap();
        music.pause();
        backend.invalidate_tracks();
        fs::remove_file(dir.path().join("9.mp3")).unwrap();
        music.resume(&mut backend);

        assert_eq!(music.state(), MusicState::Stopped);
        assert_eq!(music.current_track(), None);
        assert_eq!(backend.tracks().len(), 1);
    }

    #[test]
    fn volume_zero_pauses_and_positive_resumes() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[7]);
        let mut music = player(&dir, 0.5);
        music.play(&mut backend, MusicId(7)).unwrap();

        music.set_volume(&mut backend, 0.0);
        assert_eq!(music.state(), MusicState::Paused);
        assert_eq!(backend.tracks()[0].state, PlaybackState::Paused);

        music.set_volume(&mut backend, 0.33);
        assert_eq!(music.state(), MusicState::Playing);
        assert_eq!(backend.tracks()[0].gain, 0.33);
    }

    #[test]
    fn volume_without_track_is_remembered() {
        let mut backend = HeadlessBackend::new();
        let dir = music_dir_with(&[8]);
        let mut music = player(&dir, 0.5);

        music.set_volume(&mut backend, 0.77);
        music.play(&mut backend, MusicId(8)).unwrap();
        assert_eq!(backend.tracks()[0].gain, 0.77);
    }
}
