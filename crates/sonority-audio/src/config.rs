use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::volume;

/// Audio configuration. Maps to the `audio` table of the host's settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Disable all sound output. Requests become no-ops.
    pub no_sound: bool,
    /// Effects level (0–9). Drives regular and looping sounds and footsteps.
    pub sound_level: i32,
    /// Voice level (0–9).
    pub voice_level: i32,
    /// Music level (0–9).
    pub music_level: i32,
    /// Game data root. The archive lives in `sounds/`, tracks in `music/`.
    pub data_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            no_sound: false,
            sound_level: 4,
            voice_level: 7,
            music_level: 3,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl AudioConfig {
    /// Path of the packed sound archive.
    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join("sounds").join("audio.snd")
    }

    /// Directory holding the music tracks.
    pub fn music_dir(&self) -> PathBuf {
        self.data_dir.join("music")
    }

    /// Use a different data root.
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    /// Clamp every level into the supported range.
    pub fn clamped(mut self) -> Self {
        self.sound_level = volume::clamp_level(self.sound_level);
        self.voice_level = volume::clamp_level(self.voice_level);
        self.music_level = volume::clamp_level(self.music_level);
        self
    }

    /// Whether effects are audible at the configured level.
    pub fn effects_audible(&self) -> bool {
        !self.no_sound && self.sound_level >= 1
    }
}
