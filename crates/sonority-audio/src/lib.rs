//! Sonority Audio - Sound effects, voice and music playback for a game world
//!
//! Reads the sound catalog and the packed sound archive, decodes each sound
//! once, and routes playback requests into pools keyed by sound or by the
//! game object that emitted them.

mod archive;
pub mod backend;
mod cache;
mod catalog;
mod config;
mod dispatch;
mod error;
mod loader;
mod music;
mod player;
mod pool;
mod spatial;
pub mod volume;

pub use archive::{ArchiveIndex, ArchiveRecord, ARCHIVE_HEADER_SIZE};
pub use backend::{AudioBackend, AudioSample, HeadlessBackend, MusicTrack};
#[cfg(feature = "kira_backend")]
pub use backend::KiraBackend;
pub use cache::SourceCache;
pub use catalog::{
    CatalogEntry, DescriptionTable, SoundCatalog, SoundCategory, SoundFlags, TableFormat,
};
pub use config::AudioConfig;
pub use dispatch::{
    route, Channel, DispatchTarget, EmptyWorld, Placement, Policy, PoolKind, Route,
    WorldPositions, DECORATION_FALLOFF, OBJECT_FALLOFF,
};
pub use error::AudioError;
pub use loader::SoundLoader;
pub use music::{MusicPlayer, MusicState};
pub use player::{AudioPlayer, PlayOutcome};
pub use pool::{PoolKey, SamplePool};
pub use spatial::{compute_spatial, to_audio_space, Emitter, Listener, SpatialParams};
pub use volume::level_to_gain;
