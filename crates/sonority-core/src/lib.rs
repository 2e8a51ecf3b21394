//! Sonority Core - Identifier types shared by the audio subsystem and its hosts
//!
//! This crate provides:
//! - Sound and music track identifiers
//! - Game-world object references (the packed "pid" encoding)
//! - Math primitives (re-exported from glam)

pub mod types;

pub use glam::Vec3;
pub use types::{MusicId, ObjectKind, ObjectRef, SoundId};
