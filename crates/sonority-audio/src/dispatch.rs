//! Routing of a playback request to a pool, a de-duplication policy, a
//! volume channel and an optional 3D placement.

use std::collections::HashMap;

use glam::Vec3;
use sonority_core::{ObjectKind, ObjectRef};
use tracing::debug;

use crate::spatial::to_audio_space;

/// Attenuation distance for doors, actors and items.
pub const OBJECT_FALLOFF: f32 = 500.0;

/// Attenuation distance for level decorations.
pub const DECORATION_FALLOFF: f32 = 2000.0;

/// Who or what a sound is played for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    /// UI and other sounds without an owner. Never de-duplicated.
    Generic,
    /// One instance per sound id; a new request restarts the sound.
    ExclusiveOverridable,
    /// One instance per sound id; a new request is ignored while the
    /// previous one plays.
    ExclusiveLocked,
    /// The footstep slot. Only one walking sound exists at a time.
    Walking,
    /// Exclusive sound played at the music level (volume previews).
    MusicVolumeChannel,
    /// Exclusive sound played at the voice level (volume previews).
    VoiceVolumeChannel,
    /// A sound emitted by a game-world object.
    Object(ObjectRef),
}

impl DispatchTarget {
    /// Decode the legacy integer originator space: `0` generic, `-1` to
    /// `-5` the special channels, positive values packed object references.
    pub fn from_raw_pid(pid: i32) -> Self {
        match pid {
            0 => DispatchTarget::Generic,
            -1 => DispatchTarget::ExclusiveOverridable,
            -2 => DispatchTarget::ExclusiveLocked,
            -3 => DispatchTarget::Walking,
            -4 => DispatchTarget::MusicVolumeChannel,
            -5 => DispatchTarget::VoiceVolumeChannel,
            _ => match ObjectRef::unpack(pid) {
                Some(object) => DispatchTarget::Object(object),
                None => {
                    debug_assert!(false, "unexpected originator pid {}", pid);
                    DispatchTarget::ExclusiveOverridable
                }
            },
        }
    }
}

/// Looks up where game-world objects are. Returns `None` for indices
/// outside the kind's object list.
pub trait WorldPositions {
    /// World-space position of `object`.
    fn object_position(&self, object: ObjectRef) -> Option<Vec3>;
}

/// A world with no objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyWorld;

impl WorldPositions for EmptyWorld {
    fn object_position(&self, _object: ObjectRef) -> Option<Vec3> {
        None
    }
}

impl WorldPositions for HashMap<ObjectRef, Vec3> {
    fn object_position(&self, object: ObjectRef) -> Option<Vec3> {
        self.get(&object).copied()
    }
}

/// Pool a routed sound goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Regular,
    Looping,
    Voice,
}

/// Volume channel a sample takes its gain from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Master,
    Voice,
    Music,
}

/// How the pool treats existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Always start.
    New,
    /// One per sound id. `restart` stops the running instance first.
    UniqueSound { restart: bool },
    /// One per originating object.
    UniqueObject(ObjectRef),
}

/// Position and attenuation distance in audio space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub max_distance: f32,
}

/// Resolved handling of one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route {
    /// Replace the walking sample.
    Walking,
    Pool {
        pool: PoolKind,
        policy: Policy,
        channel: Channel,
        placement: Option<Placement>,
    },
}

impl Route {
    fn plain(policy: Policy, channel: Channel) -> Self {
        Route::Pool {
            pool: PoolKind::Regular,
            policy,
            channel,
            placement: None,
        }
    }
}

/// Resolve a target into a route, looking up object positions in `world`.
pub fn route(target: DispatchTarget, world: &dyn WorldPositions) -> Route {
    let exclusive = Policy::UniqueSound { restart: true };
    match target {
        DispatchTarget::Generic => Route::plain(Policy::New, Channel::Master),
        DispatchTarget::ExclusiveOverridable => Route::plain(exclusive, Channel::Master),
        DispatchTarget::ExclusiveLocked => {
            Route::plain(Policy::UniqueSound { restart: false }, Channel::Master)
        }
        DispatchTarget::Walking => Route::Walking,
        DispatchTarget::MusicVolumeChannel => Route::plain(exclusive, Channel::Music),
        DispatchTarget::VoiceVolumeChannel => Route::plain(exclusive, Channel::Voice),
        DispatchTarget::Object(object) => route_object(object, world),
    }
}

fn route_object(object: ObjectRef, world: &dyn WorldPositions) -> Route {
    let (pool, policy, falloff) = match object.kind {
        ObjectKind::Door | ObjectKind::Actor => {
            (PoolKind::Regular, Policy::UniqueObject(object), OBJECT_FALLOFF)
        }
        ObjectKind::Decoration => (PoolKind::Looping, Policy::New, DECORATION_FALLOFF),
        ObjectKind::Item => (PoolKind::Regular, Policy::New, OBJECT_FALLOFF),
        ObjectKind::Player => {
            return Route::Pool {
                pool: PoolKind::Voice,
                policy: Policy::UniqueObject(object),
                channel: Channel::Voice,
                placement: None,
            };
        }
        ObjectKind::Face => return Route::plain(Policy::New, Channel::Master),
        ObjectKind::None | ObjectKind::Unknown => {
            debug!("Unexpected object kind {:?} in sound request", object.kind);
            return Route::plain(Policy::New, Channel::Master);
        }
    };

    let position = world.object_position(object);
    debug_assert!(position.is_some(), "sound emitter {} is out of range", object);

    Route::Pool {
        pool,
        policy,
        channel: Channel::Master,
        placement: position.map(|position| Placement {
            position: to_audio_space(position),
            max_distance: falloff,
        }),
    }
}
