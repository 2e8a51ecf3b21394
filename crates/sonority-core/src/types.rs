//! Identifier types used throughout the audio subsystem

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical identifier of a sound in the sound catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u32);

impl SoundId {
    /// Sentinel for "no sound". Requests carrying it are silently ignored.
    pub const INVALID: SoundId = SoundId(0);

    /// Whether this id can refer to a catalog entry
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Offset this id by `delta`, used for sound families laid out contiguously
    pub fn offset(self, delta: u32) -> SoundId {
        SoundId(self.0.wrapping_add(delta))
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a music track. Track files are named after the numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MusicId(pub u32);

impl fmt::Display for MusicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of game-world object a sound can originate from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    None,
    Door,
    Item,
    Actor,
    Player,
    Decoration,
    Face,
    Unknown,
}

impl ObjectKind {
    /// Decode the 3-bit kind tag of a packed object reference
    pub fn from_tag(tag: u8) -> Self {
        match tag & 0x7 {
            0 => ObjectKind::None,
            1 => ObjectKind::Door,
            2 => ObjectKind::Item,
            3 => ObjectKind::Actor,
            4 => ObjectKind::Player,
            5 => ObjectKind::Decoration,
            6 => ObjectKind::Face,
            _ => ObjectKind::Unknown,
        }
    }

    /// The 3-bit tag used in packed object references
    pub fn tag(self) -> u8 {
        match self {
            ObjectKind::None => 0,
            ObjectKind::Door => 1,
            ObjectKind::Item => 2,
            ObjectKind::Actor => 3,
            ObjectKind::Player => 4,
            ObjectKind::Decoration => 5,
            ObjectKind::Face => 6,
            ObjectKind::Unknown => 7,
        }
    }
}

/// A reference to one game-world object: its kind and its index in the
/// kind's object list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub index: u32,
}

impl ObjectRef {
    /// Create a reference to object `index` of the given kind
    pub const fn new(kind: ObjectKind, index: u32) -> Self {
        Self { kind, index }
    }

    /// Pack into the legacy integer form `(index << 3) | kind`
    pub fn pack(self) -> i32 {
        ((self.index << 3) | u32::from(self.kind.tag())) as i32
    }

    /// Unpack the legacy integer form. Negative values are not object
    /// references and yield `None`.
    pub fn unpack(raw: i32) -> Option<Self> {
        if raw < 0 {
            return None;
        }
        let raw = raw as u32;
        Some(Self {
            kind: ObjectKind::from_tag((raw & 0x7) as u8),
            index: raw >> 3,
        })
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sound_id() {
        assert!(!SoundId::INVALID.is_valid());
        assert!(SoundId(42).is_valid());
        assert_eq!(SoundId(10).offset(1), SoundId(11));
    }

    #[test]
    fn test_object_ref_packing() {
        let door = ObjectRef::new(ObjectKind::Door, 12);
        assert_eq!(door.pack(), (12 << 3) | 1);
        assert_eq!(ObjectRef::unpack(door.pack()), Some(door));

        let actor = ObjectRef::unpack((7 << 3) | 3).unwrap();
        assert_eq!(actor.kind, ObjectKind::Actor);
        assert_eq!(actor.index, 7);
    }

    #[test]
    fn test_negative_pid_is_not_an_object() {
        assert_eq!(ObjectRef::unpack(-3), None);
    }

    #[test]
    fn test_unused_tag_is_unknown() {
        assert_eq!(ObjectKind::from_tag(7), ObjectKind::Unknown);
        assert_eq!(ObjectKind::Unknown.tag(), 7);
    }
}
