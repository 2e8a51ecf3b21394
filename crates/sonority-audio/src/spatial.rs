use std::f32::consts::PI;

use glam::Vec3;

/// World units per audio-space unit. Object and listener positions are
/// divided by this before they reach the backend.
pub const POSITION_SCALE: f32 = 50.0;

/// Distance below which no attenuation is applied.
pub const REFERENCE_DISTANCE: f32 = 1.0;

/// Convert a world-space position into audio space.
pub fn to_audio_space(world: Vec3) -> Vec3 {
    world / POSITION_SCALE
}

/// Listener state for spatial audio calculations. Z is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    /// Position in audio space.
    pub position: Vec3,
    /// Heading around the Z axis, in radians.
    pub yaw: f32,
    /// Elevation above the horizon, in radians.
    pub pitch: f32,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl Listener {
    /// Build a listener from a world position and view angles measured in
    /// 2048 steps per turn.
    pub fn from_view(world_position: Vec3, view_yaw: i32, view_pitch: i32) -> Self {
        Self {
            position: to_audio_space(world_position),
            yaw: PI * view_yaw as f32 / 1024.0,
            pitch: PI * view_pitch as f32 / 1024.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
        )
    }

    pub fn up(&self) -> Vec3 {
        Vec3::Z
    }
}

/// A positioned sound: where it is and how far it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    /// Position in audio space.
    pub position: Vec3,
    /// Distance past which attenuation stops growing.
    pub max_distance: f32,
}

/// Parameters computed for an emitter relative to the listener.
#[derive(Debug, Clone, Copy)]
pub struct SpatialParams {
    /// Volume attenuation factor (0.0–1.0).
    pub volume: f64,
    /// Stereo panning (-1.0 = full left, 0.0 = center, 1.0 = full right).
    pub panning: f64,
}

/// Compute spatial audio parameters for an emitter relative to a listener.
///
/// Uses clamped inverse-distance attenuation between `REFERENCE_DISTANCE`
/// and the emitter's `max_distance`. Panning is the projection of the
/// direction to the emitter onto the listener's right vector.
pub fn compute_spatial(listener: &Listener, emitter: &Emitter) -> SpatialParams {
    let to_emitter = emitter.position - listener.position;
    let distance = to_emitter.length();

    if distance < f32::EPSILON {
        return SpatialParams {
            volume: 1.0,
            panning: 0.0,
        };
    }

    let max_distance = emitter.max_distance.max(REFERENCE_DISTANCE);
    let clamped = distance.clamp(REFERENCE_DISTANCE, max_distance);
    let volume = (REFERENCE_DISTANCE / clamped) as f64;

    let right = listener.forward().cross(listener.up()).normalize_or_zero();
    let panning = to_emitter.normalize().dot(right) as f64;

    SpatialParams {
        volume: volume.clamp(0.0, 1.0),
        panning: panning.clamp(-1.0, 1.0),
    }
}
