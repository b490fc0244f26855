//! Nova Swarm - data-oriented combat simulation core
//!
//! Core modules:
//! - `sim`: Simulation (flat entity store, spatial grid, pools, AI, combat, loot)
//! - `settings`: Runtime player preferences
//! - `format`: Compact number notation for HUD text
//! - `wasm`: Browser bindings that expose the flat buffers to the renderer

pub mod format;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use format::format_number;
pub use settings::{ProgressionMode, Settings};

/// Simulation timing constants
pub mod consts {
    /// Reference frame duration in milliseconds. Per-frame speeds in the
    /// config tables are expressed relative to this.
    pub const FRAME_MS: f32 = 16.6;
    /// Frames longer than this are treated as a stall and replaced by `FRAME_MS`
    pub const MAX_FRAME_MS: f32 = 100.0;
    /// Maximum substeps per frame when fast-forwarding
    pub const MAX_SUBSTEPS: u32 = 10;
    /// Highest accepted global game speed multiplier
    pub const MAX_GAME_SPEED: f32 = 50.0;
    /// Logic time above which a frame is reported as slow
    pub const FRAME_BUDGET_MS: f64 = 16.0;

    /// Nearest-target search cadence (10 Hz)
    pub const TARGET_INTERVAL_MS: f64 = 100.0;
    /// Max weapon shots fired per weapon per step when catching up
    pub const MAX_CATCHUP_SHOTS: u32 = 10;
    /// Weapon timers older than this are resynchronised instead of caught up
    pub const WEAPON_RESYNC_MS: f64 = 1000.0;

    /// Damage numbers of the same crit tier within this window are merged
    pub const DAMAGE_BATCH_WINDOW_MS: f64 = 100.0;
    /// Loot queue flush cadence
    pub const LOOT_FLUSH_INTERVAL_MS: f64 = 250.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed rotation from `from` to `to`
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Animation decimation factor for the global game speed.
///
/// At high fast-forward speeds animation frames advance in larger strides so
/// sprites keep pace with the simulation.
#[inline]
pub fn anim_stride(game_speed: f32) -> f32 {
    if game_speed >= 25.0 {
        6.0
    } else if game_speed >= 20.0 {
        5.0
    } else if game_speed >= 15.0 {
        2.5
    } else if game_speed >= 10.0 {
        1.66
    } else if game_speed >= 5.0 {
        1.25
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) - (-PI / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_angle_delta_wraps() {
        let d = angle_delta(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_anim_stride_grows_with_speed() {
        assert_eq!(anim_stride(1.0), 1.0);
        assert_eq!(anim_stride(5.0), 1.25);
        assert_eq!(anim_stride(30.0), 6.0);
    }
}
