//! Runtime player preferences
//!
//! Persisted by the host page; the simulation only reads them.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_GAME_SPEED;
use crate::sim::config::ConfigError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 3] = [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High];

    /// Label shown in the settings panel
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Parse a panel label, case-insensitive; "med" is accepted for Medium
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("med") {
            return Some(QualityPreset::Medium);
        }
        Self::ALL.into_iter().find(|p| p.as_str().eq_ignore_ascii_case(s))
    }

    /// Sparks spawned per projectile kill
    pub fn sparks_per_kill(&self) -> u32 {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 3,
            QualityPreset::High => 5,
        }
    }
}

/// What happens when the stage kill target is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProgressionMode {
    /// Restart the current stage
    #[default]
    Farm,
    /// Advance to the next stage
    Progress,
}

impl ProgressionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressionMode::Farm => "Farm",
            ProgressionMode::Progress => "Progress",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        [ProgressionMode::Farm, ProgressionMode::Progress]
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

/// Player preferences read by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Global game speed multiplier (0 = paused)
    pub game_speed: f32,
    /// Stage clear behaviour
    pub progression_mode: ProgressionMode,
    /// Fire skills automatically when a target is in range.
    /// Also lets the ship steer itself toward targets.
    pub auto_skills: bool,

    // === Visual Effects ===
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Explosion/spark FX
    pub particles: bool,
    /// Floating damage numbers
    pub damage_numbers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_speed: 1.0,
            progression_mode: ProgressionMode::Farm,
            auto_skills: true,
            quality: QualityPreset::Medium,
            particles: true,
            damage_numbers: true,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.game_speed = clamp_game_speed(settings.game_speed);
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Set game speed, clamped to the supported range
    pub fn set_game_speed(&mut self, speed: f32) {
        self.game_speed = clamp_game_speed(speed);
    }
}

fn clamp_game_speed(speed: f32) -> f32 {
    if speed.is_finite() {
        speed.clamp(0.0, MAX_GAME_SPEED)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert_eq!(s.game_speed, 1.0);
        assert_eq!(s.progression_mode, ProgressionMode::Farm);
        assert!(s.auto_skills);
    }

    #[test]
    fn test_json_round_trip_keeps_mode() {
        let mut s = Settings::default();
        s.progression_mode = ProgressionMode::Progress;
        s.set_game_speed(7.5);
        let json = s.to_json().unwrap();
        let back = Settings::from_json(&json).unwrap();
        assert_eq!(back.progression_mode, ProgressionMode::Progress);
        assert_eq!(back.game_speed, 7.5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{"game_speed": 500.0}"#).unwrap();
        assert_eq!(s.game_speed, MAX_GAME_SPEED);
        assert!(s.particles);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(Settings::from_json("{not json").is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(ProgressionMode::from_str("PROGRESS"), Some(ProgressionMode::Progress));
        assert_eq!(ProgressionMode::from_str("idle"), None);
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
    }

    #[test]
    fn test_quality_labels_parse_back() {
        for preset in QualityPreset::ALL {
            assert_eq!(QualityPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(QualityPreset::from_str(" high "), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::High.sparks_per_kill(), 5);
    }
}
