//! Player preferences
//!
//! Kept apart from [`Tuning`](crate::tuning::Tuning): these change how the game
//! looks and sounds, never how it plays. Held for the session only.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Sound starts off; `m` toggles it
    pub sound_on: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Theme loop volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Visual emphasis ===
    /// Post-process strength during normal play
    pub base_emphasis: f32,
    /// Post-process strength while invincible
    pub boosted_emphasis: f32,

    // === Accessibility ===
    /// Keep the post-process steady (no invincibility pulse)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_on: false,
            master_volume: 0.8,
            sfx_volume: 0.8,
            music_volume: 0.6,

            base_emphasis: 0.5,
            boosted_emphasis: 1.5,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.clamp_volumes();
        Ok(settings)
    }

    fn clamp_volumes(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
    }

    /// Emphasis while invincible (respects reduced_motion)
    pub fn effective_boosted_emphasis(&self) -> f32 {
        if self.reduced_motion {
            self.base_emphasis
        } else {
            self.boosted_emphasis
        }
    }

    pub fn effect_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    pub fn theme_volume(&self) -> f32 {
        self.master_volume * self.music_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_starts_off() {
        assert!(!Settings::default().sound_on);
    }

    #[test]
    fn test_partial_json() {
        let s = Settings::from_json(r#"{ "sound_on": true, "music_volume": 3.0 }"#).unwrap();
        assert!(s.sound_on);
        assert_eq!(s.music_volume, 1.0);
        assert_eq!(s.base_emphasis, Settings::default().base_emphasis);
    }

    #[test]
    fn test_reduced_motion_flattens_emphasis() {
        let s = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert_eq!(s.effective_boosted_emphasis(), s.base_emphasis);
    }
}
