//! Transient emotional overlay

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Scared,
    Excited,
    Loving,
}

/// Current emotion and its intensity in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionState {
    emotion: Emotion,
    intensity: f32,
}

impl EmotionState {
    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Replace the current emotion. Zero intensity (or `Neutral`) resets.
    pub fn set(&mut self, emotion: Emotion, intensity: f32) {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
        if emotion == Emotion::Neutral || intensity <= 0.0 {
            *self = Self::default();
        } else {
            self.emotion = emotion;
            self.intensity = intensity;
        }
    }

    /// Linear decay; the tag resets to neutral once intensity reaches 0
    pub fn decay(&mut self, dt: f32, rate: f32) {
        if self.emotion == Emotion::Neutral {
            return;
        }
        self.intensity = (self.intensity - rate.max(0.0) * dt.max(0.0)).max(0.0);
        if self.intensity <= 0.0 {
            *self = Self::default();
        }
    }
}
