//! Big Five personality traits, sampled once at spawn

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    openness: f32,
    conscientiousness: f32,
    extraversion: f32,
    agreeableness: f32,
    neuroticism: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

impl Personality {
    /// Traits are clamped to [0, 1]
    pub fn new(
        openness: f32,
        conscientiousness: f32,
        extraversion: f32,
        agreeableness: f32,
        neuroticism: f32,
    ) -> Self {
        Self {
            openness: unit(openness),
            conscientiousness: unit(conscientiousness),
            extraversion: unit(extraversion),
            agreeableness: unit(agreeableness),
            neuroticism: unit(neuroticism),
        }
    }

    /// Five independent uniform samples
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen(), rng.gen(), rng.gen())
    }

    pub fn openness(&self) -> f32 {
        self.openness
    }

    pub fn conscientiousness(&self) -> f32 {
        self.conscientiousness
    }

    pub fn extraversion(&self) -> f32 {
        self.extraversion
    }

    pub fn agreeableness(&self) -> f32 {
        self.agreeableness
    }

    pub fn neuroticism(&self) -> f32 {
        self.neuroticism
    }

    /// Chance of fleeing rather than fighting a threat, clamped to [0, 1]
    pub fn flee_probability(&self) -> f32 {
        (0.5 + self.neuroticism * 0.3 - self.agreeableness * 0.2).clamp(0.0, 1.0)
    }
}

#[inline]
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}
