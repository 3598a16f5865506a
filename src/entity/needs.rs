//! Physiological and psychological needs that drive creature behavior

use serde::{Deserialize, Serialize};

use crate::core::config::NeedRates;

pub const NEED_MAX: f32 = 100.0;
pub const CRITICAL_THRESHOLD: f32 = 20.0;
pub const LOW_THRESHOLD: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedType {
    Hunger,
    Thirst,
    Energy,
    Social,
    Comfort,
    Safety,
}

impl NeedType {
    /// In descending survival importance
    pub const BY_IMPORTANCE: [NeedType; 6] = [
        NeedType::Safety,
        NeedType::Thirst,
        NeedType::Hunger,
        NeedType::Energy,
        NeedType::Social,
        NeedType::Comfort,
    ];

    /// Importance weight used by [`Needs::most_urgent`]
    pub fn importance(&self) -> f32 {
        match self {
            NeedType::Safety => 1.5,
            NeedType::Thirst => 1.4,
            NeedType::Hunger => 1.3,
            NeedType::Energy => 1.1,
            NeedType::Social => 0.9,
            NeedType::Comfort => 0.8,
        }
    }

    /// Hunger and thirst; reaching zero on either damages the agent
    pub fn is_vital(&self) -> bool {
        matches!(self, NeedType::Hunger | NeedType::Thirst)
    }

    /// Bit for this need in [`Needs::below_mask`]
    pub fn mask(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// Need values on a 0-100 scale where 100 is fully satisfied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub hunger: f32,
    pub thirst: f32,
    pub energy: f32,
    pub social: f32,
    pub comfort: f32,
    pub safety: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            thirst: 80.0,
            energy: 90.0,
            social: 70.0,
            comfort: 70.0,
            safety: 100.0,
        }
    }
}

impl Needs {
    pub fn get(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Hunger => self.hunger,
            NeedType::Thirst => self.thirst,
            NeedType::Energy => self.energy,
            NeedType::Social => self.social,
            NeedType::Comfort => self.comfort,
            NeedType::Safety => self.safety,
        }
    }

    fn slot(&mut self, need: NeedType) -> &mut f32 {
        match need {
            NeedType::Hunger => &mut self.hunger,
            NeedType::Thirst => &mut self.thirst,
            NeedType::Energy => &mut self.energy,
            NeedType::Social => &mut self.social,
            NeedType::Comfort => &mut self.comfort,
            NeedType::Safety => &mut self.safety,
        }
    }

    /// Set a need, clamped to [0, 100]
    pub fn set(&mut self, need: NeedType, value: f32) {
        *self.slot(need) = clamp_need(value);
    }

    /// Decay every need by `rate * dt * multiplier`
    pub fn update(&mut self, dt: f32, rates: &NeedRates, multiplier: f32) {
        let dt = dt.max(0.0) * multiplier.max(0.0);
        self.hunger = clamp_need(self.hunger - rates.hunger * dt);
        self.thirst = clamp_need(self.thirst - rates.thirst * dt);
        self.energy = clamp_need(self.energy - rates.energy * dt);
        self.social = clamp_need(self.social - rates.social * dt);
        self.comfort = clamp_need(self.comfort - rates.comfort * dt);
        self.safety = clamp_need(self.safety - rates.safety * dt);
    }

    /// Raise a need by `|amount|`
    pub fn satisfy(&mut self, need: NeedType, amount: f32) {
        let slot = self.slot(need);
        *slot = clamp_need(*slot + amount.abs());
    }

    /// Lower a need by `|amount|`
    pub fn deplete(&mut self, need: NeedType, amount: f32) {
        let slot = self.slot(need);
        *slot = clamp_need(*slot - amount.abs());
    }

    pub fn is_critical(&self, need: NeedType) -> bool {
        self.get(need) < CRITICAL_THRESHOLD
    }

    pub fn is_low(&self, need: NeedType) -> bool {
        self.get(need) < LOW_THRESHOLD
    }

    /// Bit set of needs currently below `threshold`
    pub fn below_mask(&self, threshold: f32) -> u8 {
        NeedType::BY_IMPORTANCE
            .iter()
            .filter(|n| self.get(**n) < threshold)
            .fold(0, |mask, n| mask | n.mask())
    }

    /// Need with the lowest importance-weighted value (`value / importance`).
    ///
    /// Equal weighted values go to the more important need.
    pub fn most_urgent(&self) -> NeedType {
        let mut best = NeedType::Safety;
        let mut best_score = f32::INFINITY;
        for need in NeedType::BY_IMPORTANCE {
            let score = self.get(need) / need.importance();
            if score < best_score {
                best = need;
                best_score = score;
            }
        }
        best
    }

    pub fn is_dying(&self) -> bool {
        self.hunger <= 0.0 || self.thirst <= 0.0
    }

    /// Multiplier (<= 1) applied to action effectiveness.
    ///
    /// Hunger, thirst and energy each cost x0.85 below 30 and a further x0.7
    /// below 10.
    pub fn stat_penalty(&self) -> f32 {
        [self.hunger, self.thirst, self.energy]
            .iter()
            .fold(1.0, |penalty, value| {
                let mut p = penalty;
                if *value < 30.0 {
                    p *= 0.85;
                }
                if *value < 10.0 {
                    p *= 0.7;
                }
                p
            })
    }
}

#[inline]
fn clamp_need(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, NEED_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_decays_and_clamps() {
        let mut needs = Needs::default();
        let rates = NeedRates::default();
        needs.update(10.0, &rates, 1.0);
        assert!((needs.hunger - 75.0).abs() < 1e-4);
        assert!((needs.thirst - 73.0).abs() < 1e-4);
        assert_eq!(needs.safety, 100.0);

        needs.update(10_000.0, &rates, 1.0);
        assert_eq!(needs.hunger, 0.0);
        assert_eq!(needs.thirst, 0.0);
        assert!(needs.is_dying());
    }

    #[test]
    fn test_multiplier_scales_decay() {
        let mut a = Needs::default();
        let mut b = Needs::default();
        let rates = NeedRates::default();
        a.update(4.0, &rates, 2.0);
        b.update(8.0, &rates, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_satisfy_uses_magnitude() {
        let mut needs = Needs::default();
        needs.hunger = 50.0;
        needs.satisfy(NeedType::Hunger, -10.0);
        assert_eq!(needs.hunger, 60.0);
        needs.satisfy(NeedType::Hunger, 500.0);
        assert_eq!(needs.hunger, 100.0);
    }

    #[test]
    fn test_thresholds() {
        let mut needs = Needs::default();
        needs.energy = 19.9;
        needs.social = 35.0;
        assert!(needs.is_critical(NeedType::Energy));
        assert!(!needs.is_critical(NeedType::Social));
        assert!(needs.is_low(NeedType::Social));
        assert!(!needs.is_low(NeedType::Comfort));
    }

    #[test]
    fn test_most_urgent_hunger() {
        let needs = Needs {
            hunger: 15.0,
            thirst: 80.0,
            energy: 80.0,
            social: 80.0,
            comfort: 80.0,
            safety: 80.0,
        };
        assert_eq!(needs.most_urgent(), NeedType::Hunger);
    }

    #[test]
    fn test_most_urgent_prefers_important_need_on_equal_values() {
        let needs = Needs {
            hunger: 30.0,
            thirst: 30.0,
            energy: 30.0,
            social: 30.0,
            comfort: 30.0,
            safety: 30.0,
        };
        assert_eq!(needs.most_urgent(), NeedType::Safety);

        // Weighting lets a more important need win despite a higher raw value
        let needs = Needs {
            hunger: 80.0,
            thirst: 80.0,
            energy: 80.0,
            social: 80.0,
            comfort: 60.0,
            safety: 70.0,
        };
        assert_eq!(needs.most_urgent(), NeedType::Safety);
    }

    #[test]
    fn test_stat_penalty_tiers_stack() {
        let mut needs = Needs::default();
        assert_eq!(needs.stat_penalty(), 1.0);
        needs.hunger = 25.0;
        assert!((needs.stat_penalty() - 0.85).abs() < 1e-6);
        needs.hunger = 5.0;
        assert!((needs.stat_penalty() - 0.85 * 0.7).abs() < 1e-6);
        needs.thirst = 20.0;
        assert!((needs.stat_penalty() - 0.85 * 0.7 * 0.85).abs() < 1e-6);
        // Social and comfort never penalize
        needs.social = 0.0;
        assert!((needs.stat_penalty() - 0.85 * 0.7 * 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_below_mask() {
        let mut needs = Needs::default();
        assert_eq!(needs.below_mask(30.0), 0);
        needs.thirst = 10.0;
        let mask = needs.below_mask(30.0);
        assert_ne!(mask & NeedType::Thirst.mask(), 0);
        assert_eq!(mask & NeedType::Hunger.mask(), 0);
    }
}
