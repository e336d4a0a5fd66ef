//! Distance score with a speed multiplier.

/// Speed at which the multiplier starts to climb above 1.
pub const SPEED_THRESHOLD: f32 = 3.0;
pub const MAX_MULTIPLIER: f32 = 5.0;
/// Fraction of the gap to 1.0 the multiplier closes per update below the
/// threshold.
pub const MULTIPLIER_DECAY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scoring {
    raw: f32,
    multiplier: f32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            raw: 0.0,
            multiplier: 1.0,
        }
    }
}

impl Scoring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `distance_delta` scaled by the multiplier for `speed`. The
    /// multiplier jumps straight to its target above the threshold and eases
    /// back toward 1 below it. `dt` is accepted for frame-rate independent
    /// variants; the decay is applied per call.
    pub fn update(&mut self, distance_delta: f32, speed: f32, _dt: f32) {
        if speed > SPEED_THRESHOLD {
            self.multiplier = (speed / SPEED_THRESHOLD).min(MAX_MULTIPLIER);
        } else {
            self.multiplier += (1.0 - self.multiplier) * MULTIPLIER_DECAY;
        }
        self.raw += distance_delta * self.multiplier;
    }

    /// Whole points earned.
    pub fn score(&self) -> u64 {
        self.raw.max(0.0) as u64
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn raw_score(&self) -> f32 {
        self.raw
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_saturates() {
        let mut scoring = Scoring::new();
        scoring.update(10.0, 100.0, 1.0 / 60.0);
        assert_eq!(scoring.multiplier(), 5.0);
        assert_eq!(scoring.raw_score(), 50.0);
        assert_eq!(scoring.score(), 50);
    }

    #[test]
    fn speed_ten_is_below_saturation() {
        let mut scoring = Scoring::new();
        scoring.update(10.0, 10.0, 1.0 / 60.0);
        assert!((scoring.multiplier() - 10.0 / 3.0).abs() < 1e-5);
        assert!((scoring.raw_score() - 100.0 / 3.0).abs() < 1e-4);
        assert_eq!(scoring.score(), 33);
    }

    #[test]
    fn multiplier_follows_speed_above_threshold() {
        let mut scoring = Scoring::new();
        scoring.update(1.0, 6.0, 0.016);
        assert_eq!(scoring.multiplier(), 2.0);
        assert_eq!(scoring.raw_score(), 2.0);
    }

    #[test]
    fn multiplier_decays_toward_one() {
        let mut scoring = Scoring::new();
        scoring.update(0.0, 15.0, 0.016);
        scoring.update(0.0, 1.0, 0.016);
        assert!((scoring.multiplier() - 4.6).abs() < 1e-5);
        for _ in 0..200 {
            scoring.update(0.0, 1.0, 0.016);
        }
        assert!((scoring.multiplier() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn slow_rolling_scores_at_base_rate() {
        let mut scoring = Scoring::new();
        for _ in 0..4 {
            scoring.update(0.5, 2.0, 0.016);
        }
        assert_eq!(scoring.multiplier(), 1.0);
        assert_eq!(scoring.score(), 2);
    }

    #[test]
    fn score_truncates() {
        let mut scoring = Scoring::new();
        scoring.update(2.9, 0.0, 0.016);
        assert_eq!(scoring.score(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut scoring = Scoring::new();
        scoring.update(10.0, 30.0, 0.016);
        scoring.reset();
        assert_eq!(scoring, Scoring::default());
        assert_eq!(scoring.multiplier(), 1.0);
    }
}
