//! Trending score calculation.
//!
//! The score has three parts:
//!
//! 1. base popularity, log-compressed: `ln(2·likes + 3·replies + 1)`
//! 2. power-law time decay: `(age_hours + 2)^1.5`
//! 3. a velocity boost from engagement inside a short trailing window:
//!    `0.5 · (3·recent_likes + 4·recent_replies)`
//!
//! `score = (1) / (2) + (3)`. The constants live in [`TrendingWeights`] and
//! may be tuned; the defaults reproduce the formula above exactly.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Everything the score depends on. All counts are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
  pub likes:          u64,
  pub replies:        u64,
  pub recent_likes:   u64,
  pub recent_replies: u64,
  /// Hours since creation; negative values are treated as zero.
  pub age_hours:      f64,
}

/// Tunable constants of the trending formula.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendingWeights {
  pub like_weight:         f64,
  pub reply_weight:        f64,
  /// Added to the age before decay so brand-new items do not divide by ~0.
  pub decay_offset_hours:  f64,
  pub decay_exponent:      f64,
  pub recent_like_weight:  f64,
  pub recent_reply_weight: f64,
  pub velocity_factor:     f64,
}

impl Default for TrendingWeights {
  fn default() -> Self {
    Self {
      like_weight:         2.0,
      reply_weight:        3.0,
      decay_offset_hours:  2.0,
      decay_exponent:      1.5,
      recent_like_weight:  3.0,
      recent_reply_weight: 4.0,
      velocity_factor:     0.5,
    }
  }
}

impl TrendingWeights {
  pub fn score(&self, inputs: &ScoreInputs) -> f64 {
    let engagement = (self.like_weight * inputs.likes as f64
      + self.reply_weight * inputs.replies as f64
      + 1.0)
      .ln();
    let age = inputs.age_hours.max(0.0);
    let decay_base = (age + self.decay_offset_hours).powf(self.decay_exponent);
    let base_score = engagement / decay_base;

    let velocity = self.recent_like_weight * inputs.recent_likes as f64
      + self.recent_reply_weight * inputs.recent_replies as f64;

    base_score + self.velocity_factor * velocity
  }
}

/// Score with the default weights.
pub fn trending_score(inputs: &ScoreInputs) -> f64 {
  TrendingWeights::default().score(inputs)
}

/// Fractional hours elapsed from `created_at` to `now`, floored at zero.
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  let micros = (now - created_at).num_microseconds().unwrap_or(i64::MAX);
  (micros as f64 / 3_600_000_000.0).max(0.0)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn inputs(likes: u64, replies: u64, age_hours: f64) -> ScoreInputs {
    ScoreInputs { likes, replies, age_hours, ..Default::default() }
  }

  #[test]
  fn matches_reference_formula() {
    let i = ScoreInputs {
      likes:          10,
      replies:        4,
      recent_likes:   2,
      recent_replies: 1,
      age_hours:      5.0,
    };
    let expected = (2.0 * 10.0 + 3.0 * 4.0 + 1.0_f64).ln() / 7.0_f64.powf(1.5)
      + 0.5 * (3.0 * 2.0 + 4.0 * 1.0);
    assert_eq!(trending_score(&i), expected);
  }

  #[test]
  fn fresh_item_with_no_engagement_scores_zero() {
    assert_eq!(trending_score(&inputs(0, 0, 0.0)), 0.0);
  }

  #[test]
  fn more_likes_rank_higher() {
    assert!(trending_score(&inputs(10, 0, 1.0)) > trending_score(&inputs(5, 0, 1.0)));
  }

  #[test]
  fn more_replies_rank_higher() {
    assert!(trending_score(&inputs(0, 3, 1.0)) > trending_score(&inputs(0, 2, 1.0)));
  }

  #[test]
  fn older_items_rank_lower() {
    assert!(trending_score(&inputs(10, 0, 1.0)) > trending_score(&inputs(10, 0, 100.0)));
  }

  #[test]
  fn replies_outweigh_likes() {
    assert!(trending_score(&inputs(0, 1, 1.0)) > trending_score(&inputs(1, 0, 1.0)));

    let recent_reply = ScoreInputs { recent_replies: 1, ..inputs(0, 0, 1.0) };
    let recent_like  = ScoreInputs { recent_likes: 1, ..inputs(0, 0, 1.0) };
    assert!(trending_score(&recent_reply) > trending_score(&recent_like));
  }

  #[test]
  fn monotonic_over_a_grid() {
    let w = TrendingWeights::default();
    for likes in 0..20 {
      for age in [0.0, 0.5, 3.0, 24.0, 240.0] {
        let lo = inputs(likes, 1, age);
        let hi = inputs(likes + 1, 1, age);
        assert!(w.score(&hi) >= w.score(&lo));

        let older = inputs(likes, 1, age + 1.0);
        assert!(w.score(&older) <= w.score(&lo));

        let boosted = ScoreInputs { recent_likes: 1, ..lo };
        assert!(w.score(&boosted) >= w.score(&lo));
      }
    }
  }

  #[test]
  fn negative_age_is_treated_as_zero() {
    assert_eq!(
      trending_score(&inputs(3, 1, -5.0)),
      trending_score(&inputs(3, 1, 0.0)),
    );
  }

  #[test]
  fn velocity_dominates_for_recent_bursts() {
    let old_popular = inputs(1000, 100, 48.0);
    let burst = ScoreInputs { recent_likes: 5, ..inputs(5, 0, 1.0) };
    assert!(trending_score(&burst) > trending_score(&old_popular));
  }

  #[test]
  fn age_hours_floors_at_zero() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    assert_eq!(age_hours(t0, t0 - Duration::hours(1)), 0.0);
    assert_eq!(age_hours(t0, t0 + Duration::minutes(90)), 1.5);
  }
}
