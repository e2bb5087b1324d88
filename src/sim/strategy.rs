//! Projectile movement strategies
//!
//! A strategy is a pure rule: each frame it shifts a projectile's position
//! by a fixed velocity. The slow/fast tier doubles as the scoring class.

use serde::{Deserialize, Serialize};

use crate::Vector2D;
use crate::consts::*;

/// Speed class of an enemy and the projectiles it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyTier {
    #[serde(rename = "slow_straight")]
    Slow,
    #[serde(rename = "fast_straight")]
    Fast,
}

impl StrategyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTier::Slow => "slow_straight",
            StrategyTier::Fast => "fast_straight",
        }
    }

    /// Falling strategy used by projectiles fired at this tier
    pub fn strategy(self) -> MovementStrategy {
        match self {
            StrategyTier::Slow => MovementStrategy::Slow,
            StrategyTier::Fast => MovementStrategy::Fast,
        }
    }
}

/// Per-frame movement rule for a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementStrategy {
    /// Player shot, straight up
    Normal,
    /// Enemy shot, straight down at the slow rate
    Slow,
    /// Enemy shot, straight down at the fast rate
    Fast,
}

impl MovementStrategy {
    /// Displacement applied every frame
    #[inline]
    pub fn velocity(self) -> Vector2D {
        match self {
            MovementStrategy::Normal => Vector2D::new(0.0, -PLAYER_SHOT_SPEED),
            MovementStrategy::Slow => Vector2D::new(0.0, SLOW_PROJECTILE_SPEED),
            MovementStrategy::Fast => Vector2D::new(0.0, FAST_PROJECTILE_SPEED),
        }
    }

    /// Advance a projectile position by one frame
    #[inline]
    pub fn apply(self, position: &mut Vector2D) {
        *position += self.velocity();
    }

    /// Scoring tier, `None` for the player's own shot
    pub fn tier(self) -> Option<StrategyTier> {
        match self {
            MovementStrategy::Normal => None,
            MovementStrategy::Slow => Some(StrategyTier::Slow),
            MovementStrategy::Fast => Some(StrategyTier::Fast),
        }
    }
}
