//! Collision detection and scoring
//!
//! A brute-force pairwise pass over the renderable list. Each unordered pair
//! is visited once in list order; overlapping live pairs trade one point of
//! damage and may award score according to the rule table below.

use std::collections::BTreeMap;

use super::entity::{Entity, EntityId, EntityTag};
use super::pending::PendingQueues;
use super::strategy::StrategyTier;
use crate::Vector2D;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector2D,
    pub max: Vector2D,
}

impl Aabb {
    pub fn new(position: Vector2D, size: Vector2D) -> Self {
        Self {
            min: position,
            max: position + size,
        }
    }

    /// Strict overlap; boxes that only share an edge do not collide
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Score table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreRule {
    SlowProjectile,
    FastProjectile,
    SlowAlien,
    FastAlien,
}

impl ScoreRule {
    pub fn points(self) -> u32 {
        match self {
            ScoreRule::SlowProjectile => 1,
            ScoreRule::FastProjectile => 2,
            ScoreRule::SlowAlien => 3,
            ScoreRule::FastAlien => 4,
        }
    }

    /// Award for shooting down an enemy projectile of this tier
    pub fn for_projectile(tier: StrategyTier) -> Self {
        match tier {
            StrategyTier::Slow => ScoreRule::SlowProjectile,
            StrategyTier::Fast => ScoreRule::FastProjectile,
        }
    }

    /// Award for hitting an enemy that fires at this tier
    pub fn for_alien(tier: StrategyTier) -> Self {
        match tier {
            StrategyTier::Slow => ScoreRule::SlowAlien,
            StrategyTier::Fast => ScoreRule::FastAlien,
        }
    }
}

/// Pairs that never interact: an enemy with an enemy shot, or two enemy shots
pub fn is_excluded(a: EntityTag, b: EntityTag) -> bool {
    a.is_enemy_owned() && b.is_enemy_owned() && !(a == EntityTag::Enemy && b == EntityTag::Enemy)
}

/// Score awarded for a colliding pair, if any.
///
/// The projectile-vs-projectile rule is checked before the
/// enemy-vs-projectile rule and only the first match applies.
pub fn score_rule(a: &Entity, b: &Entity) -> Option<ScoreRule> {
    let find = |tag: EntityTag| {
        if a.tag() == tag {
            Some(a)
        } else if b.tag() == tag {
            Some(b)
        } else {
            None
        }
    };

    let player_shot = find(EntityTag::PlayerProjectile)?;
    let other = if std::ptr::eq(player_shot, a) { b } else { a };

    match other.tag() {
        EntityTag::EnemyProjectile => {
            let tier = other
                .strategy()
                .and_then(|s| s.tier())
                .unwrap_or(StrategyTier::Fast);
            Some(ScoreRule::for_projectile(tier))
        }
        EntityTag::Enemy => {
            let tier = other.enemy_tier().unwrap_or(StrategyTier::Fast);
            Some(ScoreRule::for_alien(tier))
        }
        _ => None,
    }
}

/// Result of one collision pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionOutcome {
    /// Pairs that traded damage
    pub hits: u32,
    /// Total score earned
    pub points: u32,
    /// Score rules matched, in pair order
    pub awards: Vec<ScoreRule>,
}

/// Run the pairwise pass over `renderables`.
///
/// Non-player entities brought to zero health are staged for removal.
pub fn resolve_collisions(
    entities: &mut BTreeMap<EntityId, Entity>,
    renderables: &[EntityId],
    pending: &mut PendingQueues,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();

    for (i, &a_id) in renderables.iter().enumerate() {
        for &b_id in &renderables[i + 1..] {
            let (Some(a), Some(b)) = (entities.get(&a_id), entities.get(&b_id)) else {
                continue;
            };
            if is_excluded(a.tag(), b.tag()) {
                continue;
            }
            if !(a.overlaps(b) && a.is_alive() && b.is_alive()) {
                continue;
            }
            let rule = score_rule(a, b);

            for id in [a_id, b_id] {
                if let Some(entity) = entities.get_mut(&id) {
                    entity.take_damage(1);
                    if !entity.is_alive() && entity.tag() != EntityTag::Player {
                        log::debug!("{} {:?} destroyed", entity.tag().as_str(), id);
                        pending.stage_removal(id);
                    }
                }
            }

            outcome.hits += 1;
            if let Some(rule) = rule {
                outcome.points += rule.points();
                outcome.awards.push(rule);
            }
        }
    }

    outcome
}
