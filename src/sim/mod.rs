//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - One `update()` call advances exactly one frame
//! - Seeded RNG only
//! - Stable iteration order (insertion order of the id lists)
//! - Structural changes only through the pending queues

pub mod collision;
pub mod engine;
pub mod entity;
pub mod pending;
pub mod strategy;

pub use collision::{Aabb, CollisionOutcome, ScoreRule, is_excluded, resolve_collisions, score_rule};
pub use engine::GameEngine;
pub use entity::{
    BunkerState, EnemyState, Entity, EntityId, EntityKind, EntityTag, FrameContext, IdAllocator,
    Layer, PlayerState,
};
pub use pending::PendingQueues;
pub use strategy::{MovementStrategy, StrategyTier};
