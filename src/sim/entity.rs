//! Simulated entities
//!
//! Every object on the playfield shares one representation: position,
//! health and footprint, plus an `EntityKind` carrying the variant-specific
//! state. Collision exclusion and scoring key off `EntityTag`.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::pending::PendingQueues;
use super::strategy::{MovementStrategy, StrategyTier};
use crate::Vector2D;
use crate::consts::*;

/// Stable handle into the engine's entity storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out monotonically increasing entity ids
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Type tag used by the collision and scoring rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    Player,
    Enemy,
    Bunker,
    PlayerProjectile,
    EnemyProjectile,
}

impl EntityTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityTag::Player => "Player",
            EntityTag::Enemy => "Enemy",
            EntityTag::Bunker => "Bunker",
            EntityTag::PlayerProjectile => "PlayerProjectile",
            EntityTag::EnemyProjectile => "EnemyProjectile",
        }
    }

    /// Enemies and their shots; enemy shots pass through this side
    pub fn is_enemy_owned(&self) -> bool {
        matches!(self, EntityTag::Enemy | EntityTag::EnemyProjectile)
    }
}

/// Draw layer; only foreground entities are kept inside the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layer {
    Background,
    #[default]
    Foreground,
}

/// Bunker damage stage, derived from remaining lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BunkerState {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Horizontal pixels per frame while a direction is held
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    /// Tier of the projectiles this enemy fires (also its score class)
    pub tier: StrategyTier,
    pub x_vel: f64,
    /// Projectiles fired by this enemy that are still live
    pub projectiles: Vec<EntityId>,
}

/// Variant-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Player(PlayerState),
    Enemy(EnemyState),
    Bunker,
    PlayerProjectile {
        strategy: MovementStrategy,
    },
    EnemyProjectile {
        strategy: MovementStrategy,
        owner: EntityId,
    },
}

/// A simulated, renderable object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Top-left corner
    pub position: Vector2D,
    /// Hit points (lives for players and bunkers); dead at 0
    pub health: i32,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layer: Layer,
}

impl Entity {
    pub fn player(id: EntityId, position: Vector2D, lives: i32, speed: f64) -> Self {
        Self {
            id,
            kind: EntityKind::Player(PlayerState { speed }),
            position,
            health: lives,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            layer: Layer::Foreground,
        }
    }

    pub fn enemy(id: EntityId, position: Vector2D, tier: StrategyTier) -> Self {
        Self {
            id,
            kind: EntityKind::Enemy(EnemyState {
                tier,
                x_vel: -ENEMY_SPEED,
                projectiles: Vec::new(),
            }),
            position,
            health: ENEMY_HEALTH,
            width: ENEMY_WIDTH,
            height: ENEMY_HEIGHT,
            layer: Layer::Foreground,
        }
    }

    pub fn bunker(id: EntityId, position: Vector2D, size: Vector2D) -> Self {
        Self {
            id,
            kind: EntityKind::Bunker,
            position,
            health: BUNKER_LIVES,
            width: size.x,
            height: size.y,
            layer: Layer::Foreground,
        }
    }

    pub fn player_projectile(id: EntityId, position: Vector2D) -> Self {
        Self::projectile(
            id,
            position,
            EntityKind::PlayerProjectile {
                strategy: MovementStrategy::Normal,
            },
        )
    }

    pub fn enemy_projectile(
        id: EntityId,
        position: Vector2D,
        tier: StrategyTier,
        owner: EntityId,
    ) -> Self {
        Self::projectile(
            id,
            position,
            EntityKind::EnemyProjectile {
                strategy: tier.strategy(),
                owner,
            },
        )
    }

    fn projectile(id: EntityId, position: Vector2D, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            position,
            health: PROJECTILE_HEALTH,
            width: PROJECTILE_WIDTH,
            height: PROJECTILE_HEIGHT,
            layer: Layer::Foreground,
        }
    }

    /// Independent copy of this entity under a fresh id
    pub fn with_id(&self, id: EntityId) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn tag(&self) -> EntityTag {
        match self.kind {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Enemy(_) => EntityTag::Enemy,
            EntityKind::Bunker => EntityTag::Bunker,
            EntityKind::PlayerProjectile { .. } => EntityTag::PlayerProjectile,
            EntityKind::EnemyProjectile { .. } => EntityTag::EnemyProjectile,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    pub fn kill(&mut self) {
        self.health = 0;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.position, Vector2D::new(self.width, self.height))
    }

    pub fn overlaps(&self, other: &Entity) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    /// Movement strategy of a projectile
    pub fn strategy(&self) -> Option<MovementStrategy> {
        match self.kind {
            EntityKind::PlayerProjectile { strategy } => Some(strategy),
            EntityKind::EnemyProjectile { strategy, .. } => Some(strategy),
            _ => None,
        }
    }

    /// Tier of the projectiles an enemy fires
    pub fn enemy_tier(&self) -> Option<StrategyTier> {
        match &self.kind {
            EntityKind::Enemy(state) => Some(state.tier),
            _ => None,
        }
    }

    /// Live projectile ids an enemy is tracking
    pub fn enemy_projectiles(&self) -> &[EntityId] {
        match &self.kind {
            EntityKind::Enemy(state) => &state.projectiles,
            _ => &[],
        }
    }

    pub fn projectile_owner(&self) -> Option<EntityId> {
        match self.kind {
            EntityKind::EnemyProjectile { owner, .. } => Some(owner),
            _ => None,
        }
    }

    pub fn bunker_state(&self) -> Option<BunkerState> {
        if self.tag() != EntityTag::Bunker {
            return None;
        }
        Some(match self.health {
            h if h >= 3 => BunkerState::Green,
            2 => BunkerState::Yellow,
            _ => BunkerState::Red,
        })
    }

    pub fn move_left(&mut self) {
        if let EntityKind::Player(state) = &self.kind {
            self.position.x -= state.speed;
        }
    }

    pub fn move_right(&mut self) {
        if let EntityKind::Player(state) = &self.kind {
            self.position.x += state.speed;
        }
    }

    /// Player shot spawned at the top centre of the player sprite
    pub fn shoot(&self, id: EntityId) -> Option<Entity> {
        if self.tag() != EntityTag::Player {
            return None;
        }
        let origin = Vector2D::new(
            self.position.x + self.width / 2.0 - PROJECTILE_WIDTH / 2.0,
            self.position.y - PROJECTILE_HEIGHT,
        );
        Some(Entity::player_projectile(id, origin))
    }

    /// Per-frame behaviour of a game object
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) {
        match self.tag() {
            EntityTag::Player | EntityTag::Bunker => {}
            EntityTag::Enemy => self.update_enemy(ctx),
            EntityTag::PlayerProjectile => {
                if let Some(strategy) = self.strategy() {
                    strategy.apply(&mut self.position);
                }
                if self.position.y <= self.height {
                    self.take_damage(1);
                }
            }
            EntityTag::EnemyProjectile => {
                if let Some(strategy) = self.strategy() {
                    strategy.apply(&mut self.position);
                }
                if self.position.y >= ctx.height - self.height {
                    self.take_damage(1);
                }
            }
        }

        if !self.is_alive() && self.tag() != EntityTag::Player {
            ctx.pending.stage_removal(self.id);
        }
    }

    fn update_enemy(&mut self, ctx: &mut FrameContext<'_>) {
        let alive = self.is_alive();
        let EntityKind::Enemy(state) = &mut self.kind else {
            return;
        };

        if alive && state.projectiles.len() < ENEMY_MAX_PROJECTILES && ctx.roll_fire() {
            let id = ctx.ids.next_id();
            let origin = Vector2D::new(
                self.position.x + self.width / 2.0 - PROJECTILE_WIDTH / 2.0,
                self.position.y + self.height + 2.0,
            );
            ctx.spawn(Entity::enemy_projectile(id, origin, state.tier, self.id));
            state.projectiles.push(id);
        }

        let at_left = self.position.x <= self.width && state.x_vel < 0.0;
        let at_right = self.position.x >= ctx.width - self.width - 1.0 && state.x_vel > 0.0;
        if at_left || at_right {
            self.position.y += self.height;
            state.x_vel = -state.x_vel;
        }
        self.position.x += state.x_vel;

        if alive && self.position.y + self.height >= ctx.player_y {
            ctx.invaded = true;
        }
    }
}

/// Engine services available to entities during their update
pub struct FrameContext<'a> {
    pub width: f64,
    pub height: f64,
    /// Top edge of the player; enemies reaching it end the game
    pub player_y: f64,
    /// One-in-N enemy fire chance per frame (0 disables firing)
    pub enemy_fire_odds: u32,
    rng: &'a mut Pcg32,
    ids: &'a mut IdAllocator,
    pending: &'a mut PendingQueues,
    spawned: Vec<Entity>,
    invaded: bool,
}

impl<'a> FrameContext<'a> {
    pub fn new(
        width: f64,
        height: f64,
        player_y: f64,
        enemy_fire_odds: u32,
        rng: &'a mut Pcg32,
        ids: &'a mut IdAllocator,
        pending: &'a mut PendingQueues,
    ) -> Self {
        Self {
            width,
            height,
            player_y,
            enemy_fire_odds,
            rng,
            ids,
            pending,
            spawned: Vec::new(),
            invaded: false,
        }
    }

    fn roll_fire(&mut self) -> bool {
        self.enemy_fire_odds > 0 && self.rng.random_ratio(1, self.enemy_fire_odds)
    }

    /// Stage a new object; the engine stores it once the update pass ends
    fn spawn(&mut self, entity: Entity) {
        self.pending.stage_spawn(entity.id);
        self.spawned.push(entity);
    }

    /// Whether an enemy reached the player row this frame
    pub fn invaded(&self) -> bool {
        self.invaded
    }

    /// Consume the context, yielding the entities spawned during the pass
    pub fn into_spawned(self) -> Vec<Entity> {
        self.spawned
    }
}
