//! Simulation engine
//!
//! Owns every live entity and advances the game one frame per `update()`.
//! Frame order: player movement, object updates, collision pass, observer
//! broadcast, playfield clamp. Structural changes made during a frame are
//! staged in `PendingQueues` and reconciled by the driver through
//! `apply_pending()` before the next frame.

use std::collections::{BTreeMap, HashSet};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{ScoreRule, resolve_collisions};
use super::entity::{Entity, EntityId, EntityKind, EntityTag, FrameContext, IdAllocator, Layer};
use super::pending::PendingQueues;
use super::strategy::StrategyTier;
use crate::config::{Difficulty, GameConfig};
use crate::consts::*;
use crate::error::ConfigResult;
use crate::memento::{EnemyRecord, GameEngineCaretaker, GameEngineMemento};
use crate::observer::{Observer, ObserverId, ObserverList, Subject};

pub struct GameEngine {
    width: f64,
    height: f64,
    enemy_fire_odds: u32,
    rng: Pcg32,
    ids: IdAllocator,
    /// Storage for every entity referenced by a list, queue or the player handle
    entities: BTreeMap<EntityId, Entity>,
    /// Objects updated each frame (everything except the player)
    game_objects: Vec<EntityId>,
    /// Objects drawn and collided each frame, in pair-evaluation order
    renderables: Vec<EntityId>,
    pending: PendingQueues,
    player: EntityId,
    left: bool,
    right: bool,
    /// Frames since the last player shot
    shot_cooldown: u32,
    /// Frames elapsed while the player was alive
    timer: u32,
    points: u32,
    prev_shot: Option<EntityId>,
    observers: ObserverList,
    caretaker: GameEngineCaretaker,
}

impl GameEngine {
    /// Build the starting object list from a level layout
    pub fn new(config: &GameConfig) -> Self {
        let mut ids = IdAllocator::new();
        let mut entities = BTreeMap::new();
        let mut game_objects = Vec::new();
        let mut renderables = Vec::new();

        let player_id = ids.next_id();
        entities.insert(
            player_id,
            Entity::player(
                player_id,
                config.player.position.to_vector(),
                config.player.lives,
                config.player.speed,
            ),
        );
        renderables.push(player_id);

        for bunker in &config.bunkers {
            let id = ids.next_id();
            entities.insert(
                id,
                Entity::bunker(id, bunker.position.to_vector(), bunker.size.to_vector()),
            );
            game_objects.push(id);
            renderables.push(id);
        }

        for enemy in &config.enemies {
            let id = ids.next_id();
            entities.insert(
                id,
                Entity::enemy(id, enemy.position.to_vector(), enemy.projectile),
            );
            game_objects.push(id);
            renderables.push(id);
        }

        log::info!(
            "Engine ready: {}x{} playfield, {} bunkers, {} enemies",
            config.width(),
            config.height(),
            config.bunkers.len(),
            config.enemies.len()
        );

        Self {
            width: config.width(),
            height: config.height(),
            enemy_fire_odds: config.game.enemy_fire_odds,
            rng: Pcg32::seed_from_u64(config.game.seed),
            ids,
            entities,
            game_objects,
            renderables,
            pending: PendingQueues::new(),
            player: player_id,
            left: false,
            right: false,
            shot_cooldown: 0,
            timer: 0,
            points: 0,
            prev_shot: None,
            observers: ObserverList::default(),
            caretaker: GameEngineCaretaker::new(),
        }
    }

    /// Build an engine from a difficulty preset's built-in layout
    pub fn from_difficulty(difficulty: Difficulty) -> ConfigResult<Self> {
        log::info!("Loading {} layout", difficulty.as_str());
        Ok(Self::new(&difficulty.config()?))
    }

    /// Advance the simulation by one frame
    pub fn update(&mut self) {
        self.shot_cooldown = self.shot_cooldown.saturating_add(1);

        if self.player_alive() {
            self.timer += 1;
            self.move_player();
            self.update_objects();
        }

        let was_alive = self.player_alive();
        let outcome = resolve_collisions(&mut self.entities, &self.renderables, &mut self.pending);
        self.points += outcome.points;
        if was_alive && !self.player_alive() {
            log::info!("Player destroyed at frame {}", self.timer);
        }

        self.notify_observers();
        self.clamp_to_playfield();
    }

    fn move_player(&mut self) {
        let (left, right) = (self.left, self.right);
        if let Some(player) = self.entities.get_mut(&self.player) {
            if left {
                player.move_left();
            }
            if right {
                player.move_right();
            }
        }
    }

    fn update_objects(&mut self) {
        let player_y = self.player().position.y;
        let mut ctx = FrameContext::new(
            self.width,
            self.height,
            player_y,
            self.enemy_fire_odds,
            &mut self.rng,
            &mut self.ids,
            &mut self.pending,
        );

        for id in &self.game_objects {
            if let Some(entity) = self.entities.get_mut(id) {
                if entity.is_alive() {
                    entity.update(&mut ctx);
                }
            }
        }

        let invaded = ctx.invaded();
        for entity in ctx.into_spawned() {
            self.entities.insert(entity.id, entity);
        }

        if invaded {
            log::info!("Invaders reached the player row");
            if let Some(player) = self.entities.get_mut(&self.player) {
                player.kill();
            }
        }
    }

    /// Keep foreground entities inside the playfield, one pixel in from each edge
    fn clamp_to_playfield(&mut self) {
        let (width, height) = (self.width, self.height);
        for id in &self.renderables {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            if entity.layer != Layer::Foreground {
                continue;
            }

            if entity.position.x + entity.width >= width {
                entity.position.x = width - CLAMP_INSET - entity.width;
            }
            if entity.position.x <= 0.0 {
                entity.position.x = CLAMP_INSET;
            }
            if entity.position.y + entity.height >= height {
                entity.position.y = height - CLAMP_INSET - entity.height;
            }
            if entity.position.y <= 0.0 {
                entity.position.y = CLAMP_INSET;
            }
        }
    }

    /// Reconcile the staged additions and removals (driver calls this after each frame)
    pub fn apply_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let removed_objects: HashSet<EntityId> = pending.remove_objects().iter().copied().collect();
        let removed_renderables: HashSet<EntityId> =
            pending.remove_renderables().iter().copied().collect();

        self.game_objects.retain(|id| !removed_objects.contains(id));
        self.game_objects.extend(
            pending
                .add_objects()
                .iter()
                .filter(|id| !removed_objects.contains(id)),
        );
        self.renderables.retain(|id| !removed_renderables.contains(id));
        self.renderables.extend(
            pending
                .add_renderables()
                .iter()
                .filter(|id| !removed_renderables.contains(id)),
        );

        let mut live: HashSet<EntityId> = self.game_objects.iter().copied().collect();
        live.extend(self.renderables.iter().copied());
        live.insert(self.player);

        self.entities.retain(|id, _| live.contains(id));
        for entity in self.entities.values_mut() {
            if let EntityKind::Enemy(state) = &mut entity.kind {
                state.projectiles.retain(|id| live.contains(id));
            }
        }
    }

    pub fn left_pressed(&mut self) {
        self.left = true;
    }

    pub fn left_released(&mut self) {
        self.left = false;
    }

    pub fn right_pressed(&mut self) {
        self.right = true;
    }

    pub fn right_released(&mut self) {
        self.right = false;
    }

    /// Fire a player shot if the cooldown has elapsed and the player is alive
    pub fn shoot_pressed(&mut self) -> bool {
        if self.shot_cooldown <= SHOT_COOLDOWN_FRAMES || !self.player_alive() {
            return false;
        }
        let id = self.ids.next_id();
        let Some(shot) = self.player().shoot(id) else {
            return false;
        };

        self.entities.insert(id, shot);
        self.game_objects.push(id);
        self.renderables.push(id);
        self.prev_shot = Some(id);
        self.shot_cooldown = 0;
        log::debug!("Player fired shot {:?}", id);
        true
    }

    /// Kill everything and stage it for removal (difficulty switch teardown)
    pub fn clear_all(&mut self) {
        // Shots spawned this frame are only in the pending adds until the purge
        let current: Vec<EntityId> = self
            .renderables
            .iter()
            .chain(&self.game_objects)
            .chain(self.pending.add_renderables())
            .copied()
            .collect();

        for id in current {
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.kill();
            }
            self.pending.stage_removal(id);
        }
        log::info!("Cleared {} renderables", self.renderables.len());
        self.notify_observers();
    }

    /// Remove every live slow enemy projectile, scoring each one
    pub fn delete_slow_projectile(&mut self) -> usize {
        self.delete_projectiles(StrategyTier::Slow)
    }

    /// Remove every live fast enemy projectile, scoring each one
    pub fn delete_fast_projectile(&mut self) -> usize {
        self.delete_projectiles(StrategyTier::Fast)
    }

    fn delete_projectiles(&mut self, tier: StrategyTier) -> usize {
        let mut count = 0u32;
        for id in &self.renderables {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let matches_tier = entity.strategy().and_then(|s| s.tier()) == Some(tier);
            if entity.tag() == EntityTag::EnemyProjectile && matches_tier && entity.is_alive() {
                entity.kill();
                self.pending.stage_removal(*id);
                count += 1;
            }
        }

        self.points += count * ScoreRule::for_projectile(tier).points();
        log::debug!("Deleted {} {} projectiles", count, tier.as_str());
        self.notify_observers();
        count as usize
    }

    /// Capture a deep-copied snapshot of the current state
    pub fn save(&self) -> GameEngineMemento {
        let mut enemies = Vec::new();
        let mut bunkers = Vec::new();

        for entity in self.renderables() {
            if !entity.is_alive() {
                continue;
            }
            match entity.tag() {
                EntityTag::Enemy => {
                    let projectiles = entity
                        .enemy_projectiles()
                        .iter()
                        .filter_map(|id| self.entities.get(id))
                        .filter(|p| p.is_alive())
                        .cloned()
                        .collect();
                    enemies.push(EnemyRecord::new(entity.clone(), projectiles));
                }
                EntityTag::Bunker => bunkers.push(entity.clone()),
                _ => {}
            }
        }

        GameEngineMemento::new(
            self.points,
            self.timer,
            enemies,
            bunkers,
            self.prev_shot,
            self.player().clone(),
        )
    }

    /// Replace enemies, bunkers and the player with fresh copies from `memento`
    pub fn restore(&mut self, memento: &GameEngineMemento) {
        let current: Vec<EntityId> = self
            .renderables
            .iter()
            .chain(&self.game_objects)
            .chain(self.pending.add_renderables())
            .copied()
            .collect();

        for id in current {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            let stale = matches!(
                entity.tag(),
                EntityTag::Enemy | EntityTag::EnemyProjectile | EntityTag::Bunker | EntityTag::Player
            ) || memento.shot() == Some(id);
            if stale {
                entity.kill();
                self.pending.stage_removal(id);
            }
        }

        for record in memento.enemies() {
            let enemy_id = self.ids.next_id();
            let mut enemy = record.enemy().with_id(enemy_id);

            let mut projectile_ids = Vec::with_capacity(record.projectiles().len());
            for projectile in record.projectiles() {
                let id = self.ids.next_id();
                let mut copy = projectile.with_id(id);
                if let EntityKind::EnemyProjectile { owner, .. } = &mut copy.kind {
                    *owner = enemy_id;
                }
                self.insert_object(copy);
                projectile_ids.push(id);
            }

            if let EntityKind::Enemy(state) = &mut enemy.kind {
                state.projectiles = projectile_ids;
            }
            self.insert_object(enemy);
        }

        for bunker in memento.bunkers() {
            let copy = bunker.with_id(self.ids.next_id());
            self.insert_object(copy);
        }

        let player_id = self.ids.next_id();
        self.entities.insert(player_id, memento.player().with_id(player_id));
        self.renderables.push(player_id);
        self.player = player_id;

        self.points = memento.score();
        self.timer = memento.timer();
        log::info!(
            "Restored snapshot: score {}, timer {}, {} enemies, {} bunkers",
            self.points,
            self.timer,
            memento.enemies().len(),
            memento.bunkers().len()
        );
        self.notify_observers();
    }

    fn insert_object(&mut self, entity: Entity) {
        let id = entity.id;
        self.entities.insert(id, entity);
        self.game_objects.push(id);
        self.renderables.push(id);
    }

    /// Save into the single snapshot slot, replacing any earlier snapshot
    pub fn save_snapshot(&mut self) {
        let memento = self.save();
        log::info!("Snapshot saved at frame {}", memento.timer());
        self.caretaker.store(memento);
    }

    /// Restore from the snapshot slot; returns false when nothing was saved
    pub fn revert_snapshot(&mut self) -> bool {
        let Some(memento) = self.caretaker.latest().cloned() else {
            log::warn!("No previous state to revert to");
            return false;
        };
        self.restore(&memento);
        true
    }

    pub fn has_snapshot(&self) -> bool {
        !self.caretaker.is_empty()
    }

    pub fn attach(&mut self, observer: Box<dyn Observer>) -> ObserverId {
        let id = self.observers.attach(observer);
        log::debug!("Observer attached ({} total)", self.observers.len());
        id
    }

    pub fn detach(&mut self, id: ObserverId) -> Option<Box<dyn Observer>> {
        self.observers.detach(id)
    }

    pub fn notify_observers(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        observers.notify(&*self);
        self.observers = observers;
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The player entity; always present in storage
    pub fn player(&self) -> &Entity {
        &self.entities[&self.player]
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player_alive(&self) -> bool {
        self.entities
            .get(&self.player)
            .is_some_and(|player| player.is_alive())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn renderable_ids(&self) -> &[EntityId] {
        &self.renderables
    }

    pub fn game_object_ids(&self) -> &[EntityId] {
        &self.game_objects
    }

    pub fn renderables(&self) -> impl Iterator<Item = &Entity> {
        self.renderables.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn game_objects(&self) -> impl Iterator<Item = &Entity> {
        self.game_objects.iter().filter_map(|id| self.entities.get(id))
    }

    /// Renderables carrying `tag`
    pub fn count(&self, tag: EntityTag) -> usize {
        self.renderables().filter(|e| e.tag() == tag).count()
    }

    pub fn pending(&self) -> &PendingQueues {
        &self.pending
    }

    pub fn shot_cooldown(&self) -> u32 {
        self.shot_cooldown
    }

    pub fn last_shot(&self) -> Option<EntityId> {
        self.prev_shot
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn lives(&self) -> i32 {
        self.entities.get(&self.player).map_or(0, |player| player.health)
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }
}

impl Subject for GameEngine {
    fn points(&self) -> u32 {
        GameEngine::points(self)
    }

    fn lives(&self) -> i32 {
        GameEngine::lives(self)
    }

    fn timer(&self) -> u32 {
        GameEngine::timer(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::Vector2D;
    use crate::config::{BunkerInfo, Coord, EnemyInfo, GameInfo, PlayerInfo};
    use crate::observer::Scoreboard;

    fn config(enemies: &[(f64, f64, StrategyTier)], bunkers: &[(f64, f64)], fire_odds: u32) -> GameConfig {
        GameConfig {
            game: GameInfo {
                size: Coord::new(640.0, 400.0),
                seed: 11,
                enemy_fire_odds: fire_odds,
            },
            player: PlayerInfo {
                colour: "green".into(),
                speed: 1.0,
                lives: 3,
                position: Coord::new(300.0, 360.0),
            },
            bunkers: bunkers
                .iter()
                .map(|&(x, y)| BunkerInfo {
                    position: Coord::new(x, y),
                    size: Coord::new(50.0, 20.0),
                })
                .collect(),
            enemies: enemies
                .iter()
                .map(|&(x, y, projectile)| EnemyInfo {
                    position: Coord::new(x, y),
                    projectile,
                })
                .collect(),
        }
    }

    fn step(engine: &mut GameEngine, frames: u32) {
        for _ in 0..frames {
            engine.update();
            engine.apply_pending();
        }
    }

    fn first(engine: &GameEngine, tag: EntityTag) -> EntityId {
        engine
            .renderables()
            .find(|e| e.tag() == tag)
            .map(|e| e.id)
            .unwrap()
    }

    #[test]
    fn test_construction_from_layout() {
        let engine = GameEngine::new(&config(
            &[(100.0, 40.0, StrategyTier::Slow), (160.0, 40.0, StrategyTier::Fast)],
            &[(80.0, 300.0)],
            0,
        ));
        assert_eq!(engine.count(EntityTag::Player), 1);
        assert_eq!(engine.count(EntityTag::Enemy), 2);
        assert_eq!(engine.count(EntityTag::Bunker), 1);
        // The player is drawn but not part of the object update list
        assert_eq!(engine.game_object_ids().len(), 3);
        assert_eq!(engine.renderable_ids().len(), 4);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.points(), 0);
        assert_eq!(engine.timer(), 0);
    }

    #[test]
    fn test_builtin_difficulty_engine() {
        let engine = GameEngine::from_difficulty(Difficulty::Medium).unwrap();
        assert_eq!(engine.width(), 640.0);
        assert_eq!(engine.height(), 400.0);
        assert!(engine.count(EntityTag::Enemy) > 0);
    }

    #[test]
    fn test_shoot_refused_before_cooldown() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        assert!(!engine.shoot_pressed());
        assert_eq!(engine.count(EntityTag::PlayerProjectile), 0);
        assert_eq!(engine.game_object_ids().len(), 0);

        step(&mut engine, SHOT_COOLDOWN_FRAMES);
        assert!(!engine.shoot_pressed());
    }

    #[test]
    fn test_shoot_after_cooldown_adds_one_projectile() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        step(&mut engine, SHOT_COOLDOWN_FRAMES + 1);

        let objects = engine.game_object_ids().len();
        let renderables = engine.renderable_ids().len();
        assert!(engine.shoot_pressed());
        assert_eq!(engine.game_object_ids().len(), objects + 1);
        assert_eq!(engine.renderable_ids().len(), renderables + 1);
        assert_eq!(engine.count(EntityTag::PlayerProjectile), 1);
        assert_eq!(engine.shot_cooldown(), 0);
        assert!(engine.last_shot().is_some());

        // Cooldown resets after a successful shot
        assert!(!engine.shoot_pressed());
        assert_eq!(engine.count(EntityTag::PlayerProjectile), 1);
    }

    #[test]
    fn test_dead_player_cannot_shoot_and_freezes_clock() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        step(&mut engine, 10);
        let player = engine.player_id();
        engine.entity_mut(player).unwrap().kill();

        step(&mut engine, 60);
        assert!(!engine.shoot_pressed());
        assert_eq!(engine.timer(), 10);
        assert_eq!(engine.lives(), 0);
        // A dead player stays on screen
        assert_eq!(engine.count(EntityTag::Player), 1);
    }

    #[test]
    fn test_movement_intents() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        let start = engine.player().position.x;

        engine.left_pressed();
        engine.left_pressed();
        step(&mut engine, 5);
        assert_eq!(engine.player().position.x, start - 5.0);

        engine.left_released();
        engine.right_pressed();
        step(&mut engine, 3);
        assert_eq!(engine.player().position.x, start - 2.0);

        engine.right_released();
        step(&mut engine, 3);
        assert_eq!(engine.player().position.x, start - 2.0);
    }

    #[test]
    fn test_clamp_right_and_left_edges() {
        let mut engine = GameEngine::new(&config(&[], &[(100.0, 300.0)], 0));
        let player = engine.player_id();
        let bunker = first(&engine, EntityTag::Bunker);

        engine.entity_mut(player).unwrap().position.x = 630.0;
        engine.update();
        let p = engine.player();
        assert_eq!(p.position.x + p.width, 640.0 - 1.0);
        // Already inside: never repositioned
        assert_eq!(engine.entity(bunker).unwrap().position, Vector2D::new(100.0, 300.0));

        engine.entity_mut(player).unwrap().position.x = -4.0;
        engine.update();
        assert_eq!(engine.player().position.x, CLAMP_INSET);
    }

    #[test]
    fn test_clamp_bottom_edge() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        let player = engine.player_id();
        engine.entity_mut(player).unwrap().position.y = 395.0;
        engine.update();
        let p = engine.player();
        assert_eq!(p.position.y + p.height, 400.0 - 1.0);
    }

    #[test]
    fn test_player_shot_kills_fast_enemy() {
        let mut engine = GameEngine::new(&config(
            &[(500.0, 100.0, StrategyTier::Fast)],
            &[(40.0, 200.0)],
            0,
        ));
        let enemy = first(&engine, EntityTag::Enemy);
        let bunker = first(&engine, EntityTag::Bunker);
        step(&mut engine, SHOT_COOLDOWN_FRAMES + 1);

        // Park the enemy just up and to the right of the player's firing line
        engine.entity_mut(enemy).unwrap().position = Vector2D::new(312.5, 300.0);
        assert!(engine.shoot_pressed());
        let shot = engine.last_shot().unwrap();

        let mut hit = false;
        for _ in 0..40 {
            engine.update();
            if engine.points() > 0 {
                hit = true;
                break;
            }
            engine.apply_pending();
        }

        assert!(hit, "shot never reached the enemy");
        assert_eq!(engine.points(), ScoreRule::FastAlien.points());
        assert_eq!(engine.entity(enemy).unwrap().health, 0);
        assert_eq!(engine.entity(shot).unwrap().health, 0);
        assert!(engine.pending().is_staged_for_removal(enemy));
        assert!(engine.pending().is_staged_for_removal(shot));
        assert_eq!(engine.entity(bunker).unwrap().health, BUNKER_LIVES);

        engine.apply_pending();
        assert_eq!(engine.count(EntityTag::Enemy), 0);
        assert_eq!(engine.count(EntityTag::PlayerProjectile), 0);
        assert!(engine.entity(enemy).is_none());
    }

    #[test]
    fn test_enemy_shots_pass_through_their_own_side() {
        // Two enemies stacked vertically: the upper one's shots fall through the lower one
        let mut engine = GameEngine::new(&config(
            &[(300.0, 40.0, StrategyTier::Slow), (300.0, 70.0, StrategyTier::Slow)],
            &[],
            1,
        ));
        step(&mut engine, 30);
        assert_eq!(engine.count(EntityTag::Enemy), 2);
        assert_eq!(engine.points(), 0);
        assert!(engine.renderables().filter(|e| e.tag() == EntityTag::Enemy).all(|e| e.is_alive()));
    }

    #[test]
    fn test_enemy_projectile_lists_are_pruned() {
        let mut engine = GameEngine::new(&config(&[(300.0, 300.0, StrategyTier::Fast)], &[], 1));
        step(&mut engine, 1);
        let enemy = first(&engine, EntityTag::Enemy);
        assert_eq!(engine.entity(enemy).unwrap().enemy_projectiles().len(), 1);
        assert_eq!(engine.count(EntityTag::EnemyProjectile), 1);

        engine.delete_fast_projectile();
        engine.apply_pending();
        assert!(engine.entity(enemy).unwrap().enemy_projectiles().is_empty());
        assert_eq!(engine.count(EntityTag::EnemyProjectile), 0);
    }

    #[test]
    fn test_invasion_kills_player() {
        let mut engine = GameEngine::new(&config(&[(100.0, 345.0, StrategyTier::Slow)], &[], 0));
        let board = Rc::new(RefCell::new(Scoreboard::default()));
        engine.attach(Box::new(board.clone()));

        step(&mut engine, 1);
        assert!(!engine.player_alive());
        assert_eq!(board.borrow().lives, 0);
    }

    #[test]
    fn test_delete_slow_projectile_scores_each() {
        let mut engine = GameEngine::new(&config(
            &[(100.0, 40.0, StrategyTier::Slow), (300.0, 40.0, StrategyTier::Fast)],
            &[],
            1,
        ));
        step(&mut engine, 2);
        assert_eq!(engine.count(EntityTag::EnemyProjectile), 4);

        let removed = engine.delete_slow_projectile();
        assert_eq!(removed, 2);
        assert_eq!(engine.points(), 2 * ScoreRule::SlowProjectile.points());

        engine.apply_pending();
        let survivors: Vec<_> = engine
            .renderables()
            .filter(|e| e.tag() == EntityTag::EnemyProjectile)
            .collect();
        assert_eq!(survivors.len(), 2);
        assert!(survivors.iter().all(|e| e.strategy().and_then(|s| s.tier()) == Some(StrategyTier::Fast)));
        assert!(survivors.iter().all(|e| e.is_alive()));

        // Nothing left to delete: no double award
        assert_eq!(engine.delete_slow_projectile(), 0);
        assert_eq!(engine.points(), 2);
    }

    #[test]
    fn test_delete_fast_projectile_scores_each() {
        let mut engine = GameEngine::new(&config(&[(300.0, 40.0, StrategyTier::Fast)], &[], 1));
        step(&mut engine, 3);
        assert_eq!(engine.delete_fast_projectile(), 3);
        assert_eq!(engine.points(), 3 * ScoreRule::FastProjectile.points());
    }

    #[test]
    fn test_clear_all_stages_everything() {
        let mut engine = GameEngine::new(&config(
            &[(100.0, 40.0, StrategyTier::Slow)],
            &[(80.0, 300.0)],
            0,
        ));
        step(&mut engine, SHOT_COOLDOWN_FRAMES + 1);
        assert!(engine.shoot_pressed());

        engine.clear_all();
        assert_eq!(engine.pending().remove_renderables().len(), 4);
        assert_eq!(engine.lives(), 0);
        assert!(engine.renderables().all(|e| !e.is_alive()));
        // Removal is deferred until the driver reconciles
        assert_eq!(engine.renderable_ids().len(), 4);

        engine.apply_pending();
        assert!(engine.renderable_ids().is_empty());
        assert!(engine.game_object_ids().is_empty());
    }

    #[test]
    fn test_clear_all_catches_shots_spawned_this_frame() {
        let mut engine = GameEngine::new(&config(&[(300.0, 40.0, StrategyTier::Fast)], &[], 1));
        engine.update();
        let spawned = engine.pending().add_renderables().to_vec();
        assert_eq!(spawned.len(), 1);

        engine.clear_all();
        assert!(engine.pending().is_staged_for_removal(spawned[0]));

        engine.apply_pending();
        assert_eq!(engine.count(EntityTag::EnemyProjectile), 0);
        assert!(engine.entity(spawned[0]).is_none());
        assert!(engine.renderable_ids().is_empty());
        assert!(engine.game_object_ids().is_empty());
    }

    #[test]
    fn test_damage_resolved_before_clamp() {
        let mut engine = GameEngine::new(&config(&[], &[(600.0, 355.0)], 0));
        let player = engine.player_id();
        let bunker = first(&engine, EntityTag::Bunker);

        // Player hangs past the right edge while overlapping the bunker
        engine.entity_mut(player).unwrap().position.x = 630.0;
        engine.update();

        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.entity(bunker).unwrap().health, BUNKER_LIVES - 1);
        assert_eq!(engine.points(), 0);
        let p = engine.player();
        assert_eq!(p.position.x, 640.0 - CLAMP_INSET - p.width);
        let b = engine.entity(bunker).unwrap();
        assert_eq!(b.position.x, 640.0 - CLAMP_INSET - b.width);
    }

    #[test]
    fn test_observers_notified_every_frame() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        let board = Rc::new(RefCell::new(Scoreboard::default()));
        let id = engine.attach(Box::new(board.clone()));

        step(&mut engine, 3);
        assert_eq!(board.borrow().updates, 3);
        assert_eq!(board.borrow().timer, 3);
        assert_eq!(board.borrow().lives, 3);

        assert!(engine.detach(id).is_some());
        step(&mut engine, 3);
        assert_eq!(board.borrow().updates, 3);
    }

    #[test]
    fn test_snapshot_is_isolated_from_live_state() {
        let mut engine = GameEngine::new(&config(&[(100.0, 40.0, StrategyTier::Fast)], &[(80.0, 300.0)], 0));
        let enemy = first(&engine, EntityTag::Enemy);
        let memento = engine.save();

        {
            let live = engine.entity_mut(enemy).unwrap();
            live.take_damage(1);
            live.position.x = 7.0;
        }
        let saved = memento.enemies()[0].enemy();
        assert_eq!(saved.health, ENEMY_HEALTH);
        assert_eq!(saved.position.x, 100.0);
    }

    #[test]
    fn test_revert_without_snapshot_is_noop() {
        let mut engine = GameEngine::new(&config(&[(100.0, 40.0, StrategyTier::Slow)], &[(80.0, 300.0)], 0));
        step(&mut engine, 5);
        let before: Vec<Entity> = engine.renderables().cloned().collect();

        assert!(!engine.has_snapshot());
        assert!(!engine.revert_snapshot());
        assert!(engine.pending().is_empty());
        assert_eq!(engine.points(), 0);
        assert_eq!(engine.timer(), 5);
        assert_eq!(engine.renderables().cloned().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut engine = GameEngine::new(&config(
            &[(100.0, 40.0, StrategyTier::Slow), (300.0, 40.0, StrategyTier::Fast)],
            &[(80.0, 300.0), (400.0, 300.0)],
            1,
        ));
        step(&mut engine, 3);
        engine.delete_slow_projectile();
        engine.apply_pending();

        let tags = [
            EntityTag::Player,
            EntityTag::Enemy,
            EntityTag::Bunker,
            EntityTag::EnemyProjectile,
        ];
        let counts: Vec<usize> = tags.iter().map(|&t| engine.count(t)).collect();
        let (points, timer) = (engine.points(), engine.timer());

        engine.save_snapshot();
        assert!(engine.revert_snapshot());
        engine.apply_pending();

        assert_eq!(tags.iter().map(|&t| engine.count(t)).collect::<Vec<_>>(), counts);
        assert_eq!(engine.points(), points);
        assert_eq!(engine.timer(), timer);
        assert!(engine.renderables().all(|e| e.is_alive()));
        // Restored enemies track their restored projectiles
        let tracked: usize = engine
            .renderables()
            .map(|e| e.enemy_projectiles().len())
            .sum();
        assert_eq!(tracked, engine.count(EntityTag::EnemyProjectile));
    }

    #[test]
    fn test_restore_rewinds_progress() {
        let mut engine = GameEngine::new(&config(
            &[(300.0, 40.0, StrategyTier::Fast)],
            &[(80.0, 300.0)],
            1,
        ));
        step(&mut engine, 2);
        engine.save_snapshot();
        let saved_player = engine.player().clone();

        step(&mut engine, 20);
        engine.delete_fast_projectile();
        let bunker = first(&engine, EntityTag::Bunker);
        engine.entity_mut(bunker).unwrap().take_damage(2);
        engine.left_pressed();
        step(&mut engine, 10);
        engine.left_released();
        assert!(engine.points() > 0);

        let board = Rc::new(RefCell::new(Scoreboard::default()));
        engine.attach(Box::new(board.clone()));
        assert!(engine.revert_snapshot());
        engine.apply_pending();

        assert_eq!(engine.points(), 0);
        assert_eq!(engine.timer(), 2);
        assert_eq!(board.borrow().timer, 2);
        assert_eq!(engine.player().position, saved_player.position);
        assert_ne!(engine.player_id(), saved_player.id);
        let restored_bunker = engine
            .renderables()
            .find(|e| e.tag() == EntityTag::Bunker)
            .unwrap();
        assert_eq!(restored_bunker.health, BUNKER_LIVES);
        assert_eq!(engine.count(EntityTag::EnemyProjectile), 2);
    }

    #[test]
    fn test_restore_removes_recorded_shot() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        step(&mut engine, SHOT_COOLDOWN_FRAMES + 1);
        assert!(engine.shoot_pressed());
        let shot = engine.last_shot().unwrap();
        engine.save_snapshot();

        step(&mut engine, 2);
        assert!(engine.revert_snapshot());
        engine.apply_pending();
        assert!(engine.entity(shot).is_none());
        assert_eq!(engine.count(EntityTag::PlayerProjectile), 0);
        assert_eq!(engine.count(EntityTag::Player), 1);
    }

    #[test]
    fn test_snapshot_slot_is_replaced() {
        let mut engine = GameEngine::new(&config(&[], &[], 0));
        step(&mut engine, 4);
        engine.save_snapshot();
        step(&mut engine, 4);
        engine.save_snapshot();
        step(&mut engine, 4);

        assert!(engine.revert_snapshot());
        assert_eq!(engine.timer(), 8);
        // The same snapshot can be restored again
        step(&mut engine, 4);
        assert!(engine.revert_snapshot());
        assert_eq!(engine.timer(), 8);
    }
}
