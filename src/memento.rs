//! Engine snapshots
//!
//! A memento owns deep copies of everything it records, so later changes
//! to the live engine never reach it (and restoring copies it again, so the
//! same memento can be restored more than once).

use crate::sim::{Entity, EntityId};

/// An enemy together with its in-flight projectiles
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyRecord {
    enemy: Entity,
    projectiles: Vec<Entity>,
}

impl EnemyRecord {
    pub fn new(enemy: Entity, projectiles: Vec<Entity>) -> Self {
        Self { enemy, projectiles }
    }

    pub fn enemy(&self) -> &Entity {
        &self.enemy
    }

    pub fn projectiles(&self) -> &[Entity] {
        &self.projectiles
    }
}

/// Immutable snapshot of engine state
#[derive(Debug, Clone, PartialEq)]
pub struct GameEngineMemento {
    score: u32,
    timer: u32,
    enemies: Vec<EnemyRecord>,
    bunkers: Vec<Entity>,
    /// Most recent player shot at save time
    shot: Option<EntityId>,
    player: Entity,
}

impl GameEngineMemento {
    pub fn new(
        score: u32,
        timer: u32,
        enemies: Vec<EnemyRecord>,
        bunkers: Vec<Entity>,
        shot: Option<EntityId>,
        player: Entity,
    ) -> Self {
        Self {
            score,
            timer,
            enemies,
            bunkers,
            shot,
            player,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn enemies(&self) -> &[EnemyRecord] {
        &self.enemies
    }

    pub fn bunkers(&self) -> &[Entity] {
        &self.bunkers
    }

    pub fn shot(&self) -> Option<EntityId> {
        self.shot
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }
}

/// Single-slot holder; a new snapshot replaces the previous one
#[derive(Debug, Clone, Default)]
pub struct GameEngineCaretaker {
    history: Option<GameEngineMemento>,
}

impl GameEngineCaretaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, memento: GameEngineMemento) {
        self.history = Some(memento);
    }

    pub fn latest(&self) -> Option<&GameEngineMemento> {
        self.history.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector2D;
    use crate::sim::StrategyTier;

    fn memento(score: u32) -> GameEngineMemento {
        GameEngineMemento::new(
            score,
            10,
            vec![EnemyRecord::new(
                Entity::enemy(EntityId(2), Vector2D::new(1.0, 1.0), StrategyTier::Slow),
                Vec::new(),
            )],
            Vec::new(),
            None,
            Entity::player(EntityId(1), Vector2D::ZERO, 3, 1.0),
        )
    }

    #[test]
    fn test_caretaker_keeps_single_slot() {
        let mut caretaker = GameEngineCaretaker::new();
        assert!(caretaker.is_empty());
        assert!(caretaker.latest().is_none());

        caretaker.store(memento(1));
        caretaker.store(memento(2));
        assert_eq!(caretaker.latest().map(|m| m.score()), Some(2));
    }

    #[test]
    fn test_record_accessors() {
        let m = memento(5);
        assert_eq!(m.timer(), 10);
        assert_eq!(m.enemies().len(), 1);
        assert_eq!(m.enemies()[0].enemy().enemy_tier(), Some(StrategyTier::Slow));
        assert!(m.enemies()[0].projectiles().is_empty());
        assert!(m.bunkers().is_empty());
        assert_eq!(m.player().health, 3);
    }
}
