//! Deferred structural changes
//!
//! Nothing inserts into or deletes from the live id lists while a frame is
//! iterating them. Additions and removals are staged here and reconciled
//! by the driver between frames via `GameEngine::apply_pending`.

use super::entity::EntityId;

/// Staging buffers for the game-object and renderable lists
#[derive(Debug, Clone, Default)]
pub struct PendingQueues {
    add_objects: Vec<EntityId>,
    remove_objects: Vec<EntityId>,
    add_renderables: Vec<EntityId>,
    remove_renderables: Vec<EntityId>,
}

impl PendingQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a newly spawned object for both lists
    pub fn stage_spawn(&mut self, id: EntityId) {
        if !self.add_objects.contains(&id) {
            self.add_objects.push(id);
        }
        if !self.add_renderables.contains(&id) {
            self.add_renderables.push(id);
        }
    }

    /// Stage an entity for removal from both lists
    pub fn stage_removal(&mut self, id: EntityId) {
        if !self.remove_objects.contains(&id) {
            self.remove_objects.push(id);
        }
        if !self.remove_renderables.contains(&id) {
            self.remove_renderables.push(id);
        }
    }

    pub fn is_staged_for_removal(&self, id: EntityId) -> bool {
        self.remove_renderables.contains(&id) || self.remove_objects.contains(&id)
    }

    pub fn add_objects(&self) -> &[EntityId] {
        &self.add_objects
    }

    pub fn remove_objects(&self) -> &[EntityId] {
        &self.remove_objects
    }

    pub fn add_renderables(&self) -> &[EntityId] {
        &self.add_renderables
    }

    pub fn remove_renderables(&self) -> &[EntityId] {
        &self.remove_renderables
    }

    pub fn is_empty(&self) -> bool {
        self.add_objects.is_empty()
            && self.remove_objects.is_empty()
            && self.add_renderables.is_empty()
            && self.remove_renderables.is_empty()
    }
}
