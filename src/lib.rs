//! Space Invaders - simulation core for a 2D arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic frame simulation (entities, collisions, scoring)
//! - `memento`: Single-slot snapshot/restore of engine state
//! - `observer`: Score/lives/timer change notification
//! - `config`: JSON level layouts and difficulty presets
//!
//! Rendering, input wiring and window management belong to the driver.

pub mod config;
pub mod error;
pub mod memento;
pub mod observer;
pub mod sim;

pub use config::{Difficulty, GameConfig};
pub use error::{ConfigError, ConfigResult};
pub use memento::{GameEngineCaretaker, GameEngineMemento};
pub use observer::{Observer, ObserverId, Scoreboard, Subject};
pub use sim::GameEngine;

/// 2D position/velocity in playfield pixels (y grows downward)
pub type Vector2D = glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Frames that must elapse (strictly more than) between player shots
    pub const SHOT_COOLDOWN_FRAMES: u32 = 45;

    /// Player sprite footprint
    pub const PLAYER_WIDTH: f64 = 25.0;
    pub const PLAYER_HEIGHT: f64 = 30.0;

    /// Enemy sprite footprint
    pub const ENEMY_WIDTH: f64 = 20.0;
    pub const ENEMY_HEIGHT: f64 = 20.0;
    pub const ENEMY_HEALTH: i32 = 1;
    /// Horizontal pixels per frame
    pub const ENEMY_SPEED: f64 = 1.0;
    /// Live projectiles a single enemy may have in flight
    pub const ENEMY_MAX_PROJECTILES: usize = 3;
    /// One-in-N chance per frame that an enemy fires
    pub const DEFAULT_ENEMY_FIRE_ODDS: u32 = 120;

    /// Projectile footprint (player and enemy shots alike)
    pub const PROJECTILE_WIDTH: f64 = 10.0;
    pub const PROJECTILE_HEIGHT: f64 = 10.0;
    pub const PROJECTILE_HEALTH: i32 = 1;

    /// Vertical pixels per frame for each movement strategy
    pub const PLAYER_SHOT_SPEED: f64 = 2.0;
    pub const SLOW_PROJECTILE_SPEED: f64 = 1.0;
    pub const FAST_PROJECTILE_SPEED: f64 = 2.0;

    pub const BUNKER_LIVES: i32 = 3;

    /// Gap kept between a clamped entity and the playfield edge
    pub const CLAMP_INSET: f64 = 1.0;

    /// Frames per displayed second on the HUD clock
    pub const FRAMES_PER_SECOND: u32 = 120;
}
