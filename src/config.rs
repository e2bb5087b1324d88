//! Level configuration
//!
//! Layouts are JSON documents describing the playfield, the player and the
//! starting bunkers and enemies. Difficulty presets resolve to one of the
//! built-in layouts at switch time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Vector2D;
use crate::consts::DEFAULT_ENEMY_FIRE_ODDS;
use crate::error::{ConfigError, ConfigResult};
use crate::sim::StrategyTier;

/// `{ "x": .., "y": .. }` pair used for positions and sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(self) -> Vector2D {
        Vector2D::new(self.x, self.y)
    }
}

fn default_fire_odds() -> u32 {
    DEFAULT_ENEMY_FIRE_ODDS
}

/// Playfield settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub size: Coord,
    /// Seed for the enemy fire RNG
    #[serde(default)]
    pub seed: u64,
    /// One-in-N chance per frame that an enemy fires (0 disables)
    #[serde(default = "default_fire_odds")]
    pub enemy_fire_odds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub colour: String,
    pub speed: f64,
    pub lives: i32,
    pub position: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunkerInfo {
    pub position: Coord,
    pub size: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyInfo {
    pub position: Coord,
    /// Strategy tier of the projectiles this enemy fires
    pub projectile: StrategyTier,
}

/// A complete level layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(rename = "Game")]
    pub game: GameInfo,
    #[serde(rename = "Player")]
    pub player: PlayerInfo,
    #[serde(rename = "Bunkers", default)]
    pub bunkers: Vec<BunkerInfo>,
    #[serde(rename = "Enemies", default)]
    pub enemies: Vec<EnemyInfo>,
}

impl GameConfig {
    /// Parse and validate a layout
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a layout file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded config {} ({} enemies, {} bunkers)",
            path.display(),
            config.enemies.len(),
            config.bunkers.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let size = self.game.size;
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(ConfigError::InvalidPlayfield {
                width: size.x,
                height: size.y,
            });
        }
        if self.player.lives <= 0 {
            return Err(ConfigError::InvalidPlayer {
                lives: self.player.lives,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.game.size.x
    }

    pub fn height(&self) -> f64 {
        self.game.size.y
    }
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Built-in layout JSON for this preset
    pub fn layout_json(&self) -> &'static str {
        match self {
            Difficulty::Easy => include_str!("../configs/config_easy.json"),
            Difficulty::Medium => include_str!("../configs/config_medium.json"),
            Difficulty::Hard => include_str!("../configs/config_hard.json"),
        }
    }

    /// Resolve the layout for this preset
    pub fn config(&self) -> ConfigResult<GameConfig> {
        GameConfig::from_json(self.layout_json())
    }
}
