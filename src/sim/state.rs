//! Round state and core simulation types
//!
//! Everything a single round owns lives here. A new `RoundState` is built on
//! every round start, nothing carries over.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::default_catch_line;
use crate::tuning::{LevelParams, emitter_speed_multiplier, params_for_level};

/// Where a round stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoundPhase {
    /// Ticks are being processed
    #[default]
    Running,
    /// Target score reached
    Won,
    /// Too many misses
    Lost,
}

impl RoundPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundPhase::Running)
    }
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted { level: u32 },
    Spawned { id: u32, pos: Vec2 },
    Caught { id: u32, score: u32 },
    /// Score hit the target, even if the round was already lost this tick
    TargetReached { score: u32 },
    Missed { id: u32, missed: u32, power: u32 },
    RoundWon { score: u32 },
    RoundLost { score: u32 },
}

/// A falling piece of waste (or fireball on forest levels)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    /// Variant index for the sprite, opaque to the sim
    pub visual: u8,
    /// Initial spin in degrees, presentation only
    pub rotation: f32,
}

/// The player's vehicle. Written by input, read by the sim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, default_catch_line()),
        }
    }
}

/// The airplane sweeping across the top of the screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Emitter {
    pub x: f32,
    /// +1.0 moving right, -1.0 moving left
    pub direction: f32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            x: EMITTER_START_X,
            direction: 1.0,
        }
    }
}

impl Emitter {
    /// Move one tick, bouncing off the screen margins
    pub fn advance(&mut self, level: u32) {
        self.x += EMITTER_BASE_SPEED * self.direction * emitter_speed_multiplier(level);
        if self.x > SCREEN_WIDTH - EMITTER_MARGIN || self.x < EMITTER_MARGIN {
            self.direction = -self.direction;
        }
    }
}

/// Complete state of one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub level: u32,
    /// Cached difficulty for `level`
    pub params: LevelParams,
    /// Catches so far, never decreases
    pub score: u32,
    /// 0-100, never increases
    pub power: u32,
    /// Misses so far, never decreases
    pub missed: u32,
    pub phase: RoundPhase,
    /// Score reached the target at some point; set at most once per round
    pub target_reached: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    pub emitter: Emitter,
    /// Live entities, sorted by id
    pub entities: Vec<Entity>,
    /// Events produced since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl RoundState {
    /// Fresh round at `level`. Panics on level 0 or above the cap.
    pub fn new(level: u32) -> Self {
        assert!(
            (1..=LEVEL_CAP).contains(&level),
            "level must be in 1..={LEVEL_CAP}, got {level}"
        );
        Self {
            level,
            params: params_for_level(level),
            score: 0,
            power: 100,
            missed: 0,
            phase: RoundPhase::Running,
            target_reached: false,
            time_ticks: 0,
            player: Player::default(),
            emitter: Emitter::default(),
            entities: Vec::new(),
            events: vec![GameEvent::RoundStarted { level }],
            next_id: 1,
        }
    }

    /// Throw everything away and start over at `level`
    pub fn reset(&mut self, level: u32) {
        *self = Self::new(level);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add an entity at `pos`, returning its id
    pub fn spawn_entity(&mut self, pos: Vec2, visual: u8, rotation: f32) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            pos,
            visual,
            rotation,
        });
        self.events.push(GameEvent::Spawned { id, pos });
        id
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Power left after `missed` misses at the current level
    pub fn power_after_misses(&self, missed: u32) -> u32 {
        100u32.saturating_sub(missed * self.params.power_loss_per_miss)
    }
}
