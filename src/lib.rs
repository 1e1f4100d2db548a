//! Eco Venture - catch falling waste, keep a nature streak going
//!
//! Core modules:
//! - `tuning`: Level difficulty curve (pure functions of the level number)
//! - `sim`: Deterministic round simulation (entities, catches, misses)
//! - `progression`: Levels, coins, high score, streaks and the activity log
//! - `game`: Host composition that drives rounds and notifies observers
//! - `persistence`: Save/load of the progression snapshot
//! - `settings`: Host configuration

pub mod game;
pub mod persistence;
pub mod progression;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{Calendar, FixedCalendar, FixedStep, Game, LocalCalendar, Observer, Snapshot};
pub use progression::{ActivityEntry, ProgressionState, UnlockOutcome};
pub use settings::Settings;
pub use tuning::{LevelParams, Theme, params_for_level};

/// Game configuration constants
pub mod consts {
    /// Fixed tick interval in milliseconds (the reference timer fires every 30ms)
    pub const TICK_INTERVAL_MS: u64 = 30;
    /// Tick interval in seconds
    pub const TICK_DT: f32 = TICK_INTERVAL_MS as f32 / 1000.0;
    /// Maximum ticks per host update to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logical screen size (points)
    pub const SCREEN_WIDTH: f32 = 390.0;
    pub const SCREEN_HEIGHT: f32 = 844.0;

    /// Player vehicle rests this far above the bottom of the screen
    pub const PLAYER_BOTTOM_OFFSET: f32 = 131.0;
    /// Player default horizontal position on reset
    pub const PLAYER_START_X: f32 = 150.0;

    /// Emitter (airplane) sweeps between these margins
    pub const EMITTER_MARGIN: f32 = 50.0;
    pub const EMITTER_START_X: f32 = 50.0;
    /// Base emitter speed per tick, scaled by the level multiplier
    pub const EMITTER_BASE_SPEED: f32 = 10.0;
    /// New entities appear at this height below the top edge
    pub const SPAWN_Y: f32 = 100.0;

    /// Highest level in the game
    pub const LEVEL_CAP: u32 = 50;

    /// Coins granted for every logged nature activity
    pub const COINS_PER_ACTIVITY: u32 = 50;
    /// Coins granted once per seven-day streak window
    pub const STREAK_BONUS_COINS: u32 = 100;
    /// Streak length that earns the bonus
    pub const STREAK_BONUS_DAYS: u32 = 7;

    /// Number of visual variants the presentation layer draws entities with
    pub const VISUAL_VARIANTS: u8 = 6;
}

/// Vertical position of the catch line when the player is pinned to it
#[inline]
pub fn default_catch_line() -> f32 {
    consts::SCREEN_HEIGHT - consts::PLAYER_BOTTOM_OFFSET
}
