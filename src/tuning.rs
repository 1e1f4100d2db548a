//! Data-driven game balance
//!
//! Every gameplay knob is a pure function of the level number. Integer
//! divisions are intentional and must stay integer: they decide where the
//! difficulty steps happen.

use serde::{Deserialize, Serialize};

/// Visual theme of a level. Also selects the catch geometry used by the sim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    /// Boat on the river, horizontal movement only
    #[default]
    River,
    /// Flying carpet over the forest, free movement
    Forest,
}

impl Theme {
    /// Levels come in pairs: 1-2 river, 3-4 forest, 5-6 river, ...
    pub fn for_level(level: u32) -> Self {
        if is_alternate_theme(level) {
            Theme::Forest
        } else {
            Theme::River
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::River => "River",
            Theme::Forest => "Forest",
        }
    }
}

/// True for the second theme in the two-level alternation
#[inline]
pub fn is_alternate_theme(level: u32) -> bool {
    assert!(level >= 1, "level must be >= 1, got {level}");
    ((level - 1) / 2) % 2 == 1
}

/// Gameplay parameters for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub level: u32,
    /// Catches needed to win
    pub target_score: u32,
    /// Vertical distance an entity falls per tick
    pub fall_speed: f32,
    /// A spawn happens when a roll in [1, n] comes up 1
    pub spawn_denominator: u32,
    /// Shown in the level description only
    pub power_loss_percent: u32,
    /// Misses allowed before the round is lost
    pub max_missed: u32,
    /// Power removed per miss
    pub power_loss_per_miss: u32,
    /// Horizontal catch distance, same units as player x
    pub catch_radius: f32,
    pub theme: Theme,
}

/// Fall speed never exceeds this
pub const MAX_FALL_SPEED: f32 = 40.0;
/// Emitter speed multiplier never exceeds this
pub const MAX_EMITTER_MULTIPLIER: f32 = 2.5;

/// Difficulty curve. Panics on level 0.
pub fn params_for_level(level: u32) -> LevelParams {
    assert!(level >= 1, "level must be >= 1, got {level}");

    let max_missed = 6u32.saturating_sub(level / 10).max(3);

    LevelParams {
        level,
        target_score: 5 + (level - 1) * 3,
        fall_speed: (5.0 + level as f32 * 0.8).min(MAX_FALL_SPEED),
        spawn_denominator: 20u32.saturating_sub(level / 2).max(2),
        power_loss_percent: (20 + level / 2).min(40),
        max_missed,
        power_loss_per_miss: 100 / max_missed,
        catch_radius: (60.0 - level as f32).max(30.0),
        theme: Theme::for_level(level),
    }
}

/// Emitter sweep speed grows with level
#[inline]
pub fn emitter_speed_multiplier(level: u32) -> f32 {
    (1.0 + level as f32 * 0.1).min(MAX_EMITTER_MULTIPLIER)
}

/// Short text the level picker shows under each tile
pub fn level_description(level: u32) -> String {
    let p = params_for_level(level);
    match level {
        1 => format!("Getting Started\nCollect {} items", p.target_score),
        _ => format!(
            "{} Challenge\nCollect {} items\nPower Loss: {}",
            p.theme.as_str(),
            p.target_score,
            p.power_loss_percent
        ),
    }
}
