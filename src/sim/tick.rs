//! Fixed timestep simulation tick
//!
//! Advances one round by one step. The random source is passed in so a
//! seeded generator reproduces a round exactly.

use glam::Vec2;
use rand::Rng;

use super::collision::{Geometry, Resolution, classify};
use super::state::{GameEvent, RoundPhase, RoundState};
use crate::consts::*;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player horizontal position (from drag)
    pub player_x: Option<f32>,
    /// Player vertical position, only honored on free-moving themes
    pub player_y: Option<f32>,
}

impl TickInput {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            player_x: Some(x),
            player_y: Some(y),
        }
    }
}

/// Advance the round by one fixed timestep. No-op once the round is over.
pub fn tick<R: Rng + ?Sized>(state: &mut RoundState, input: &TickInput, rng: &mut R) {
    if state.phase.is_terminal() {
        return;
    }

    let geometry = Geometry::for_theme(state.params.theme);

    // Apply latest input
    if let Some(x) = input.player_x {
        state.player.pos.x = x;
    }
    if geometry.free_vertical {
        if let Some(y) = input.player_y {
            state.player.pos.y = y;
        }
    }

    state.time_ticks += 1;

    // 1. Sweep the emitter
    state.emitter.advance(state.level);

    // 2. Maybe drop something
    if rng.random_range(1..=state.params.spawn_denominator) == 1 {
        let visual = rng.random_range(0..VISUAL_VARIANTS);
        let rotation = rng.random_range(0.0..360.0);
        let pos = Vec2::new(state.emitter.x, SPAWN_Y);
        let id = state.spawn_entity(pos, visual, rotation);
        log::debug!("Spawned entity {} at x={:.1}", id, pos.x);
    }

    // 3. Move and resolve, in id order
    let params = state.params;
    let player = state.player.pos;
    let entities = std::mem::take(&mut state.entities);
    let mut survivors = Vec::with_capacity(entities.len());

    for mut entity in entities {
        entity.pos.y += params.fall_speed;

        match classify(entity.pos, player, params.catch_radius, &geometry) {
            Resolution::Caught => {
                state.score += 1;
                state.events.push(GameEvent::Caught {
                    id: entity.id,
                    score: state.score,
                });
                log::debug!("Caught entity {} ({}/{})", entity.id, state.score, params.target_score);

                if state.score >= params.target_score && !state.target_reached {
                    state.target_reached = true;
                    state.events.push(GameEvent::TargetReached { score: state.score });
                    // A miss earlier in this tick may already have lost the round
                    if state.phase == RoundPhase::Running {
                        state.phase = RoundPhase::Won;
                    }
                }
            }
            Resolution::Missed => {
                state.missed += 1;
                state.power = state.power_after_misses(state.missed);
                if state.missed >= params.max_missed {
                    state.power = 0;
                    if state.phase == RoundPhase::Running {
                        state.phase = RoundPhase::Lost;
                    }
                }
                state.events.push(GameEvent::Missed {
                    id: entity.id,
                    missed: state.missed,
                    power: state.power,
                });
                log::debug!("Missed entity {} ({}/{})", entity.id, state.missed, params.max_missed);
            }
            Resolution::Live => survivors.push(entity),
        }
    }

    state.entities = survivors;

    // 4. Announce the end of the round; the host stops the clock
    match state.phase {
        RoundPhase::Won => {
            log::info!("Level {} won with score {}", state.level, state.score);
            state.events.push(GameEvent::RoundWon { score: state.score });
        }
        RoundPhase::Lost => {
            log::info!("Level {} lost after {} misses", state.level, state.missed);
            state.events.push(GameEvent::RoundLost { score: state.score });
        }
        RoundPhase::Running => {}
    }
}
