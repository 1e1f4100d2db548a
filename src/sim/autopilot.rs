//! Idle/demo mode - AI steers the vehicle
//!
//! Produces the same `TickInput` a drag gesture would, so the sim cannot tell
//! the difference.

use super::state::RoundState;
use super::tick::TickInput;
use crate::consts::SCREEN_WIDTH;
use crate::default_catch_line;

/// Steer toward the entity that will land first, moving at most `max_speed` per tick
pub fn steer(state: &RoundState, max_speed: f32) -> TickInput {
    let player = state.player.pos;

    // Lowest entity still above the catch line is the most urgent one
    let target_x = state
        .entities
        .iter()
        .filter(|e| e.pos.y <= player.y)
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|e| e.pos.x)
        // Nothing falling: shadow the emitter
        .unwrap_or(state.emitter.x);

    // Oscillating offset so the demo isn't a perfect player
    let t = state.time_ticks as f32 * 0.05;
    let wobble = t.sin() * 12.0 + (t * 0.7).sin() * 6.0;

    let delta = (target_x + wobble - player.x).clamp(-max_speed, max_speed);
    let x = (player.x + delta).clamp(0.0, SCREEN_WIDTH);

    TickInput {
        player_x: Some(x),
        player_y: Some(default_catch_line()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_moves_toward_lowest_entity() {
        let mut state = RoundState::new(1);
        state.spawn_entity(Vec2::new(50.0, 200.0), 0, 0.0);
        state.spawn_entity(Vec2::new(300.0, 600.0), 0, 0.0);

        let input = steer(&state, 10.0);
        let x = input.player_x.unwrap();
        assert!(x > state.player.pos.x);
        assert!(x - state.player.pos.x <= 10.0);
    }

    #[test]
    fn test_ignores_entities_below_catch_line() {
        let mut state = RoundState::new(1);
        state.emitter.x = 20.0;
        state.spawn_entity(Vec2::new(380.0, 800.0), 0, 0.0);

        let input = steer(&state, 10.0);
        assert!(input.player_x.unwrap() < state.player.pos.x);
    }

    #[test]
    fn test_stays_on_screen() {
        let mut state = RoundState::new(1);
        state.player.pos.x = SCREEN_WIDTH;
        state.emitter.x = SCREEN_WIDTH + 100.0;
        let input = steer(&state, 50.0);
        assert!(input.player_x.unwrap() <= SCREEN_WIDTH);
    }
}
