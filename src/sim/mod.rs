//! Deterministic simulation module
//!
//! All round logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Geometry, Resolution, classify};
pub use state::{Emitter, Entity, GameEvent, Player, RoundPhase, RoundState};
pub use tick::{TickInput, tick};
