//! Catch and miss detection
//!
//! Collision is plain axis-aligned distance thresholding against the player's
//! catch line. The catch test always runs before the miss test.

use glam::Vec2;

use crate::consts::SCREEN_HEIGHT;
use crate::tuning::Theme;

/// Catch rules for one theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Max vertical distance between entity and catch line
    pub catch_threshold_y: f32,
    /// Added to the level's catch radius
    pub radius_bonus: f32,
    /// Player may move vertically
    pub free_vertical: bool,
}

impl Geometry {
    /// Boat: wide hull, pinned to the water line
    pub const RIVER: Geometry = Geometry {
        catch_threshold_y: 40.0,
        radius_bonus: 20.0,
        free_vertical: false,
    };

    /// Carpet: narrower, flies anywhere
    pub const FOREST: Geometry = Geometry {
        catch_threshold_y: 30.0,
        radius_bonus: 0.0,
        free_vertical: true,
    };

    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::River => Self::RIVER,
            Theme::Forest => Self::FOREST,
        }
    }
}

/// What happened to one entity this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Caught,
    Missed,
    Live,
}

/// Classify an entity (already moved this tick) against the player
pub fn classify(entity: Vec2, player: Vec2, catch_radius: f32, geometry: &Geometry) -> Resolution {
    let dy = (entity.y - player.y).abs();
    let dx = (entity.x - player.x).abs();

    if dy < geometry.catch_threshold_y && dx < catch_radius + geometry.radius_bonus {
        return Resolution::Caught;
    }

    if entity.y > SCREEN_HEIGHT {
        return Resolution::Missed;
    }

    Resolution::Live
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_inside_radius() {
        let player = Vec2::new(150.0, 713.0);
        let r = classify(Vec2::new(200.0, 700.0), player, 59.0, &Geometry::RIVER);
        assert_eq!(r, Resolution::Caught);
    }

    #[test]
    fn test_radius_bonus_only_on_river() {
        let player = Vec2::new(150.0, 713.0);
        // dx = 70: inside 59 + 20, outside 59
        let entity = Vec2::new(220.0, 713.0);
        assert_eq!(classify(entity, player, 59.0, &Geometry::RIVER), Resolution::Caught);
        assert_eq!(classify(entity, player, 59.0, &Geometry::FOREST), Resolution::Live);
    }

    #[test]
    fn test_vertical_threshold() {
        let player = Vec2::new(150.0, 713.0);
        // dy = 35: inside river's 40, outside forest's 30
        let entity = Vec2::new(150.0, 748.0);
        assert_eq!(classify(entity, player, 59.0, &Geometry::RIVER), Resolution::Caught);
        assert_eq!(classify(entity, player, 59.0, &Geometry::FOREST), Resolution::Live);
    }

    #[test]
    fn test_miss_below_screen() {
        let player = Vec2::new(150.0, 713.0);
        let r = classify(Vec2::new(350.0, SCREEN_HEIGHT + 1.0), player, 59.0, &Geometry::RIVER);
        assert_eq!(r, Resolution::Missed);
    }

    #[test]
    fn test_catch_wins_over_miss() {
        // Carpet flown down to the bottom edge: entity is both catchable and past the bound
        let player = Vec2::new(150.0, SCREEN_HEIGHT);
        let r = classify(Vec2::new(150.0, SCREEN_HEIGHT + 5.0), player, 59.0, &Geometry::FOREST);
        assert_eq!(r, Resolution::Caught);
    }
}
