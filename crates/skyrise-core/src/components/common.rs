//! Common components used across multiple entity types.

use serde::{Deserialize, Serialize};

/// Spatial position component, in building pixel space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Floor the entity is on (while riding: the car's floor)
    pub floor: i32,
    /// Horizontal pixel position
    pub x: f32,
    /// Vertical pixel position, floor 0 at y = 0, increasing upward
    pub y: f32,
}

impl Position {
    pub fn new(floor: i32, x: f32, y: f32) -> Self {
        Self { floor, x, y }
    }

    /// Move horizontally toward `target` by at most `step`.
    /// Returns true once the target is reached.
    pub fn walk_toward(&mut self, target: f32, step: f32) -> bool {
        let diff = target - self.x;
        if diff.abs() <= step {
            self.x = target;
            true
        } else {
            self.x += diff.signum() * step;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_arrives() {
        let mut pos = Position::new(0, 0.0, 0.0);
        assert!(!pos.walk_toward(10.0, 4.0));
        assert_eq!(pos.x, 4.0);
        assert!(!pos.walk_toward(10.0, 4.0));
        assert!(pos.walk_toward(10.0, 4.0));
        assert_eq!(pos.x, 10.0);
    }

    #[test]
    fn test_walk_left() {
        let mut pos = Position::new(0, 5.0, 0.0);
        assert!(!pos.walk_toward(-5.0, 3.0));
        assert_eq!(pos.x, 2.0);
    }
}
