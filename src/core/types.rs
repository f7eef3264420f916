use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of one customer visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Create a fresh random customer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the raw uuid
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Short form used in log prefixes
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in the shop where the movement provider can send a customer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// This position displaced by `offset` scaled by `times`
    pub fn offset_by(&self, offset: Position, times: f32) -> Position {
        Position {
            x: self.x + offset.x * times,
            y: self.y + offset.y * times,
            z: self.z + offset.z * times,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}
