use serde::{Deserialize, Serialize};

/// A 3-component vector as it travels on the wire: `{"x":..,"y":..,"z":..}`.
///
/// Used for both positions and orientations (Euler angles on the client
/// side; the relay never interprets the components).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}
