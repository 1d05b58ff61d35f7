use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the data channel that carries center estimates.
pub const CENTERS_LABEL: &str = "centers";

/// Ball center as estimated by the detector on the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateEstimate {
    pub x: i32,
    pub y: i32,
}

impl CoordinateEstimate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Encode as one data channel message.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    /// Euclidean distance to the true position.
    pub fn distance_to(&self, actual: &Position) -> f64 {
        let dx = f64::from(self.x) - f64::from(actual.x);
        let dy = f64::from(self.y) - f64::from(actual.y);
        dx.hypot(dy)
    }
}

impl fmt::Display for CoordinateEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Ground truth position of the ball.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorReport {
    pub estimate: CoordinateEstimate,
    pub actual: Position,
    pub distance: f64,
}

impl ErrorReport {
    pub fn new(estimate: CoordinateEstimate, actual: Position) -> Self {
        Self {
            estimate,
            actual,
            distance: estimate.distance_to(&actual),
        }
    }
}
