pub mod ball;
pub mod error;
pub mod model;
pub mod vision;

pub use ball::{BallSpeed, BouncingBall};
pub use error::{BallError, DetectError, FrameError};
pub use model::*;
pub use vision::Detector;
