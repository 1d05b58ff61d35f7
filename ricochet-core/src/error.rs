use thiserror::Error;

/// Rejected simulation parameters. The ball is never built when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallError {
    #[error("window length {0} is out of bounds (500..=2000)")]
    LengthOutOfBounds(u32),

    #[error("window width {0} is out of bounds (500..=2000)")]
    WidthOutOfBounds(u32),

    #[error("ball radius {0} is out of bounds (10..=100)")]
    RadiusOutOfBounds(u32),

    #[error("unrecognised ball speed {0:?}, expected slow, medium or fast")]
    InvalidSpeed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame payload of {len} bytes is shorter than its header")]
    TooShort { len: usize },

    #[error("unknown pixel format tag {0}")]
    UnknownFormat(u8),

    #[error("frame expects {expected} pixel bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("no circle found in frame")]
    NoCircle,
}
