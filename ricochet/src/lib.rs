pub use ricochet_core::{BallSpeed, BouncingBall, Detector};

pub mod model {
    pub use ricochet_core::model::*;
}

pub mod error {
    pub use ricochet_core::error::*;
}

pub mod ball {
    pub use ricochet_core::ball::*;
}

#[cfg(feature = "rtc")]
pub mod rtc {
    pub use ricochet_rtc::*;
}
