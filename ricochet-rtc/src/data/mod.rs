mod receiver;
mod sender;

pub use receiver::CoordinateReceiver;
pub use sender::CoordinateSender;

use ricochet_core::CENTERS_LABEL;
use std::time::Duration;

/// Settings shared by both ends of the coordinate data channel.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub label: String,
    /// Pause after every sent estimate.
    pub send_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            label: CENTERS_LABEL.to_owned(),
            send_interval: Duration::from_millis(100),
        }
    }
}
