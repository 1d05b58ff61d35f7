use ricochet::Detector;
use ricochet::model::{CoordinateEstimate, ErrorReport, Frame, Position};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectionStats {
    pub found: u64,
    pub missed: u64,
}

/// Client worker: find the ball in every frame and queue its center.
///
/// Runs until `next_frame` yields `None` or the estimate queue is gone.
/// Blocks the calling thread.
pub fn detection_worker(
    mut next_frame: impl FnMut() -> Option<Frame>,
    detector: &Detector,
    estimates: mpsc::UnboundedSender<CoordinateEstimate>,
) -> DetectionStats {
    let mut stats = DetectionStats::default();

    while let Some(frame) = next_frame() {
        match detector.detect(&frame) {
            Ok(estimate) => {
                debug!("Ball at {}", estimate);
                if estimates.send(estimate).is_err() {
                    break;
                }
                stats.found += 1;
            }
            Err(e) => {
                info!("{}", e);
                stats.missed += 1;
            }
        }
    }

    info!(
        "Detection worker done: {} found, {} missed",
        stats.found, stats.missed
    );
    stats
}

/// Server worker: score every incoming estimate against the latest true position.
///
/// Runs until the estimate queue closes. Blocks the calling thread.
pub fn error_worker(
    mut estimates: mpsc::UnboundedReceiver<CoordinateEstimate>,
    position: watch::Receiver<Position>,
    mut report: impl FnMut(&ErrorReport),
) -> u64 {
    let mut scored = 0u64;

    while let Some(estimate) = estimates.blocking_recv() {
        let actual = *position.borrow();
        report(&ErrorReport::new(estimate, actual));
        scored += 1;
    }

    info!("Error worker done after {} estimates", scored);
    scored
}
