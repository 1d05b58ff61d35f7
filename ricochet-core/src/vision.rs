use crate::error::DetectError;
use crate::model::{CoordinateEstimate, Frame};
use std::f64::consts::PI;

/// Finds the center of a single bright disc on a dark background.
///
/// Every pixel brighter than `threshold` votes for the disc; the center is the
/// centroid of the votes. The blob is accepted when the radius implied by its
/// area is plausible for a ball between `min_radius` and `max_radius`
/// (a disc clipped by a wall still counts).
#[derive(Debug, Clone)]
pub struct Detector {
    pub threshold: u8,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            threshold: 32,
            min_radius: 10,
            max_radius: 100,
        }
    }
}

impl Detector {
    pub fn detect(&self, frame: &Frame) -> Result<CoordinateEstimate, DetectError> {
        let width = usize::from(frame.width());
        let height = usize::from(frame.height());

        let (mut count, mut sum_x, mut sum_y) = (0u64, 0u64, 0u64);
        for y in 0..height {
            for x in 0..width {
                if frame.luma_at(x, y) > self.threshold {
                    count += 1;
                    sum_x += x as u64;
                    sum_y += y as u64;
                }
            }
        }

        if count == 0 {
            return Err(DetectError::NoCircle);
        }

        let radius = (count as f64 / PI).sqrt();
        let lower = f64::from(self.min_radius) / 2.0;
        let upper = f64::from(self.max_radius) * 1.25;
        if radius < lower || radius > upper {
            return Err(DetectError::NoCircle);
        }

        let cx = (sum_x as f64 / count as f64).round() as i32;
        let cy = (sum_y as f64 / count as f64).round() as i32;
        Ok(CoordinateEstimate::new(cx, cy))
    }
}
