use crate::error::BallError;
use crate::model::{Frame, PixelFormat, Position, luma};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const WINDOW_BOUNDS: RangeInclusive<u32> = 500..=2000;
pub const RADIUS_BOUNDS: RangeInclusive<u32> = 10..=100;

/// RGB, orange.
const BALL_COLOR: [u8; 3] = [255, 128, 0];

/// The only speeds a ball can have. The discriminant is the per-tick step on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BallSpeed {
    Slow = 1,
    Medium = 2,
    Fast = 4,
}

impl BallSpeed {
    pub fn velocity(self) -> i32 {
        self as i32
    }
}

impl TryFrom<u8> for BallSpeed {
    type Error = BallError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BallSpeed::Slow),
            2 => Ok(BallSpeed::Medium),
            4 => Ok(BallSpeed::Fast),
            other => Err(BallError::InvalidSpeed(other.to_string())),
        }
    }
}

impl FromStr for BallSpeed {
    type Err = BallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(BallSpeed::Slow),
            "medium" => Ok(BallSpeed::Medium),
            "fast" => Ok(BallSpeed::Fast),
            _ => Err(BallError::InvalidSpeed(s.to_owned())),
        }
    }
}

impl fmt::Display for BallSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BallSpeed::Slow => "slow",
            BallSpeed::Medium => "medium",
            BallSpeed::Fast => "fast",
        };
        f.write_str(name)
    }
}

/// A ball bouncing around a `window_width` x `window_length` window.
///
/// `x` runs along the width and `y` along the length. Each call to
/// [`BouncingBall::increment`] moves the ball by its velocity and then reverses
/// any component whose edge has reached a wall.
#[derive(Debug, Clone)]
pub struct BouncingBall {
    window_length: u32,
    window_width: u32,
    radius: u32,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
}

impl BouncingBall {
    pub fn new(
        window_length: u32,
        window_width: u32,
        radius: u32,
        speed: BallSpeed,
    ) -> Result<Self, BallError> {
        if !WINDOW_BOUNDS.contains(&window_length) {
            return Err(BallError::LengthOutOfBounds(window_length));
        }
        if !WINDOW_BOUNDS.contains(&window_width) {
            return Err(BallError::WidthOutOfBounds(window_width));
        }
        if !RADIUS_BOUNDS.contains(&radius) {
            return Err(BallError::RadiusOutOfBounds(radius));
        }

        let velocity = speed.velocity();

        Ok(Self {
            window_length,
            window_width,
            radius,
            x: (window_width / 4) as i32,
            y: (window_length / 3) as i32,
            dx: velocity,
            dy: velocity,
        })
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn velocity(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Advance one tick and return the new position.
    pub fn increment(&mut self) -> Position {
        self.x += self.dx;
        self.y += self.dy;

        let r = self.radius as i32;
        let width = self.window_width as i32;
        let length = self.window_length as i32;

        if self.x + r >= width {
            self.dx = -self.dx.abs();
        } else if self.x - r <= 0 {
            self.dx = self.dx.abs();
        }
        if self.y + r >= length {
            self.dy = -self.dy.abs();
        } else if self.y - r <= 0 {
            self.dy = self.dy.abs();
        }

        self.position()
    }

    /// Advance one tick and draw the result.
    pub fn increment_frame(&mut self, format: PixelFormat) -> Frame {
        self.increment();
        self.render(format)
    }

    /// Draw the ball as a filled disc on a black background.
    pub fn render(&self, format: PixelFormat) -> Frame {
        let width = self.window_width as usize;
        let height = self.window_length as usize;
        let bpp = format.bytes_per_pixel();
        let mut pixels = vec![0u8; width * height * bpp];

        let color: &[u8] = match format {
            PixelFormat::Gray8 => &[luma(BALL_COLOR)],
            PixelFormat::Rgb24 => &BALL_COLOR,
        };

        let r = i64::from(self.radius);
        let (cx, cy) = (i64::from(self.x), i64::from(self.y));
        let rows = (cy - r).max(0)..=(cy + r).min(height as i64 - 1);
        for py in rows {
            let cols = (cx - r).max(0)..=(cx + r).min(width as i64 - 1);
            for px in cols {
                let (ox, oy) = (px - cx, py - cy);
                if ox * ox + oy * oy > r * r {
                    continue;
                }
                let offset = (py as usize * width + px as usize) * bpp;
                pixels[offset..offset + bpp].copy_from_slice(color);
            }
        }

        // Bounds are validated in `new`, so both sides fit in u16.
        Frame::new(self.window_width as u16, self.window_length as u16, format, pixels)
            .expect("pixel buffer sized from the frame dimensions")
    }
}
