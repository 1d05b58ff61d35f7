use crate::error::FrameError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// width (u16 BE) + height (u16 BE) + format tag (u8)
pub const FRAME_HEADER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelFormat {
    Gray8 = 0,
    Rgb24 = 1,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb24 => 3,
        }
    }
}

impl TryFrom<u8> for PixelFormat {
    type Error = FrameError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(PixelFormat::Gray8),
            1 => Ok(PixelFormat::Rgb24),
            other => Err(FrameError::UnknownFormat(other)),
        }
    }
}

/// A single rendered image. Row-major, no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u16,
    height: u16,
    format: PixelFormat,
    data: Bytes,
}

impl Frame {
    pub fn new(
        width: u16,
        height: u16,
        format: PixelFormat,
        data: impl Into<Bytes>,
    ) -> Result<Self, FrameError> {
        let data = data.into();
        let expected = usize::from(width) * usize::from(height) * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Brightness of a pixel; RGB is weighted the BT.601 way.
    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        let bpp = self.format.bytes_per_pixel();
        let offset = (y * usize::from(self.width) + x) * bpp;
        match self.format {
            PixelFormat::Gray8 => self.data[offset],
            PixelFormat::Rgb24 => {
                luma([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
            }
        }
    }

    /// Header followed by the raw pixels.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + self.data.len());
        buf.put_u16(self.width);
        buf.put_u16(self.height);
        buf.put_u8(self.format as u8);
        buf.put_slice(&self.data);
        buf.freeze()
    }

    pub fn decode(mut bytes: Bytes) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(FrameError::TooShort { len: bytes.len() });
        }

        let width = bytes.get_u16();
        let height = bytes.get_u16();
        let format = PixelFormat::try_from(bytes.get_u8())?;

        Self::new(width, height, format, bytes)
    }
}

pub(crate) fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((r * 299 + g * 587 + b * 114) / 1000) as u8
}
