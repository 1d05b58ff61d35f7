mod coordinate;
mod frame;
mod signaling;

pub use coordinate::{CENTERS_LABEL, CoordinateEstimate, ErrorReport, Position};
pub use frame::{FRAME_HEADER_LEN, Frame, PixelFormat};
pub(crate) use frame::luma;
pub use signaling::{IceCandidate, SdpType, SessionDescription, SignalMessage};
