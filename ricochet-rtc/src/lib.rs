mod data;
mod media;
mod signaling;
mod transport;

pub use data::*;
pub use media::*;
pub use signaling::*;
pub use transport::*;
