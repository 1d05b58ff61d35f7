mod channel;
mod negotiator;

pub use channel::*;
pub use negotiator::*;
