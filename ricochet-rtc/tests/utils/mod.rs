pub mod signal_helpers;
pub mod test_session;

pub use mock_peer::*;
pub use signal_helpers::*;
pub use test_session::*;
