mod peer_events;
mod peer_session;
mod peer_transport;
mod transport_config;

pub use peer_events::*;
pub use peer_session::*;
pub use peer_transport::*;
pub use transport_config::*;
