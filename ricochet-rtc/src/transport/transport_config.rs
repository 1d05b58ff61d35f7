/// WebRTC settings shared by every peer session.
#[derive(Clone, Debug, Default)]
pub struct TransportConfig {
    /// STUN/TURN urls. Empty is enough for two processes on one host.
    pub ice_servers: Vec<String>,
    /// Send local candidates as they are gathered instead of waiting for
    /// gathering to finish before sending the description.
    pub trickle_ice: bool,
}
