use clap::{Args, Parser, Subcommand};
use ricochet::BallSpeed;
use ricochet::rtc::{CoordinatorConfig, MediaConfig, TransportConfig};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ricochet")]
#[command(version, about = "Bouncing ball streamed over WebRTC, tracked by the receiver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the ball, stream it, and score the client's estimates.
    Server(ServerArgs),
    /// Receive the stream, find the ball, and send back its center.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NetArgs {
    /// Signaling address for the video connection.
    #[arg(long, default_value = "127.0.0.1:9001")]
    pub media_addr: SocketAddr,

    /// Signaling address for the coordinate connection.
    #[arg(long, default_value = "127.0.0.1:9002")]
    pub coords_addr: SocketAddr,

    /// STUN/TURN url, may be repeated. Loopback needs none.
    #[arg(long = "ice-server")]
    pub ice_servers: Vec<String>,

    /// Relay ICE candidates as they are gathered instead of inside the description.
    #[arg(long)]
    pub trickle_ice: bool,

    #[arg(long, default_value_t = 10)]
    pub fps: u32,

    /// Decoded frames kept for the detector before the oldest are dropped.
    #[arg(long, default_value_t = 2)]
    pub queue_depth: usize,

    /// Pause between two coordinate messages.
    #[arg(long, default_value_t = 100)]
    pub send_interval_ms: u64,
}

impl NetArgs {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            ice_servers: self.ice_servers.clone(),
            trickle_ice: self.trickle_ice,
        }
    }

    pub fn media_config(&self) -> MediaConfig {
        MediaConfig {
            fps: self.fps,
            queue_depth: self.queue_depth,
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            send_interval: Duration::from_millis(self.send_interval_ms),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[command(flatten)]
    pub net: NetArgs,

    /// Window length (y axis), 500..=2000.
    #[arg(long, default_value_t = 500)]
    pub length: u32,

    /// Window width (x axis), 500..=2000.
    #[arg(long, default_value_t = 500)]
    pub width: u32,

    /// 10..=100.
    #[arg(long, default_value_t = 20)]
    pub radius: u32,

    /// slow, medium or fast.
    #[arg(long, default_value = "slow")]
    pub speed: BallSpeed,

    /// Send RGB frames instead of grayscale.
    #[arg(long)]
    pub rgb: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    #[command(flatten)]
    pub net: NetArgs,

    /// How many times to dial a signaling address before giving up.
    #[arg(long, default_value_t = 20)]
    pub retries: u32,

    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Luma above which a pixel counts as ball.
    #[arg(long, default_value_t = 32)]
    pub threshold: u8,
}
