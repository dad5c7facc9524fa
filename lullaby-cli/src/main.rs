use anyhow::Result;
use clap::Parser;
use colored::*;
use lullaby_server::{RelayConfig, RoomPolicy};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lullaby-relay")]
#[command(about = "Signaling relay for the lullaby baby monitor")]
struct Cli {
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    port: u16,

    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Reject room ids longer than this many bytes
    #[arg(long)]
    max_room_id_len: Option<usize>,

    /// Expire rooms that have had no publisher for this long. Off by default.
    #[arg(long)]
    orphan_ttl_secs: Option<u64>,

    #[arg(long, default_value_t = 30)]
    sweep_interval_secs: u64,

    #[arg(long, default_value_t = 1024)]
    command_capacity: usize,
}

impl Cli {
    fn into_config(self) -> RelayConfig {
        let mut policy =
            RoomPolicy::default().sweep_interval(Duration::from_secs(self.sweep_interval_secs));
        if let Some(len) = self.max_room_id_len {
            policy = policy.max_room_id_len(len);
        }
        if let Some(secs) = self.orphan_ttl_secs {
            policy = policy.orphan_room_ttl(Duration::from_secs(secs));
        }

        RelayConfig::default()
            .bind(SocketAddr::new(self.bind, self.port))
            .command_capacity(self.command_capacity)
            .room_policy(policy)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();

    println!("{}", "🍼 Lullaby signaling relay".green().bold());
    println!("   🔌 WebSocket: ws://{}/ws", config.bind_addr);
    println!("   📊 Stats:     http://{}/stats", config.bind_addr);
    match config.room_policy.orphan_room_ttl {
        Some(ttl) => println!("   ⏳ Orphan rooms expire after {}s", ttl.as_secs()),
        None => println!("{}", "   ⏳ Orphan rooms never expire".yellow()),
    }

    lullaby_server::serve(config).await
}
