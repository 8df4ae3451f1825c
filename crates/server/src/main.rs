mod config;
mod events;
mod motion;
mod server;

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use config::ServerConfig;
use server::MotionServer;

#[derive(Parser)]
#[command(name = "mocap-server")]
#[command(about = "Synthetic motion capture source")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = mocap::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = 10.0, help = "Seconds without a heartbeat before a client is dropped")]
    heartbeat_timeout: f32,

    #[arg(long, default_value_t = 30, help = "Face data frames per second")]
    face_rate: u32,

    #[arg(long, default_value_t = 2048)]
    buffer_size: usize,

    #[arg(long, help = "Stop after this many seconds")]
    duration: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let bind_addr = format!("{}:{}", args.bind, args.port);

    let config = ServerConfig {
        heartbeat_timeout: seconds("--heartbeat-timeout", args.heartbeat_timeout)?,
        face_rate: args.face_rate,
        buffer_size: args.buffer_size,
    };

    let mut server = MotionServer::new(&bind_addr, config)?;
    log::info!("Server started on {}", server.local_addr()?);

    let duration = args
        .duration
        .map(|secs| seconds("--duration", secs))
        .transpose()?;
    server::run(&mut server, duration);

    let stats = server.stats();
    log::info!(
        "Server shutting down ({} frames sent, {} heartbeats answered)",
        stats.frames_sent,
        stats.heartbeats
    );
    Ok(())
}

fn seconds(flag: &str, value: f32) -> Result<Duration> {
    match Duration::try_from_secs_f32(value) {
        Ok(duration) => Ok(duration),
        Err(e) => bail!("{flag} {value}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_seconds_are_rejected() {
        assert_eq!(seconds("--duration", 0.25).unwrap(), Duration::from_millis(250));
        assert!(seconds("--heartbeat-timeout", f32::INFINITY).is_err());
        assert!(seconds("--duration", -3.0).is_err());
    }
}
