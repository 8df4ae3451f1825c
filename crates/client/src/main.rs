mod config;
mod playback;
mod rig;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;

use mocap::{
    ActorConfig, FaceActor, HandlerRegistry, MotionActor, Session, SessionConfig, SessionEvent,
};

use config::ClientConfig;
use playback::PlaybackActor;

#[derive(Parser)]
#[command(name = "mocap-client")]
#[command(about = "Plays live face tracking back on a bone rig")]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1", help = "Motion server host")]
    server: String,

    #[arg(short, long, default_value_t = mocap::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value = "0.0.0.0:0", help = "Local address to bind")]
    bind: SocketAddr,

    #[arg(short, long, help = "Rig JSON file (skeleton and blend shapes)")]
    rig: Option<PathBuf>,

    #[arg(long, help = "Write the demo rig as JSON to this path and exit")]
    export_demo_rig: Option<PathBuf>,

    #[arg(long, default_value_t = 2.0)]
    heartbeat_interval: f32,

    #[arg(long, default_value_t = 10.0)]
    heartbeat_timeout: f32,

    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, help = "Stop after this many seconds")]
    duration: Option<f32>,

    #[arg(long, help = "Mirror the performance left to right")]
    flip: bool,

    #[arg(long, default_value_t = 0.1, help = "Head rotation smoothing in [0, 1]")]
    head_smooth: f32,

    #[arg(long, default_value_t = 0.1, help = "Blend shape weight smoothing in [0, 1]")]
    weight_smooth: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Some(path) = &args.export_demo_rig {
        let json = rig::demo_rig()?.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Demo rig written to {}", path.display());
        return Ok(());
    }

    let session_config = session_config(&args)?;
    let client_config = ClientConfig {
        tick_rate: args.tick_rate,
        run_duration: args.duration.map(|secs| seconds("--duration", secs)).transpose()?,
        ..Default::default()
    };
    let actor_config = ActorConfig {
        head_rotation_smooth: args.head_smooth.clamp(0.0, 1.0),
        blend_shape_smooth: args.weight_smooth.clamp(0.0, 1.0),
        flip_horizontally: args.flip,
        ..Default::default()
    };

    let rig = rig::load_rig(args.rig.as_deref())?;
    let (skeleton, face_root) = rig.build()?;
    let face_bones = skeleton.descendants(face_root);
    let actor = FaceActor::new(skeleton, face_root, face_bones, rig.blend_shapes, actor_config);
    let actors: Vec<Box<dyn MotionActor>> = vec![Box::new(PlaybackActor::new(
        actor,
        client_config.report_interval,
    ))];

    let session = Session::start(&session_config, HandlerRegistry::with_defaults(), actors)
        .context("Failed to open session")?;
    log::info!(
        "Listening on {} for {}",
        session.local_addr(),
        session.server_addr()
    );

    run(session, &client_config)
}

fn session_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let server_addr = (args.server.as_str(), args.port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}:{}", args.server, args.port))?
        .next()
        .with_context(|| format!("No address for {}:{}", args.server, args.port))?;

    let mut config = SessionConfig::with_server(server_addr);
    config.bind_addr = args.bind;
    config.heartbeat_interval = seconds("--heartbeat-interval", args.heartbeat_interval)?;
    config.heartbeat_timeout = seconds("--heartbeat-timeout", args.heartbeat_timeout)?;
    Ok(config)
}

fn seconds(flag: &str, value: f32) -> anyhow::Result<Duration> {
    match Duration::try_from_secs_f32(value) {
        Ok(duration) => Ok(duration),
        Err(e) => bail!("{flag} {value}: {e}"),
    }
}

fn run(mut session: Session, config: &ClientConfig) -> anyhow::Result<()> {
    let interval = config.tick_interval();
    let started = Instant::now();
    let mut next_tick = started;

    loop {
        match session.tick() {
            SessionEvent::None => {}
            SessionEvent::ConnectionLost => {
                bail!("Lost connection to {}", session.server_addr());
            }
            SessionEvent::ServerQuit | SessionEvent::ServerDisconnected => {
                log::info!("Server closed the session");
                return Ok(());
            }
        }

        if config
            .run_duration
            .is_some_and(|limit| started.elapsed() >= limit)
        {
            log::info!("Run time elapsed, disconnecting");
            session.shutdown();
            return Ok(());
        }

        next_tick += interval;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    }
}
