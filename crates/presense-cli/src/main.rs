use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use presense_core::{ApiClient, AttendanceClient, CameraSession, ClientOptions};
use presense_hw::{provider, DeviceMap, V4lProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "presense", about = "Presense attendance verification client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame and verify it against the match endpoint
    Verify,
    /// Run live verification until interrupted
    Live {
        /// Stop automatically after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Start the camera and report the negotiated session
    Camera {
        /// Facing mode to request (front or back)
        #[arg(long, default_value = "front")]
        facing: String,
    },
    /// List available capture devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Verify => run_verify(config).await,
        Commands::Live { duration_secs } => run_live(config, duration_secs).await,
        Commands::Camera { facing } => run_camera(config, &facing),
        Commands::Devices => {
            let devices = provider::list_capture_devices();
            if devices.is_empty() {
                println!("no capture devices found");
            }
            for d in devices {
                println!("{}\t{}\t{}", d.path, d.name, d.driver);
            }
            Ok(())
        }
    }
}

fn build_client(config: &Config) -> Result<AttendanceClient> {
    let provider = Arc::new(V4lProvider::new(DeviceMap {
        front: config.front_device.clone(),
        back: config.back_device.clone(),
    }));
    let api = ApiClient::new(config.match_url.as_str(), config.stream_url.as_str())
        .context("failed to build the upload client")?;
    let options = ClientOptions {
        initial_facing: config.initial_facing,
        jpeg_quality: config.jpeg_quality,
        strategy: config.fullscreen_strategy,
    };
    // Headless surface: the platform strategy degrades to absent-capability.
    Ok(AttendanceClient::new(provider, api, None, options))
}

async fn run_verify(config: Config) -> Result<()> {
    let client = build_client(&config)?;
    let outcome = client.verify().await;
    println!("{}", outcome.message);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_live(config: Config, duration_secs: Option<u64>) -> Result<()> {
    let mut client = build_client(&config)?;
    let mut feed = client.subscribe_status();

    // Render the status feed: the core never prints, it only publishes.
    let printer = tokio::spawn(async move {
        while feed.changed().await.is_ok() {
            let status = feed.borrow_and_update().clone();
            println!("[{}] {}", if status.ok { "ok" } else { "--" }, status.message);
        }
    });

    client.start_live().await;

    match duration_secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
        }
    }

    client.stop_live().await;
    // Let the final status line reach the printer before exiting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    printer.abort();
    Ok(())
}

fn run_camera(config: Config, facing_arg: &str) -> Result<()> {
    let facing = config::parse_facing(facing_arg)
        .with_context(|| format!("invalid facing mode: {facing_arg}"))?;

    let provider = Arc::new(V4lProvider::new(DeviceMap {
        front: config.front_device.clone(),
        back: config.back_device.clone(),
    }));
    let mut session = CameraSession::new(provider, facing);
    let resolved = session.start(facing)?;
    println!("camera running (requested {facing}, resolved {resolved})");

    let frame = session.grab()?;
    println!("captured {}x{} frame (sequence {})", frame.width, frame.height, frame.sequence);

    session.stop();
    Ok(())
}
