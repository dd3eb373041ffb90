//! Face pan tracker: follows a face with a stepper-driven pan mount.

use anyhow::{bail, Context, Result};
use clap::Parser;
use face_pan_tracker::{
    actuator::{create_actuator, ActuatorLink},
    config::Config,
    control::{ControlLoop, SessionStats, StopSignal},
    vision::{FaceDetector, FrameSource, PassthroughDetector, SweepSource},
};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port of the stepper controller (e.g. /dev/ttyUSB0)
    #[arg(long)]
    port: Option<String>,

    /// Use the in-process actuator simulator instead of a serial port
    #[arg(long)]
    simulate: bool,

    /// Use a synthetic sweeping subject instead of the camera
    #[arg(long)]
    synthetic: bool,

    /// Camera index to use
    #[arg(long)]
    camera: Option<i32>,

    /// Dead-zone radius in pixels
    #[arg(long)]
    dead_zone: Option<i32>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Smooth the offset with the PID controller
    #[arg(long)]
    pid: bool,

    /// Stop after this many frames (0 = until interrupted)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face Pan Tracker");

    let config = build_config(&args)?;

    if let Some(path) = &args.write_config {
        config
            .to_file(path)
            .with_context(|| format!("Failed to write configuration to {path}"))?;
        info!("Configuration written to {path}");
        return Ok(());
    }

    if !args.simulate && config.serial.port.is_none() {
        bail!("--port is required unless --simulate is given");
    }

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current frame");
        handler_stop.request();
    })
    .context("Failed to install interrupt handler")?;

    let link = create_actuator(&config.serial, args.simulate)?;

    let stats = if args.synthetic {
        let source = SweepSource::new(config.camera.geometry(), 90).with_dropout(15);
        run_session(source, PassthroughDetector, link, &config, stop)?
    } else {
        run_camera(link, &config, stop)?
    };

    info!(
        "Processed {} frames: {} commands, {} without a face, {} in the dead zone, {} timeouts, {} rejected",
        stats.ticks, stats.commands, stats.no_face, stats.in_dead_zone, stats.timeouts, stats.rejected
    );
    Ok(())
}

/// Load the configuration file, if any, and apply command line overrides
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {path}");
            Config::from_file(path).with_context(|| format!("Failed to load config file {path}"))?
        }
        None => Config::default(),
    };

    if let Some(port) = &args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if let Some(dead_zone) = args.dead_zone {
        config.tracking.dead_zone = dead_zone;
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.tracking.max_ticks = max_ticks;
    }
    if args.pid {
        config.pid.enabled = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_session<S, D>(
    source: S,
    detector: D,
    link: Box<dyn ActuatorLink>,
    config: &Config,
    stop: StopSignal,
) -> Result<SessionStats>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
{
    let mut control = ControlLoop::new(source, detector, link, config)?.with_stop_signal(stop);
    control
        .run()
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("Tracking session failed in {stage} stage"))
        })
}

#[cfg(feature = "opencv")]
fn run_camera(link: Box<dyn ActuatorLink>, config: &Config, stop: StopSignal) -> Result<SessionStats> {
    use face_pan_tracker::vision::{CascadeFaceDetector, OpenCvCamera};

    let detector = CascadeFaceDetector::new(&config.detector)?;
    run_session(OpenCvCamera::new(&config.camera), detector, link, config, stop)
}

#[cfg(not(feature = "opencv"))]
fn run_camera(_link: Box<dyn ActuatorLink>, _config: &Config, _stop: StopSignal) -> Result<SessionStats> {
    bail!("Built without camera support; rebuild with `--features opencv` or use --synthetic")
}
