//! Hummingbird — entry point.
//!
//! ```text
//! hummingbird -o dots.mp4 < frames.bin        Bit-packed frames from stdin
//! hummingbird -o dots.mp4 --grey -i frames    Grey frames from a file
//! hummingbird --framerate 360 ...             Each frame lasts 4 sub-frames
//! hummingbird --config <path>                 Load a custom config TOML
//! hummingbird --gen-config                    Write default config to stdout
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hummingbird_cli::config::ToolConfig;
use hummingbird_cli::input::{FrameReader, InputMode};
use hummingbird_core::{EncoderSink, FrameGenerator, HummingbirdError, MAXIMUM_FRAMERATE};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "hummingbird",
    about = "Pack binary frames into a 1440 Hz DLP projector video"
)]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "hummingbird.toml")]
    config: PathBuf,

    /// Video file to produce (overrides the config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Logical frames per second; must divide 1440 (overrides the config).
    #[arg(short, long)]
    framerate: Option<u32>,

    /// Read one byte per pixel (> 127 = on) instead of one bit per pixel.
    #[arg(short, long)]
    grey: bool,

    /// Raw frame file; stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        println!("{}", ToolConfig::default_toml()?);
        return Ok(());
    }

    // Load config.
    let (mut config, note) = ToolConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    if let Some(note) = note {
        note.log();
    }

    if let Some(output) = cli.output {
        config.generator.output = output;
    }
    if let Some(framerate) = cli.framerate {
        config.generator.framerate = framerate;
    }
    let mode = if cli.grey || config.input.grey {
        InputMode::Grey
    } else {
        InputMode::Bits
    };

    info!("hummingbird v{}", env!("CARGO_PKG_VERSION"));
    info!("output: {}", config.generator.output.display());
    info!(
        "framerate: {} fps ({} of {MAXIMUM_FRAMERATE} sub-frames each)",
        config.generator.framerate,
        MAXIMUM_FRAMERATE / config.generator.framerate.max(1)
    );
    info!("input mode: {mode:?}");

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    run(config, input, mode)?;
    Ok(())
}

/// Stream every input frame through the generator and wait for the encoder.
fn run(config: ToolConfig, input: impl Read, mode: InputMode) -> Result<(), HummingbirdError> {
    let geometry = config.generator.geometry;
    let framerate = config.generator.framerate as u64;
    let mut generator = FrameGenerator::spawn(config.generator)?;
    let reader = FrameReader::new(input, mode, geometry.logical_width, geometry.logical_height);

    for frame in reader {
        generator.push(&frame?)?;
        let pushed = generator.frames_pushed();
        if pushed % framerate == 0 {
            debug!("{} s of stimulus packed", pushed / framerate);
        }
    }

    let frames = generator.frames_pushed();
    let macro_frames = generator.macro_frames();
    let mut process = generator.finish()?;
    info!("waiting for encoder (pid {})", process.id());
    let status = process.wait()?;

    if !status.success() {
        let exit = process.try_exit()?.unwrap_or_default();
        warn!("encoder failed: {exit}");
        return Err(HummingbirdError::EncoderTerminated(exit));
    }
    info!("{frames} frames packed into {macro_frames} video frames");
    Ok(())
}
