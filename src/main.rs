use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use clip_collage::{
    backend::{Backend, ProjectBackend, RenderBackend},
    config::Config,
    media::probe,
    pipeline::CollageEngine,
    schedule::{Policy, Spacing},
};

#[derive(Parser)]
#[command(
    name = "clip-collage",
    version,
    about = "Make a randomized highlight collage of videos",
    long_about = "Clip-collage cuts reproducible random clips from a pile of footage and \
                  assembles them into a music-backed highlight video, or into a Shotcut \
                  project file for further editing."
)]
struct Cli {
    /// File path of the audio track
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Clip period in seconds (typically the soundtrack's beat period)
    #[arg(short, long)]
    period: f64,

    /// How often to change the video (scales the period)
    #[arg(short, long)]
    multiplier: Option<f64>,

    /// Length of the resulting video in seconds (defaults to the audio length)
    #[arg(short, long)]
    length: Option<f64>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<String>,

    /// Shuffle clips instead of playing them in footage order
    #[arg(long)]
    shuffle: bool,

    /// Rotate the result by 180 degrees
    #[arg(long)]
    flip: bool,

    /// Target video bitrate
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Write a Shotcut project file instead of rendering a video
    #[arg(long)]
    project: bool,

    /// The name of the output file
    #[arg(short, long, default_value = "result.mp4")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Video files to process
    #[arg(required = true)]
    videos: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting clip-collage v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    // Command-line knobs win over the configuration file
    if let Some(multiplier) = cli.multiplier {
        config.schedule.multiplier = multiplier;
    }
    if let Some(seed) = &cli.seed {
        config.schedule.seed = seed.clone();
    }
    if cli.shuffle {
        config.schedule.shuffle = true;
    }
    if let Some(bitrate) = &cli.bitrate {
        config.render.bitrate = bitrate.clone();
    }
    if cli.flip {
        config.render.rotate = true;
    }
    config.validate()?;

    let period = cli.period * config.schedule.multiplier;
    info!("Using clip period of {:.2}s", period);

    let total_length = match cli.length {
        Some(length) => length,
        None => {
            let audio = cli.audio.as_ref().ok_or_else(|| {
                anyhow::anyhow!("either --length or --audio is required to size the collage")
            })?;
            let duration = probe::probe_duration(audio)?;
            info!("Sizing collage to the audio track: {:.2}s", duration);
            duration
        }
    };

    let spacing = if config.schedule.double_spacing {
        Spacing::DoublePeriod
    } else {
        Spacing::Period
    };
    let policy = Policy::new(period, total_length)
        .with_seed(config.schedule.seed.clone())
        .with_shuffle(config.schedule.shuffle)
        .with_spacing(spacing)
        .with_max_attempts(config.schedule.max_attempts);

    let mut backend: Box<dyn Backend> = if cli.project {
        Box::new(ProjectBackend::new())
    } else {
        let audio = cli.audio.clone().ok_or_else(|| {
            anyhow::anyhow!("--audio is required when rendering a video")
        })?;
        Box::new(RenderBackend::new(config.render.clone(), audio))
    };

    let engine = CollageEngine::new(config);
    engine
        .assemble(&cli.videos, &policy, backend.as_mut(), &cli.output)
        .await?;

    Ok(())
}
