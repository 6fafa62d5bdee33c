//! icoscene terminal demo - rotating icosahedron with orbit controls
//!
//! Controls:
//!   - Mouse drag / Arrow Keys: Orbit the camera
//!   - Right drag: Pan
//!   - Wheel / +/-: Zoom
//!   - P: Toggle damping
//!   - Q/ESC: Quit

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use icoscene_core::SceneConfig;
use icoscene_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icoscene-terminal", about = "Rotating icosahedron rendered in the terminal")]
struct Cli {
    /// JSON scene config; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Icosahedron subdivision level
    #[arg(long)]
    detail: Option<u32>,

    /// Disable inertial damping of camera motion
    #[arg(long)]
    no_damping: bool,

    /// Fraction of pending camera motion applied per frame
    #[arg(long)]
    damping_factor: Option<f32>,

    /// One sample per cell instead of 2x2
    #[arg(long)]
    no_antialias: bool,

    /// Render without a terminal UI and print the last frame
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value = "1")]
    frames: u64,

    /// Headless surface width in cells
    #[arg(long, default_value = "80")]
    width: usize,

    /// Headless surface height in cells
    #[arg(long, default_value = "24")]
    height: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn scene_config(&self) -> anyhow::Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SceneConfig::default(),
        };

        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(detail) = self.detail {
            config.detail = detail;
        }
        if let Some(factor) = self.damping_factor {
            config.damping_factor = factor;
        }
        if self.no_damping {
            config.enable_damping = false;
        }
        if self.no_antialias {
            config.antialias = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    // The interactive UI owns the screen, so stderr only gets errors there.
    let default = match (cli.verbose, cli.headless || cli.log_file.is_some()) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "error",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = cli.scene_config()?;
    tracing::info!(?config, "starting icoscene");

    if cli.headless {
        let mut app = TerminalApp::with_size(&config, cli.width, cli.height)?;
        let frame = app.render_headless(cli.frames)?;
        println!("{frame}");
        return Ok(());
    }

    // Run the terminal app
    let mut app = TerminalApp::new(&config)?;
    app.run()?;

    Ok(())
}
