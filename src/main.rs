mod cache;
mod config;
mod error;
mod fonts;
mod foreground;
mod input;
mod metrics;
mod raster;
mod scheduler;
pub mod theme;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::LauncherConfig;
use error::LauncherError;
use fonts::FontSet;
use ui::Launcher;

/// Full-screen home-screen launcher for TV boxes.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (default: ~/.config/tvlauncher/config.json)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stay in a normal window instead of going fullscreen
    #[arg(long)]
    windowed: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => {
            info!("launcher exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<(), LauncherError> {
    let config = LauncherConfig::load(cli.config.as_deref())?;
    let fonts = FontSet::discover(&config)?;
    let size = iced::Size::new(config.screen_width as f32, config.screen_height as f32);

    let mut app = iced::application(Launcher::title, Launcher::update, Launcher::view)
        .subscription(Launcher::subscription)
        .theme(Launcher::theme)
        .default_font(fonts.text_font())
        .window(iced::window::Settings {
            size,
            decorations: cli.windowed,
            #[cfg(target_os = "linux")]
            platform_specific: iced::window::settings::PlatformSpecific {
                application_id: String::from("tvlauncher"),
                ..Default::default()
            },
            ..Default::default()
        });
    for font in fonts.all() {
        app = app.font(font.bytes.clone());
    }

    let (launcher, startup) = Launcher::new(config, &fonts, cli.windowed)?;
    app.run_with(move || (launcher, startup))?;
    Ok(())
}
