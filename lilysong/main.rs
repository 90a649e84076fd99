mod appearance;
mod bridge;
mod config;
mod error;
mod keys;
mod notify;
mod permission;
mod session;
#[cfg(feature = "shell")]
mod shell;
mod update;
mod window;

use crate::config::Config;
use crate::error::App;
use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lilysong", version, about = "Desktop shell for the Yandex Music web player")]
struct Args {
    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level written to the log file
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init(args: &Args) -> Result<Config, App> {
    let home_dir = std::env::var("HOME")?;
    let log_dir = format!("{home_dir}/.config/lilysong/logs");
    std::fs::create_dir_all(&log_dir)?;

    Logger::try_with_str(&args.log_level)?
        .log_to_file(FileSpec::default().directory(&log_dir))
        .rotate(
            Criterion::Size(1_000_000),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(3),
        )
        .duplicate_to_stderr(Duplicate::None)
        .start()?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{home_dir}/.config/lilysong/config.toml")));
    Config::load(&config_path)
}

#[cfg(not(feature = "shell"))]
#[tokio::main]
async fn main() -> Result<(), App> {
    use crate::permission::LogPrompt;
    use crate::session::Session;
    use crate::update::LogOnlyPrompt;
    use crate::window::NoWindow;
    use std::sync::Arc;

    let args = Args::parse();
    let config = init(&args)?;

    // Without a window system there is no page to drive; the session still
    // runs the media key and notification plumbing for external callers.
    let session = Session::start(
        &config,
        Arc::new(NoWindow),
        None,
        Box::new(LogPrompt),
        Box::new(LogOnlyPrompt),
    );

    tokio::signal::ctrl_c().await?;
    session.shutdown();
    std::process::exit(0);
}

#[cfg(feature = "shell")]
fn main() -> Result<(), App> {
    let args = Args::parse();
    let config = init(&args)?;
    shell::run(config)
}
