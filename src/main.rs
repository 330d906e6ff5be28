//! Dial Shell - focus/navigation runtime for rotary-dial displays
//!
//! Reads device input, registry updates and application messages as JSON
//! lines on stdin and writes frame operations on stdout. Logs go to stderr
//! and a daily rolling file in the state directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dial_shell::backend;
use dial_shell::shell::apps::LauncherState;
use dial_shell::ShellConfig;

#[derive(Parser, Debug)]
#[command(name = "dial-shell")]
#[command(about = "Focus and navigation shell for rotary-dial displays", long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/dial-shell/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the state directory (logs, launcher order)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(ShellConfig::default_path);
    let mut config = ShellConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(dir) = args.state_dir {
        config.state_dir = Some(dir);
    }

    let state_dir = config.resolved_state_dir();
    std::fs::create_dir_all(&state_dir).ok();

    // Log panics before crashing
    let crash_log = state_dir.join("crash.log");
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&crash_log)
        {
            use std::io::Write;
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));

    // stdout carries frame operations, so nothing logs there
    let file_appender = rolling::daily(&state_dir, "shell.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if args.debug {
        "debug,dial_shell=debug"
    } else {
        "warn,dial_shell=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(
        state_dir = %state_dir.display(),
        config = %config_path.display(),
        "Dial shell starting"
    );

    let state_path = LauncherState::path_in(&state_dir);
    backend::stdio::run(config, Some(state_path))
}
