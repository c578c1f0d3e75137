use clap::Parser;
use morph::cli::{Cli, LogLevel};
use morph::config::Config;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("morph {} started with log level: {:?}", morph::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = Config::config_dir() {
        return config_dir.join("morph.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".morph").join("morph.log");
    }
    PathBuf::from("morph.log")
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();
    if let Err(e) = cli.lift_log_level() {
        e.exit();
    }

    let log_guard = setup_logging(cli.log_level);
    let code = morph::app::run(cli).await;

    // Flush buffered log lines before exiting
    drop(log_guard);
    std::process::exit(code);
}
