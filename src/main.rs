use flowpace::app::App;
use flowpace::engine::config::{load_config, AppConfig};
use flowpace::engine::error::load_file_safe;
use flowpace::engine::scheduler::{FrameScheduler, SystemClock};
use flowpace::reading::tokenizer::ContentKind;
use flowpace::ui::TuiManager;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG: &str = "flowpace.toml";
const USAGE: &str = "Usage: flowpace <file> [--config <path>]";

struct Args {
    content: PathBuf,
    config: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut content = None;
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("--config needs a path\n{USAGE}"))?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if content.is_none() => content = Some(PathBuf::from(arg)),
            _ => return Err(format!("Unexpected argument: {arg}\n{USAGE}")),
        }
    }

    Ok(Args {
        content: content.ok_or_else(|| USAGE.to_string())?,
        config,
    })
}

/// Logs go to a file; the terminal belongs to the reader. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    let config = load_config(&args.config)?;
    init_tracing(&config)?;
    info!(file = %args.content.display(), config = %args.config.display(), "Starting flowpace");

    let content = load_file_safe(&args.content)?;
    let kind = ContentKind::detect(&args.content, &content);

    let scheduler = Rc::new(FrameScheduler::new());
    let clock = Rc::new(SystemClock::new());
    let mut app = App::new(&config, scheduler.clone(), clock.clone())?;
    app.load(&content, kind)?;

    let mut tui = TuiManager::new()?;
    tui.run_event_loop(&mut app, &scheduler, clock.as_ref())?;

    Ok(())
}
