use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use tvgrid::SortClickMode;

mod controller;
mod domain;
mod model;
mod ui;

use controller::Controller;
use domain::{TVConfig, TVError, parse_sort_arg};
use model::{Model, Status};
use ui::TableUI;

/// Terminal viewer for CSV, Parquet and Arrow files with sortable,
/// hideable and resizable columns.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to open, `~` and environment variables are expanded
    path: String,

    /// Upper bound for the initial width of a column, in terminal cells
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Plain header clicks add to the sort instead of replacing it
    #[arg(long)]
    multi_sort: bool,

    /// Initial sort key as COLUMN[:asc|:desc], may be repeated
    #[arg(short, long = "sort")]
    sort: Vec<String>,

    /// Log file, the level is taken from RUST_LOG
    #[arg(long, default_value = "tvgrid.log")]
    log_file: PathBuf,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = run(args);
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn setup_logging(path: &PathBuf) -> Result<(), TVError> {
    let file = File::create(path)?;
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .map_err(|e| TVError::LoggingSetup(e.to_string()))
}

fn config_from_args(args: &Args) -> Result<TVConfig, TVError> {
    let path = shellexpand::full(&args.path)
        .map_err(|e| TVError::LoadingFailed(e.to_string()))?
        .into_owned();
    let initial_sort = args
        .sort
        .iter()
        .map(|s| parse_sort_arg(s))
        .collect::<Result<Vec<_>, _>>()?;
    let click_mode = if args.multi_sort {
        SortClickMode::Accumulate
    } else {
        SortClickMode::Collapse
    };

    Ok(TVConfig {
        path: PathBuf::from(path),
        event_poll_time: args.poll_ms,
        max_column_width: args.max_column_width,
        click_mode,
        initial_sort,
    })
}

fn run(args: Args) -> Result<(), TVError> {
    setup_logging(&args.log_file)?;
    let cfg = config_from_args(&args)?;
    info!("Starting tvgrid with {cfg:?}");

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut model = Model::load(&cfg, size.width as usize, size.height as usize)?;
    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;

        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        };
    }

    info!("Quitting");
    Ok(())
}
