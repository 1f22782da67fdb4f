use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod column;
mod controller;
mod domain;
mod inputter;
mod list_view;
mod model;
mod pages;
mod record;
mod reorder;
mod source;
mod toolbar;
mod ui;
mod visibility;

use controller::Controller;
use domain::{LVConfig, LVError};
use model::{Model, Status};
use ui::LVUI;

/// Browse course administration listings in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding courses.csv, modules.csv, ...
    #[arg(short, long, default_value = "tests/fixtures")]
    data_dir: String,

    /// Listing to open first, e.g. /admin/modules
    #[arg(short, long, default_value = "/admin/courses")]
    view: String,

    #[arg(short, long, default_value_t = 10)]
    page_size: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    #[arg(long, default_value_t = 32)]
    max_column_width: usize,

    #[arg(long, default_value = "lv.log")]
    log_file: String,
}

fn expand(path: &str) -> Result<PathBuf, LVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| LVError::loading_failed(format!("cannot expand {path}: {e}")))
}

impl Cli {
    fn config(&self) -> Result<LVConfig, LVError> {
        Ok(LVConfig {
            event_poll_time: self.poll_ms,
            max_column_width: self.max_column_width,
            data_dir: expand(&self.data_dir)?,
            initial_view: self.view.clone(),
            page_size: self.page_size.max(1),
        })
    }
}

fn init_logging(log_file: &str) -> Result<(), LVError> {
    let file = File::create(expand(log_file)?)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lv=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_file) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(&cli);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("lv failed: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: &Cli) -> Result<(), LVError> {
    let cfg = cli.config()?;
    info!("Starting lv with {cfg:?}");

    let mut model = Model::init(&cfg)?;
    let ui = LVUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&mut model, f))?;

        if model.status == Status::LOADING {
            model.load_current_page();
            continue;
        }

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Bye");
    Ok(())
}
