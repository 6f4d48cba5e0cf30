use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use docqa_core::{BackendClient, Config, DocumentApi, Route};
use tokio::sync::mpsc;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version, about = "Upload documents and ask questions about them")]
struct Cli {
    /// Backend base url, e.g. http://127.0.0.1:8000/api
    #[arg(short, long)]
    backend_url: Option<String>,
    /// Screen to open with, as a path ("/" or "/qa?doc=<id>")
    #[arg(short, long, conflicts_with = "doc")]
    route: Option<String>,
    /// Open the question screen with this document selected
    #[arg(long)]
    doc: Option<String>,
    /// Log at debug level
    #[arg(long)]
    debug: bool,
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the effective settings back to the config file before starting
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn initial_route(&self) -> Result<Route> {
        if let Some(doc) = &self.doc {
            return Ok(Route::Ask { doc: Some(doc.clone()) });
        }
        match &self.route {
            Some(path) => Route::parse(path).with_context(|| format!("invalid route {path:?}")),
            None => Ok(Route::Documents),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    if cli.save_config {
        match &cli.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
    }

    let log_path = logging::init(cli.debug, config.log_level.as_deref(), config.log_file.as_deref())?;
    tracing::info!(
        backend = %config.normalized_backend_url(),
        log = ?log_path,
        "Starting docqa"
    );

    let route = cli.initial_route()?;
    let client = BackendClient::with_timeout(&config.normalized_backend_url(), config.request_timeout())
        .context("invalid backend url")?;
    let api: Arc<dyn DocumentApi> = Arc::new(client);

    let (manager_tx, manager_rx) = mpsc::unbounded_channel();
    let (console_tx, console_rx) = mpsc::unbounded_channel();

    // Create app state
    let mut app = App::new(api, manager_tx, console_tx, &config);
    app.navigate(route);

    // Setup terminal
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new(Duration::from_millis(50));
    events.forward(manager_rx, AppEvent::Manager);
    events.forward(console_rx, AppEvent::Console);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!(error = %e, "docqa exited with an error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
