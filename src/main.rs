mod app;
mod catalog;
mod cli;
mod clipboard;
mod config;
mod dispatch;
mod error;
mod gateway;
mod input;
mod model;
mod resolver;
mod selection;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use catalog::LoadOutcome;
use chrono::{DateTime, Local};
use clap::Parser;
use cli::CliArgs;
use clipboard::ClipboardAdapter;
use config::RuntimeConfig;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use dispatch::{Dispatcher, ExecutionBridge, HostShellBridge};
use error::LabError;
use futures::StreamExt;
use gateway::CatalogGateway;
use model::LabImage;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug)]
struct CatalogLoadEvent {
    result: std::result::Result<Vec<LabImage>, LabError>,
    finished_at: DateTime<Local>,
}

struct Services {
    gateway: CatalogGateway,
    dispatcher: Dispatcher,
    clipboard: ClipboardAdapter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let config = RuntimeConfig::load(&args)?;
    match &config.source {
        Some(source) => info!("loaded config from {source}"),
        None => debug!("no config file found, using defaults"),
    }

    let dispatcher = match HostShellBridge::probe(&config.bridge) {
        Some(bridge) => Dispatcher::new(Some(Box::new(bridge) as Box<dyn ExecutionBridge>)),
        None => Dispatcher::unavailable(),
    };
    match dispatcher.bridge_name() {
        Some(name) => info!("execution bridge ready: {name}"),
        None if !config.bridge.enabled => info!("execution bridge disabled by configuration"),
        None => warn!(
            "execution bridge program {:?} not found, running commands is unavailable",
            config.bridge.program
        ),
    }

    let mut app = App::new(
        ui::source_label(&config.catalog),
        dispatcher.bridge_name().map(str::to_string),
    );
    let mut services = Services {
        gateway: CatalogGateway::new(config.catalog),
        dispatcher,
        clipboard: ClipboardAdapter::system(),
    };

    run(&mut app, &mut services).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The terminal belongs to the TUI, so logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, services: &mut Services) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, services).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(terminal: &mut TuiTerminal, app: &mut App, services: &mut Services) -> Result<()> {
    let mut reader = EventStream::new();
    let (load_tx, mut load_rx) = mpsc::unbounded_channel::<CatalogLoadEvent>();

    app.begin_catalog_load();
    spawn_catalog_load(&services.gateway, load_tx.clone());

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(app, services, command, &load_tx);
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_load = load_rx.recv() => {
                if let Some(event) = maybe_load {
                    apply_catalog_event(app, event);
                }
            }
        }
    }

    Ok(())
}

fn execute_app_command(
    app: &mut App,
    services: &mut Services,
    command: AppCommand,
    load_tx: &mpsc::UnboundedSender<CatalogLoadEvent>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::LoadCatalog => spawn_catalog_load(&services.gateway, load_tx.clone()),
        AppCommand::Execute {
            image_id,
            kind,
            resolved,
        } => {
            let result = services.dispatcher.execute(&resolved, kind);
            match &result {
                Ok(()) => info!(
                    "dispatched {} command for {image_id} ({})",
                    kind.label(),
                    resolved.variant
                ),
                Err(error) => warn!("dispatch for {image_id} rejected: {error}"),
            }
            app.record_dispatch(kind, result);
        }
        AppCommand::Copy {
            image_id,
            kind,
            command,
        } => {
            let result = services.clipboard.copy(&command);
            if let Err(error) = &result {
                warn!("copy for {image_id} failed: {error}");
            } else {
                debug!("copied {} command for {image_id}", kind.label());
            }
            app.record_copy(kind, result);
        }
    }
}

fn spawn_catalog_load(gateway: &CatalogGateway, tx: mpsc::UnboundedSender<CatalogLoadEvent>) {
    let gateway = gateway.clone();
    tokio::spawn(async move {
        let result = gateway.fetch_images().await;
        let _ = tx.send(CatalogLoadEvent {
            result,
            finished_at: Local::now(),
        });
    });
}

fn apply_catalog_event(app: &mut App, event: CatalogLoadEvent) {
    if let Err(error) = &event.result {
        warn!("{error}");
    }

    match app.apply_catalog_load(event.result, event.finished_at) {
        LoadOutcome::Replaced {
            images,
            dropped_duplicates,
        } => {
            info!("catalog loaded with {images} lab images ({dropped_duplicates} duplicates dropped)");
        }
        LoadOutcome::RetainedPrevious { images } => {
            debug!("keeping {images} previously loaded lab images");
        }
    }
}
