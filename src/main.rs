mod app;
mod assistant;
mod config;
mod input;
mod reveal;
mod store;
mod theme;
mod ui;
mod wrap;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, AppEvent};
use config::AppConfig;
use reveal::{RevealDelay, TickScheduler, TickTicket, TokioScheduler, Typewriter};

/// How often the UI does housekeeping when nothing else happens
const UI_TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "cognit-studio")]
#[command(version = "0.1.0")]
#[command(about = "A terminal chat shell with typewriter-style replies")]
struct Args {
    /// Type TEXT out on stdout and exit, no TUI
    #[arg(short, long, value_name = "TEXT")]
    reveal: Option<String>,

    /// With --reveal, print one JSON object per tick instead of animating
    #[arg(long, requires = "reveal")]
    json: bool,

    /// Per-character delay in milliseconds (overrides config, clamped to >= 1)
    #[arg(short, long, allow_negative_numbers = true)]
    delay: Option<i64>,

    /// Use this config file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref());
    if let Some(ms) = args.delay {
        config.reveal.delay_ms = ms;
    }

    // Handle CLI-only commands
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    if let Some(text) = args.reveal {
        return run_reveal(&text, config.reveal.delay(), args.json).await;
    }

    // Run TUI
    run_tui(config).await
}

/// Headless typewriter: same timer chain as the TUI, printed to stdout
async fn run_reveal(text: &str, delay: RevealDelay, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<TickTicket>();
    let mut typewriter = Typewriter::new(TokioScheduler::new(tx, |ticket| ticket), delay);
    typewriter.set_target(text);

    let mut stdout = io::stdout();
    let mut tick = 0u64;
    let mut printed = 0usize;

    if json {
        print_frame(&mut stdout, tick, &typewriter)?;
    }

    while typewriter.has_pending_tick() {
        let Some(ticket) = rx.recv().await else { break };
        if !typewriter.on_tick(ticket) {
            continue;
        }
        tick += 1;

        if json {
            print_frame(&mut stdout, tick, &typewriter)?;
        } else {
            // Only ever grows here, so print just the new part
            let shown = typewriter.displayed();
            write!(stdout, "{}", &shown[printed..])?;
            stdout.flush()?;
            printed = shown.len();
        }
    }

    if !json {
        writeln!(stdout)?;
    }
    Ok(())
}

fn print_frame<S: TickScheduler>(
    out: &mut impl Write,
    tick: u64,
    typewriter: &Typewriter<S>,
) -> Result<()> {
    let frame = serde_json::json!({
        "tick": tick,
        "cursor": typewriter.cursor(),
        "displayed": typewriter.displayed(),
        "revealing": typewriter.is_revealing(),
    });
    writeln!(out, "{}", serde_json::to_string(&frame)?)?;
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::unbounded_channel();
    spawn_terminal_reader(tx.clone());
    spawn_ui_ticker(tx.clone());

    // Create app state
    let mut app = App::new(config, tx);
    tracing::info!("Starting cognit-studio");

    // Main loop
    let result = run_app(&mut terminal, &mut app, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut rx: mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let event = rx.recv().await.context("event channel closed")?;

        // Handle the event and catch any errors to prevent crashes
        if let Err(e) = app.handle_event(event) {
            tracing::error!("Event handling failed: {}", e);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Forward terminal input into the event channel until the app goes away
fn spawn_terminal_reader(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(UI_TICK) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.send(AppEvent::Terminal(ev)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to poll terminal: {}", e);
                    break;
                }
            }
        }
    });
}

fn spawn_ui_ticker(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UI_TICK);
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}
