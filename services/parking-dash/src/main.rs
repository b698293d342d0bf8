// services/parking-dash/src/main.rs
//
// Terminal dashboard for parking-spot occupancy
//
// Run with: cargo run --bin parking-dash -- --demo

use std::fs::OpenOptions;
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parking_dash::api::{ApiClient, ParkingDataSource};
use parking_dash::config::{load_config, DEFAULT_CONFIG_PATH};
use parking_dash::layout::ViewMode;
use parking_dash::mock::MockDataSource;
use parking_dash::poller::Poller;
use parking_dash::state::{DashboardState, LogLevel};
use parking_dash::ui::draw_ui;
use parkkit::config::{DashboardConfig, ObservabilityConfig};

#[derive(Parser, Debug)]
#[command(name = "parking-dash")]
#[command(about = "Terminal dashboard for parking-spot occupancy")]
#[command(version)]
struct Args {
    /// Configuration file (YAML). Missing files fall back to defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Run against the in-memory demo store (no backend required)
    #[arg(long, short)]
    demo: bool,

    /// Backend base URL, overrides api.base_url
    #[arg(long, env = "PARKING_API_URL")]
    api_url: Option<String>,

    /// Camera selected at startup
    #[arg(long)]
    camera: Option<String>,

    /// Initial spot layout: grid, rows or street
    #[arg(long, default_value = "rows")]
    mode: ViewMode,

    /// UI redraw interval in milliseconds
    #[arg(long, default_value = "100")]
    tick_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(camera) = &args.camera {
        config.cameras.initial = Some(camera.clone());
    }

    init_tracing(&config.observability)?;
    info!(demo = args.demo, base_url = %config.api.base_url, "Starting parking-dash");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let source: Arc<dyn ParkingDataSource> = if args.demo {
        Arc::new(MockDataSource::new().with_latency(Duration::from_millis(150)))
    } else {
        Arc::new(ApiClient::from_config(&config.api)?)
    };
    let poller = Poller::new(runtime.handle().clone(), source);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Run app
    let result = run_app(&mut terminal, &args, &config, poller);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    runtime.shutdown_timeout(Duration::from_millis(500));
    info!("parking-dash stopped");

    result
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_tracing(observability: &ObservabilityConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&observability.log_file)
        .with_context(|| format!("Failed to open log file {}", observability.log_file))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "parking_dash={level},parkkit={level}",
                    level = observability.log_level
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
    config: &DashboardConfig,
    mut poller: Poller,
) -> Result<()> {
    let mut state = DashboardState::new(config);
    state.set_view_mode(args.mode);

    let tick_rate = Duration::from_millis(args.tick_ms);

    if args.demo {
        state.add_log(LogLevel::Info, "Dashboard started in DEMO mode");
    } else {
        state.add_log(
            LogLevel::Info,
            &format!("Dashboard started, polling {}", config.api.base_url),
        );
    }

    state.start(Instant::now());

    loop {
        // Dispatch fetches whose timers fired, then fold in what came back
        let now = Instant::now();
        for request in state.due_requests(now) {
            poller.dispatch(request);
        }
        for completion in poller.drain() {
            state.apply(completion, Instant::now());
        }

        terminal.draw(|frame| draw_ui(frame, &state, args.demo))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let now = Instant::now();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.teardown();
                return Ok(());
            }
            KeyCode::Tab => state.next_camera(now),
            KeyCode::BackTab => state.prev_camera(now),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                state.select_camera(index, now);
            }
            KeyCode::Char('m') => state.cycle_view_mode(),
            KeyCode::Char('g') => state.set_view_mode(ViewMode::Grid),
            KeyCode::Char('r') => state.set_view_mode(ViewMode::Rows),
            KeyCode::Char('s') => state.set_view_mode(ViewMode::Street),
            KeyCode::Left => state.move_cursor(-1),
            KeyCode::Right => state.move_cursor(1),
            KeyCode::Char('t') => match state.toggle_request() {
                Some(request) => poller.dispatch(request),
                None => state.add_log(LogLevel::Warn, "No spot selected"),
            },
            KeyCode::F(5) | KeyCode::Char('R') => state.refresh_all(now),
            KeyCode::Up => state.scroll_up(),
            KeyCode::Down => state.scroll_down(),
            _ => {}
        }
    }
}
