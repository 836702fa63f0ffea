/// Tally Dashboard
///
/// Polls a vote tally (remote endpoint or simulated), shows ranked results
/// with percentages and refreshes on a countdown. `r` refreshes now, `q` quits.
use std::{error::Error, fs::File, io, sync::Mutex, time::Duration};

use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tally_dashboard::{
    render_dashboard, DashboardConfig, DashboardController, DataSourceKind, SharedView,
};
use tracing::{error, info};

/// Redraw cadence; the countdown only changes once per second
const FRAME_INTERVAL: Duration = Duration::from_millis(250);

/// Get log file path from TALLY_LOG_FILE env var (default: tally-dashboard.log)
fn get_log_file() -> String {
    std::env::var("TALLY_LOG_FILE").unwrap_or_else(|_| "tally-dashboard.log".to_string())
}

/// Initialize logging to a file so the terminal UI stays clean
fn init_logging() -> io::Result<()> {
    let file = File::create(get_log_file())?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Raw mode + alternate screen, undone on drop (unwinding included)
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            cursor::Show
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    let config = DashboardConfig::from_env();
    let source = DataSourceKind::from_config(&config);
    info!(source = source.name(), ?config, "Tally dashboard starting");

    let view = SharedView::new();
    let controller = DashboardController::new(&config, source, view.clone());

    // Most panics are caught and shown as an internal error, so only log them
    // here; the terminal guard restores the screen if one escapes main
    std::panic::set_hook(Box::new(|panic_info| {
        error!(%panic_info, "Panic");
    }));

    let terminal_guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    // Initial poll runs in the background; its outcome lands in the view
    let _ = controller.start();

    let result = run_ui(&mut terminal, &controller, &view);

    controller.stop();
    drop(terminal_guard);

    info!("Tally dashboard stopped");
    result
}

fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &DashboardController<DataSourceKind, SharedView>,
    view: &SharedView,
) -> Result<(), Box<dyn Error>> {
    loop {
        // A panicking frame leaves the internal-error placeholder for the next one
        match view.run_guarded(|| ui_step(terminal, controller, view)) {
            Some(Ok(true)) | None => {}
            Some(Ok(false)) => return Ok(()),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

/// Draw one frame and handle at most one key press. `Ok(false)` means quit
fn ui_step(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &DashboardController<DataSourceKind, SharedView>,
    view: &SharedView,
) -> io::Result<bool> {
    let snapshot = view.snapshot();
    terminal.draw(|f| render_dashboard(f, f.area(), &snapshot))?;

    if event::poll(FRAME_INTERVAL)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                    KeyCode::Char('r') => {
                        let _ = controller.manual_refresh();
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(true)
}
