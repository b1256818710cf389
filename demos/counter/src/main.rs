//! Counter - Minimal flux-scope demo
//!
//! - State: What the app knows
//! - Actions: What can happen, registered on a `Flux`
//! - Scopes: `turbo` gates an extra handler that multiplies every step
//! - Store: Where state lives
//! - Main loop: Key -> Envelope -> Dispatch -> Render
//!
//! Keys: j/Down = decrement, k/Up = increment, t = toggle turbo, q = quit
//!
//! Set `FLUX_LOG=debug` (and redirect stderr) to see dispatch logs.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flux_scope::debug::ActionLoggerMiddleware;
use flux_scope::prelude::*;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Flex, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const TURBO: &str = "turbo";

// ============================================================================
// State - What the app knows
// ============================================================================

#[derive(Clone, Debug, Default)]
struct AppState {
    count: i64,
    last_step: i64,
}

// ============================================================================
// Actions - What can happen
// ============================================================================

struct Actions {
    step: ActionType<i64>,
    boost: ActionType<()>,
}

fn register(flux: &Flux<AppState>) -> Actions {
    let step = flux.add_action("step", |state: &mut AppState, by: i64| {
        state.count += by;
        state.last_step = by;
    });

    // Only runs while `turbo` is active: turns every step into ten
    let boost = flux.add_scoped_action(TURBO, TURBO, |state: &mut AppState, _: ()| {
        state.count += state.last_step * 9;
    });

    Actions { step, boost }
}

// ============================================================================
// Main - Setup terminal, run event loop, cleanup
// ============================================================================

fn init_tracing() {
    if std::env::var_os("FLUX_LOG").is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("FLUX_LOG"))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_tracing();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal).await;

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Forward key presses from crossterm until cancelled
fn spawn_key_poller(
    tx: mpsc::UnboundedSender<KeyEvent>,
    poll_timeout: Duration,
    loop_sleep: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = tokio::time::sleep(loop_sleep) => {
                    while event::poll(poll_timeout).unwrap_or(false) {
                        let Ok(event::Event::Key(key)) = event::read() else {
                            continue;
                        };
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if tx.send(key).is_err() {
                            tracing::debug!("key channel closed, stopping poller");
                            return;
                        }
                    }
                }
            }
        }
    })
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>) -> io::Result<()> {
    let flux = Flux::new(AppState::default());
    let actions = register(&flux);

    // Start with turbo off
    let reducer = flux.create_reducer_scoped(Vec::<String>::new());
    let logger = ActionLoggerMiddleware::new(ActionLoggerConfig::default())
        .active(std::env::var_os("FLUX_LOG").is_some());
    let mut store = StoreWithMiddleware::new(reducer, logger);

    // Every step is sent together with a boost; the boost only lands in turbo
    let step = flux.act((&actions.step, &actions.boost));

    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<KeyEvent>();
    let cancel_token = CancellationToken::new();
    let _handle = spawn_key_poller(
        key_tx,
        Duration::from_millis(10),
        Duration::from_millis(16),
        cancel_token.clone(),
    );

    let mut should_render = true;

    loop {
        if should_render {
            let turbo = flux.is_active(TURBO);
            let count = store.state().count;
            terminal.draw(|frame| {
                let area = frame.area();

                let [_, center, _] = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(5),
                    Constraint::Fill(1),
                ])
                .areas(area);

                let [_, center, _] = Layout::horizontal([
                    Constraint::Fill(1),
                    Constraint::Length(30),
                    Constraint::Fill(1),
                ])
                .flex(Flex::Center)
                .areas(center);

                let (title, color) = if turbo {
                    (" Counter [turbo] ", Color::Magenta)
                } else {
                    (" Counter ", Color::Cyan)
                };
                let block = Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color));

                let paragraph = Paragraph::new(count.to_string())
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(paragraph, center);

                let [_, help_area] =
                    Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
                let help = Paragraph::new("k/Up: +1  j/Down: -1  t: turbo  q: quit")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray));
                frame.render_widget(help, help_area);
            })?;
            should_render = false;
        }

        let Some(key) = key_rx.recv().await else {
            break;
        };

        match key.code {
            KeyCode::Char('k') | KeyCode::Up => {
                should_render = store.dispatch(&step.with((1, ()))).changed();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                should_render = store.dispatch(&step.with((-1, ()))).changed();
            }
            KeyCode::Char('t') => {
                should_render = if flux.is_active(TURBO) {
                    flux.deactivate(TURBO)
                } else {
                    flux.activate(TURBO)
                };
            }
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => {}
        }
    }

    cancel_token.cancel();
    Ok(())
}
