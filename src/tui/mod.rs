//! Terminal UI for playing against the oracle.

mod app;
mod input;
mod ui;

pub use app::{App, Screen, cell_at};
pub use input::{GameAction, game_action, move_cursor};
pub use ui::{CELL_HEIGHT, CELL_WIDTH, draw};

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::{Duration, sleep};
use tracing::{error, info, instrument};

use crate::games::Variant;
use crate::oracle::Oracle;
use crate::ClientConfig;

/// Runs the terminal UI until the user quits.
///
/// Opens straight into `variant` when given, otherwise shows the menu.
pub async fn run_tui(
    config: ClientConfig,
    oracle: Arc<dyn Oracle>,
    variant: Option<Variant>,
) -> Result<()> {
    info!(server_url = %config.server_url(), "Starting vsai TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(oracle, &config);
    app.refresh_menu_stats();
    if let Some(variant) = variant {
        app.open_game(variant);
    }

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "TUI loop error");
    }
    res
}

#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.on_tick();
        let mut board_area = None;
        terminal.draw(|f| board_area = draw(f, app))?;
        app.set_board_area(board_area);

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key.code),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        app.settle();
        if app.should_quit() {
            info!("User quit");
            return Ok(());
        }
        sleep(Duration::from_millis(10)).await;
    }
}
