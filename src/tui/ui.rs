//! Stateless UI rendering for the menu and the game screen.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::instrument;

use super::app::{App, Screen};
use crate::collaborators::Preference;
use crate::controller::SessionController;
use crate::games::{Coord, InputMode, Variant};
use crate::oracle::GameStats;
use crate::render::{BoardView, CellView, Owner};

/// Terminal columns per board cell.
pub const CELL_WIDTH: u16 = 5;
/// Terminal rows per board cell.
pub const CELL_HEIGHT: u16 = 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Draws the current screen. Returns where the board cells were drawn.
#[instrument(skip_all)]
pub fn draw(frame: &mut Frame, app: &App) -> Option<Rect> {
    match (app.screen(), app.controller()) {
        (Screen::Game, Some(controller)) => Some(draw_game(frame, app, controller)),
        _ => {
            draw_menu(frame, app);
            None
        }
    }
}

fn title_bar(text: String) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn help_bar(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn draw_menu(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(title_bar("vsai - Play against the AI".to_string()), chunks[0]);

    let items: Vec<ListItem> = app
        .variants()
        .iter()
        .map(|v| ListItem::new(v.title()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Games"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.menu_index()));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let selected = app.variants().get(app.menu_index()).copied();
    let mut lines = vec![Line::from(format!("AI: {}", app.ai_mode().name()))];
    if selected.is_some_and(Variant::has_side_choice) {
        lines.push(Line::from(format!("Side: {}", app.side())));
    }
    lines.push(Line::from(stats_line(
        selected.and_then(|v| app.stats().get(v)),
    )));
    let info = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Setup"));
    frame.render_widget(info, chunks[2]);

    frame.render_widget(
        help_bar("↑/↓: Choose | Enter: Play | M: AI mode | S: Side | Q: Quit"),
        chunks[3],
    );
}

fn stats_line(stats: Option<GameStats>) -> String {
    match stats {
        Some(s) => format!(
            "Games: {}  You: {}  AI: {}  Draws: {}  Win rate: {:.1}%",
            s.total_games, s.player_wins, s.ai_wins, s.draws, s.win_rate
        ),
        None => "Statistics unavailable".to_string(),
    }
}

fn draw_game(frame: &mut Frame, app: &App, controller: &SessionController) -> Rect {
    let view = controller.view();
    let variant = *controller.snapshot().variant();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(title_bar(format!("vsai - {}", view.title)), chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(34)])
        .split(chunks[1]);

    let board_area = draw_board(frame, body[0], &view, variant, app.cursor());
    draw_side_panel(frame, body[1], app, controller, &view);

    let animate = controller.preference(Preference::Animations);
    let mut status = match (&view.banner, view.busy && animate) {
        (Some(banner), _) => format!("{} {}", banner, view.status),
        (None, true) => format!("{} {}", SPINNER[app.tick() % SPINNER.len()], view.status),
        (None, false) => view.status.clone(),
    };
    if let Some(notice) = &view.notice {
        status = format!("{} | {}", status, notice);
    }
    let status_style = match (&view.banner, &view.notice) {
        (Some(_), _) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        (None, Some(_)) => Style::default().fg(Color::Red),
        (None, None) => Style::default().fg(Color::Yellow),
    };
    let status = Paragraph::new(status)
        .style(status_style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, chunks[2]);

    let help = match variant.input_mode() {
        InputMode::Drop => {
            "1-7/Enter: Drop | N: New | M: AI | S: Sound | V: Anim | Esc: Menu | Q: Quit"
        }
        InputMode::Place => {
            "1-9/Enter: Place | N: New | M: AI | S: Sound | V: Anim | Esc: Menu | Q: Quit"
        }
        InputMode::SelectThenMove => {
            "Enter/Click: Select & move | N: New | M: AI | A: Retry AI | Esc: Menu | Q: Quit"
        }
    };
    frame.render_widget(help_bar(help), chunks[3]);

    if view.cells.iter().flatten().any(|c| c.promoting) {
        draw_promotion_prompt(frame, board_area);
    }
    board_area
}

fn draw_board(
    frame: &mut Frame,
    area: Rect,
    view: &BoardView,
    variant: Variant,
    cursor: Coord,
) -> Rect {
    let (rows, cols) = variant.dimensions();
    let width = cols as u16 * CELL_WIDTH + 2;
    let height = rows as u16 * CELL_HEIGHT + 2;
    let outer = center_rect(area, width, height);
    let block = Block::default().borders(Borders::ALL).title("Board");
    let inner = block.inner(outer);
    frame.render_widget(block, outer);

    for cell in view.cells.iter().flatten() {
        let rect = Rect {
            x: inner.x + cell.coord.col as u16 * CELL_WIDTH,
            y: inner.y + cell.coord.row as u16 * CELL_HEIGHT,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
        }
        .intersection(inner);
        if rect.is_empty() {
            continue;
        }
        let style = cell_style(cell, variant, cell.coord == cursor);
        let marker = if cell.destination && cell.occupant.is_none() {
            "·".to_string()
        } else {
            cell.glyph.clone()
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(format!("{:^5}", marker), style)),
            Line::from(Span::styled("     ", style)),
        ]);
        frame.render_widget(paragraph, rect);
    }
    inner
}

fn cell_style(cell: &CellView, variant: Variant, under_cursor: bool) -> Style {
    let dark_square = (cell.coord.row + cell.coord.col) % 2 == 1;
    let background = match variant {
        Variant::Checkers | Variant::Chess if dark_square => Color::Rgb(118, 150, 86),
        Variant::Checkers | Variant::Chess => Color::Rgb(238, 238, 210),
        Variant::ConnectFour => Color::Blue,
        Variant::TicTacToe => Color::Reset,
    };
    let foreground = match (variant, cell.owner) {
        (Variant::ConnectFour, Some(Owner::Player)) => Color::Red,
        (Variant::ConnectFour, Some(Owner::Opponent)) => Color::Yellow,
        (Variant::TicTacToe, Some(Owner::Player)) => Color::Red,
        (Variant::TicTacToe, Some(Owner::Opponent)) => Color::Blue,
        (_, Some(_)) => Color::Black,
        (_, None) => Color::DarkGray,
    };
    let mut style = Style::default()
        .fg(foreground)
        .bg(background)
        .add_modifier(Modifier::BOLD);
    if cell.destination {
        style = style.bg(if cell.capture { Color::LightRed } else { Color::LightGreen });
    }
    if cell.selected || cell.promoting {
        style = style.bg(Color::LightYellow);
    }
    if under_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn draw_side_panel(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    controller: &SessionController,
    view: &BoardView,
) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    let variant = *controller.snapshot().variant();
    let on_off = |p: Preference| if controller.preference(p) { "on" } else { "off" };
    let mut lines = vec![Line::from(format!("AI: {}", view.ai_mode))];
    if variant.has_side_choice() {
        lines.push(Line::from(format!("Side: {}", controller.snapshot().side())));
    }
    lines.push(Line::from(format!(
        "Sound: {}  Animations: {}",
        on_off(Preference::Sound),
        on_off(Preference::Animations)
    )));
    if let Some(stats) = app.stats().get(variant) {
        lines.push(Line::from(format!(
            "Games {}  You {}  AI {}",
            stats.total_games, stats.player_wins, stats.ai_wins
        )));
        lines.push(Line::from(format!(
            "Draws {}  Win rate {:.1}%",
            stats.draws, stats.win_rate
        )));
    }
    let info = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Info"));
    frame.render_widget(info, parts[0]);

    let visible = parts[1].height.saturating_sub(2) as usize;
    let skip = view.history.len().saturating_sub(visible);
    let items: Vec<ListItem> = view
        .history
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, entry)| ListItem::new(format!("{:>3}. {}", i + 1, entry)))
        .collect();
    let history = List::new(items).block(Block::default().borders(Borders::ALL).title("Moves"));
    frame.render_widget(history, parts[1]);
}

fn draw_promotion_prompt(frame: &mut Frame, board_area: Rect) {
    let area = center_rect(board_area, 30, 5);
    frame.render_widget(Clear, area);
    let prompt = Paragraph::new(vec![
        Line::from("Promote pawn to:"),
        Line::from("[Q]ueen [R]ook k[N]ight [B]ishop"),
        Line::from(Span::styled("Esc: cancel", Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Promotion"));
    frame.render_widget(prompt, area);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
