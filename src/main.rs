use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

use gridfall::audio::{play_events, AudioSink, Silent, TerminalBell};
use gridfall::config::Settings;
use gridfall::game::{CellState, Game, GameState, Intent};
use gridfall::screen::{MainMenu, MenuKey, Screen, StateManager};
use gridfall::tetromino::Shape;

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(version, about = "Falling-block puzzle in the terminal", long_about = None)]
struct Args {
    /// Seed for the piece sequence, as a 64-bit integer.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Grid width in cells.
    #[arg(long, default_value_t = gridfall::config::DEFAULT_GRID_WIDTH)]
    width: usize,
    /// Grid height in cells.
    #[arg(long, default_value_t = gridfall::config::DEFAULT_GRID_HEIGHT)]
    height: usize,
    /// Milliseconds between gravity steps.
    #[arg(long, default_value_t = gridfall::config::DEFAULT_FALL_INTERVAL_MS)]
    fall_ms: u64,
    /// Milliseconds between gravity steps while the drop key is held.
    #[arg(long, default_value_t = gridfall::config::DEFAULT_FAST_INTERVAL_MS)]
    fast_ms: u64,
    /// Do not ring the terminal bell.
    #[arg(long)]
    mute: bool,
}

impl Args {
    fn into_settings(self) -> Settings {
        Settings {
            fall_interval_ms: self.fall_ms,
            fast_interval_ms: self.fast_ms,
            seed: self.seed,
            sound: !self.mute,
            ..Settings::with_grid(self.width, self.height)
        }
    }
}

// ============================================================================
// Visual Constants
// ============================================================================

const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = " .";
const CELL_WIDTH: u16 = 2;

fn shape_color(shape: Shape) -> Color {
    match shape {
        Shape::I => Color::Cyan,
        Shape::O => Color::Yellow,
        Shape::T => Color::Magenta,
        Shape::S => Color::Green,
        Shape::Z => Color::Red,
        Shape::J => Color::Blue,
        Shape::L => Color::Rgb(255, 165, 0),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, manager: &StateManager) {
    let area = frame.size();

    match &manager.screen {
        Screen::MainMenu(menu) => render_menu(frame, menu, area),
        Screen::Playing(game) => match game.state() {
            GameState::Running => render_game(frame, game, area),
            GameState::Paused => render_paused(frame, game, area),
            GameState::GameOver => render_game_over(frame, game, area),
        },
    }
}

fn render_menu(frame: &mut Frame, menu: &MainMenu, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "G R I D F A L L",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if menu.options_open {
        lines.push(Line::from("←→/AD move   ↑/W rotate"));
        lines.push(Line::from("↓/S hold to drop   P pause"));
        lines.push(Line::from("R restart   ESC menu"));
        lines.push(Line::from(""));
    }

    for button in menu.buttons() {
        let style = if button.hovered {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(
            format!("  {:^10}  ", button.kind.label()),
            style,
        )));
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if menu.options_open { " Options " } else { " Menu " })
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(paragraph, centered_rect(32, 16, area));
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let cols = u16::try_from(game.grid.width()).unwrap_or(u16::MAX);
    let rows = u16::try_from(game.grid.height()).unwrap_or(u16::MAX);
    let grid_display_width = cols.saturating_mul(CELL_WIDTH).saturating_add(2);
    let grid_display_height = rows.saturating_add(2);
    let side_width = 14;
    let total_width = grid_display_width.saturating_add(side_width);

    let main_area = centered_rect(total_width, grid_display_height, area);

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(main_area);

    let side = Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]).split(horizontal[1]);

    render_grid(frame, game, horizontal[0]);
    render_preview(frame, game, side[0]);
    render_info(frame, game, side[1]);
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Gridfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|cell| match cell {
                        CellState::Empty => {
                            Span::styled(EMPTY_CHAR, Style::default().fg(Color::DarkGray))
                        }
                        CellState::Filled(shape) => {
                            Span::styled(BLOCK_CHAR, Style::default().fg(shape_color(shape)))
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let offsets = game.next.shape.offsets();
    let color = shape_color(game.next.shape);
    let min_x = offsets.iter().map(|(x, _)| *x).min().unwrap_or(0);
    let max_x = offsets.iter().map(|(x, _)| *x).max().unwrap_or(0);
    let min_y = offsets.iter().map(|(_, y)| *y).min().unwrap_or(0);
    let max_y = offsets.iter().map(|(_, y)| *y).max().unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    for y in min_y..=max_y {
        let mut spans = vec![Span::raw(" ")];
        for x in min_x..=max_x {
            if offsets.contains(&(x, y)) {
                spans.push(Span::styled(BLOCK_CHAR, Style::default().fg(color)));
            } else {
                spans.push(Span::raw("  "));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.lines_cleared)),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, height: u16) {
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(paragraph, centered_rect(24, height, area));
}

fn render_game_over(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", game.score)),
        Line::from(format!("Lines: {}", game.lines_cleared)),
        Line::from(""),
        Line::from(Span::styled("R to restart", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled("ESC for menu", Style::default().fg(Color::DarkGray))),
    ];
    render_popup(frame, area, " Game Over ", text, 11);
}

fn render_paused(frame: &mut Frame, game: &Game, area: Rect) {
    render_game(frame, game, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled("P to continue", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled("ESC for menu", Style::default().fg(Color::DarkGray))),
    ];
    render_popup(frame, area, " Paused ", text, 8);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn menu_key(key: &KeyEvent) -> Option<MenuKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(MenuKey::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(MenuKey::Down),
        KeyCode::Enter | KeyCode::Char(' ') => Some(MenuKey::Select),
        KeyCode::Esc | KeyCode::Backspace => Some(MenuKey::Back),
        _ => None,
    }
}

fn game_intent(key: &KeyEvent) -> Option<Intent> {
    let pressed = key.kind != KeyEventKind::Release;
    match key.code {
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::SoftDrop(pressed)),
        _ if !pressed => None,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Intent::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Intent::MoveRight),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Intent::Rotate),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Intent::TogglePause),
        _ => None,
    }
}

fn handle_key(manager: &mut StateManager, key: KeyEvent, audio: &mut dyn AudioSink) {
    if key.code == KeyCode::Char('q') || key.code == KeyCode::Char('Q') {
        manager.request_quit();
        return;
    }

    let in_game = matches!(manager.screen, Screen::Playing(_));
    if in_game && key.code == KeyCode::Esc && key.kind == KeyEventKind::Press {
        manager.back_to_menu();
        return;
    }

    if let Some(game) = manager.game_mut() {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') if game.is_game_over() => game.restart(),
            _ => {
                if let Some(intent) = game_intent(&key) {
                    game.handle_input(intent);
                }
            }
        }
        return;
    }

    if let Some(key) = menu_key(&key) {
        manager.handle_menu_key(key, audio);
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    manager: &mut StateManager,
    audio: &mut dyn AudioSink,
) -> Result<()> {
    let frame_time = Duration::from_millis(1000 / manager.settings().framerate.max(1) as u64);
    let mut last_tick = Instant::now();

    while !manager.should_quit() {
        terminal.draw(|frame| render(frame, manager))?;

        let tick_duration = match &manager.screen {
            Screen::Playing(game) => game.fall_interval(),
            Screen::MainMenu(_) => frame_time,
        };
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(frame_time);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(manager, key, audio);
            }
        }

        if let Some(game) = manager.game_mut() {
            if last_tick.elapsed() >= game.fall_interval() {
                game.tick();
                last_tick = Instant::now();
            }
            play_events(audio, &game.take_events());
        }
    }

    Ok(())
}

/// Raw mode plus alternate screen, restored on drop.
struct TerminalSession {
    enhanced: bool,
    active: bool,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut session = Self {
            enhanced: false,
            active: true,
        };
        stdout()
            .execute(EnterAlternateScreen)
            .context("failed to enter alternate screen")?;
        if supports_keyboard_enhancement().unwrap_or(false) {
            stdout().execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
            session.enhanced = true;
        }
        Ok(session)
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.enhanced {
            stdout().execute(PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        stdout().execute(LeaveAlternateScreen)?;
        Ok(())
    }

    fn leave(mut self) -> Result<()> {
        self.restore()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn main() -> Result<()> {
    // Parse and check settings before touching the terminal
    let settings = Args::parse().into_settings();
    settings.validate().context("invalid settings")?;

    let mut audio: Box<dyn AudioSink> = if settings.sound {
        Box::new(TerminalBell::new(io::stdout()))
    } else {
        Box::new(Silent)
    };
    let mut manager = StateManager::new(settings);

    // Setup terminal
    let session = TerminalSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run(&mut terminal, &mut manager, audio.as_mut());

    // Restore terminal
    drop(terminal);
    session.leave()?;

    result
}
