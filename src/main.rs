use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};

use clubrisk_terminal::club::{ClubRecord, RiskTone, display_value};
use clubrisk_terminal::config::AppConfig;
use clubrisk_terminal::directory::DirectoryStatus;
use clubrisk_terminal::feed;
use clubrisk_terminal::logging;
use clubrisk_terminal::selection::MAX_SELECTED_CLUBS;
use clubrisk_terminal::state::{AppState, Delta, Focus, ProviderCommand, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, source_label: &str) -> Self {
        let mut state = AppState::new();
        state.source_label = source_label.to_string();
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('r') => self.request_assessment(),
                _ => {}
            }
            return;
        }
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.state.help_overlay = false;
            }
            return;
        }
        if key.code == KeyCode::F(5) {
            self.request_assessment();
            return;
        }
        match self.state.focus {
            Focus::Search => self.on_search_key(key),
            Focus::Selection => self.on_selection_key(key),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if self.state.search_term.is_empty() {
                    self.state.toggle_focus();
                } else {
                    self.state.set_search_term(String::new());
                }
            }
            KeyCode::Tab => self.state.toggle_focus(),
            KeyCode::Down => self.state.suggestion_next(),
            KeyCode::Up => self.state.suggestion_prev(),
            KeyCode::Backspace => self.state.pop_search_char(),
            KeyCode::Enter => {
                let Some(name) = self.state.highlighted_suggestion() else {
                    return;
                };
                let cmd = self.state.select_club(&name);
                self.dispatch(cmd, "Risk request");
            }
            KeyCode::Char(c) => self.state.push_search_char(c),
            _ => {}
        }
    }

    fn on_selection_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Tab | KeyCode::Esc => {
                self.state.toggle_focus()
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.selection_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.selection_prev(),
            KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                if let Some(name) = self.state.remove_highlighted() {
                    self.state.push_log(format!("[INFO] Removed {name}"));
                }
            }
            KeyCode::Char('r') | KeyCode::Enter => self.request_assessment(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn request_assessment(&mut self) {
        let cmd = self.state.request_batch_assessment();
        self.dispatch(cmd, "Risk assessment");
    }

    fn request_directory(&mut self) {
        self.dispatch(Some(ProviderCommand::LoadDirectory), "Club directory");
    }

    fn dispatch(&mut self, cmd: Option<ProviderCommand>, what: &str) {
        let Some(cmd) = cmd else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return;
        };
        let failed = match tx.send(cmd) {
            Ok(()) => None,
            Err(mpsc::SendError(cmd)) => Some(cmd),
        };
        match failed {
            None => self.state.push_log(format!("[INFO] {what} sent")),
            Some(cmd) => {
                self.state.push_log(format!("[WARN] {what} failed: provider stopped"));
                // Without a worker the pending batch would never resolve.
                if let ProviderCommand::FetchBatchRisk { ticket, .. } = cmd {
                    apply_delta(
                        &mut self.state,
                        Delta::BatchFailed {
                            ticket,
                            error: "provider stopped".to_string(),
                        },
                    );
                }
            }
        }
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::from_env();

    let _log_guard = match config.log_dir.as_deref() {
        Some(dir) => match logging::init_file_logging(dir) {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("warning: file logging disabled: {err:#}");
                None
            }
        },
        None => None,
    };

    let source = config.build_source();
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let mut app = App::new(Some(cmd_tx), source.label());
    feed::spawn_provider(tx, cmd_rx, source, config.fetch_parallelism);
    app.request_directory();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_left(frame, columns[0], &app.state);
    render_right(frame, columns[1], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let assessed = state
        .last_assessed_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let line1 = format!(
        "  .-.  CLUB RISK | Source: {} | Selected {}/{} | Last assessment: {}",
        state.source_label,
        state.selection.len(),
        MAX_SELECTED_CLUBS,
        assessed
    );
    let line2 = " (o o)".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.focus {
        Focus::Search => {
            "Type to search | ↑/↓ Pick | Enter Add | Tab Selection | F5/Ctrl-R Assess | Esc Clear | Ctrl-C Quit"
                .to_string()
        }
        Focus::Selection => {
            "j/k/↑/↓ Move | d/x Remove | Enter/r Assess | / Search | ? Help | q Quit".to_string()
        }
    }
}

fn render_left(frame: &mut Frame, area: Rect, state: &AppState) {
    let suggestions = state.suggestions();
    let suggestion_height = if suggestions.is_empty() {
        0
    } else {
        (suggestions.len().min(6) as u16) + 2
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(suggestion_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_search_box(frame, sections[0], state);
    frame.render_widget(status_line(state), sections[1]);
    if !suggestions.is_empty() {
        render_suggestions(frame, sections[2], state, &suggestions);
    }
    render_selected_clubs(frame, sections[3], state);

    if state.max_reached() {
        let warning = Paragraph::new(format!(
            "⚠ Maximum of {MAX_SELECTED_CLUBS} clubs can be selected."
        ))
        .style(Style::default().fg(Color::Yellow));
        frame.render_widget(warning, sections[4]);
    }
}

fn render_search_box(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::Search;
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let (text, style) = if state.search_term.is_empty() {
        (
            "Search clubs...".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (state.search_term.clone(), Style::default())
    };
    let cursor = if focused { "▏" } else { "" };
    let input = Paragraph::new(format!("🔍 {text}{cursor}"))
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(border));
    frame.render_widget(input, area);
}

fn status_line(state: &AppState) -> Paragraph<'static> {
    if state.is_batch_pending() {
        return Paragraph::new("Loading risk assessments...")
            .style(Style::default().fg(Color::Cyan));
    }
    if let Some(err) = state.batch_error() {
        return Paragraph::new(format!("Error: {err}")).style(Style::default().fg(Color::Red));
    }
    match state.directory.status() {
        DirectoryStatus::Loading => {
            Paragraph::new("Loading clubs...").style(Style::default().fg(Color::DarkGray))
        }
        DirectoryStatus::Ready if !state.search_term.is_empty() => {
            let count = state.suggestions().len();
            Paragraph::new(format!("{count} matching clubs"))
                .style(Style::default().fg(Color::DarkGray))
        }
        _ => Paragraph::new(""),
    }
}

fn render_suggestions(frame: &mut Frame, area: Rect, state: &AppState, suggestions: &[&str]) {
    let items: Vec<ListItem> = suggestions
        .iter()
        .map(|name| {
            let style = if state.selection.contains(name) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(name.to_string()).style(style)
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray));
    let mut list_state = ListState::default();
    list_state.select(Some(state.suggestion_selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_selected_clubs(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Selected Clubs")
        .borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.selection.is_empty() {
        let empty = Paragraph::new("No clubs selected")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    const CARD_HEIGHT: u16 = 4;
    for (i, record) in state.selection.records().enumerate() {
        let y = inner.y + (i as u16) * CARD_HEIGHT;
        if y + CARD_HEIGHT > inner.y + inner.height {
            break;
        }
        let card = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: CARD_HEIGHT,
        };
        let selected = state.focus == Focus::Selection && i == state.selection_cursor;
        render_club_card(frame, card, record, selected);
    }
}

fn render_club_card(frame: &mut Frame, area: Rect, club: &ClubRecord, selected: bool) {
    let border = if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut title = format!("{} · {}", club.name, club.category().label());
    if let Some(label) = &club.server_category {
        title.push_str(&format!(" (server: {label})"));
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border);

    let ratio = club.score.map(|s| (s / 100.0).clamp(0.0, 1.0)).unwrap_or(0.0);
    let label = match club.score {
        Some(score) => format!("{}", score.round() as i64),
        None => "-".to_string(),
    };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(tone_color(club.tone())).bg(Color::Black))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn tone_color(tone: RiskTone) -> Color {
    match tone {
        RiskTone::Unknown => Color::Gray,
        RiskTone::Calm => Color::Green,
        RiskTone::Watch => Color::Yellow,
        RiskTone::Alarm => Color::Red,
    }
}

fn render_right(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(3),
            Constraint::Length(6),
        ])
        .split(area);

    let details = Paragraph::new(details_text(state))
        .block(Block::default().title("Club Details").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, sections[0]);

    if state.show_strategies() {
        let strategies = Paragraph::new(strategies_text(state))
            .block(
                Block::default()
                    .title("Strategy Suggestions")
                    .borders(Borders::ALL),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(strategies, sections[1]);
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(console, sections[2]);
}

fn details_text(state: &AppState) -> String {
    let Some(club) = state.highlighted_record() else {
        return "Select a club to see its figures".to_string();
    };
    let mut lines = vec![club.name.clone()];
    let figures = club.key_figures();
    if !figures.is_empty() {
        lines.push(
            figures
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    for (key, value) in &club.facts {
        if let Some(value) = display_value(value) {
            lines.push(format!("{key}: {value}"));
        }
    }
    if let Some(guidance) = club.category().guidance() {
        lines.push(guidance.to_string());
    }
    lines.join("\n")
}

fn strategies_text(state: &AppState) -> String {
    let mut lines = Vec::new();
    for club in state.selection.records().filter(|c| c.is_assessed()) {
        lines.push(format!("{}:", club.name));
        if club.strategies.is_empty() {
            lines.push("  No strategies available.".to_string());
        } else {
            lines.extend(club.strategies.iter().map(|s| format!("  • {s}")));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(4)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Club Risk - Help",
        "",
        "Search (default focus):",
        "  type         Filter clubs",
        "  ↑/↓          Pick a suggestion",
        "  Enter        Add club (max 3) and fetch its score",
        "  Esc          Clear search / go to selection",
        "  Tab          Selection",
        "",
        "Selection:",
        "  j/k or ↑/↓   Move",
        "  d / x / Del  Remove club",
        "  Enter / r    Get risk assessment for all selected",
        "  / or s       Back to search",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Anywhere: F5 / Ctrl-R assess, Ctrl-C quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
