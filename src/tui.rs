use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, warn};

use crate::cli::{self, Commands};
use crate::config::Config;
use crate::core::cancel::CancellingJobs;
use crate::core::engine::{JobListModel, JobView, Section};
use crate::core::error::JobDeckError;
use crate::core::formatter::{card_detail_line, details_lines, job_title, status_label, status_symbol};
use crate::core::guard::InFlight;
use crate::core::job::{Job, StatusClass};
use crate::core::store::{now_ms, ClearHistory, JobStore};

type SharedStore = Arc<Mutex<Box<dyn JobStore>>>;

const MAX_LOG_LINES: usize = 500;

fn terminal_err(e: io::Error) -> JobDeckError {
    JobDeckError::Terminal {
        message: e.to_string(),
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, JobDeckError> {
        enable_raw_mode().map_err(terminal_err)?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen).map_err(terminal_err)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

/// Results coming back from store worker threads.
#[derive(Debug)]
enum StoreEvent {
    Jobs(Result<Vec<Job>, JobDeckError>),
    Canceled {
        id: String,
        result: Result<(), JobDeckError>,
    },
    Deleted {
        id: String,
        result: Result<(), JobDeckError>,
    },
    SessionCanceled {
        session_id: String,
        result: Result<usize, JobDeckError>,
    },
    Cleared(Result<usize, JobDeckError>),
}

#[derive(Debug)]
struct AppState {
    live_jobs: Vec<Job>,
    is_loading: bool,
    model: JobListModel,
    refresh: InFlight,
    cancelling: CancellingJobs,
    selected: usize,
    details: Option<String>,
    details_scroll: usize,
    command_mode: bool,
    input: String,
    history: Vec<String>,
    last_error: Option<String>,
    retention_days: u32,
    should_quit: bool,
    tick: u64,
}

impl AppState {
    fn new(retention_days: u32) -> Self {
        Self {
            live_jobs: Vec::new(),
            is_loading: false,
            model: JobListModel::new(),
            refresh: InFlight::new(),
            cancelling: CancellingJobs::new(),
            selected: 0,
            details: None,
            details_scroll: 0,
            command_mode: false,
            input: String::new(),
            history: vec!["Welcome to jobdeck. Press ':' then type 'help' for commands.".to_string()],
            last_error: None,
            retention_days,
            should_quit: false,
            tick: 0,
        }
    }

    fn push_history(&mut self, line: impl Into<String>) {
        if self.history.len() >= MAX_LOG_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LOG_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
    }

    /// Recomputes the view (memoized) and keeps selection and markers consistent with it.
    fn sync_view(&mut self) {
        let view = self.model.update(&self.live_jobs, self.is_loading);
        self.cancelling.reconcile(view);
        let rows = view.len();
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }

    fn view(&self) -> &JobView {
        self.model.view()
    }

    fn selected_job(&self) -> Option<&Job> {
        self.view().rows().get(self.selected).copied()
    }

    fn select_next(&mut self) {
        let rows = self.view().len();
        if rows > 0 && self.selected + 1 < rows {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn open_details(&mut self, id: &str) -> bool {
        if self.view().find(id).is_none() {
            return false;
        }
        self.details = Some(id.to_string());
        self.details_scroll = 0;
        true
    }

    fn close_details(&mut self) {
        self.details = None;
        self.details_scroll = 0;
    }
}

pub fn run(config: &Config, store: Box<dyn JobStore>) -> Result<(), JobDeckError> {
    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(terminal_err)?;

    let store: SharedStore = Arc::new(Mutex::new(store));
    let (store_tx, store_rx) = mpsc::channel::<StoreEvent>();

    let mut app = AppState::new(config.retention_days);
    request_refresh(&mut app, &store, &store_tx);
    let mut last_refresh = Instant::now();

    loop {
        while let Ok(event) = store_rx.try_recv() {
            handle_store_event(&mut app, event, &store, &store_tx);
        }

        if last_refresh.elapsed() >= config.refresh_interval {
            request_refresh(&mut app, &store, &store_tx);
            last_refresh = Instant::now();
        }

        app.sync_view();
        app.tick = app.tick.wrapping_add(1);

        terminal.draw(|frame| render(frame, &app)).map_err(terminal_err)?;

        if event::poll(Duration::from_millis(50)).map_err(terminal_err)? {
            if let Event::Key(key) = event::read().map_err(terminal_err)? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key, &store, &store_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("jobdeck exiting");
    Ok(())
}

fn request_refresh(app: &mut AppState, store: &SharedStore, tx: &mpsc::Sender<StoreEvent>) {
    let token = match app.refresh.try_acquire() {
        Some(token) => token,
        None => {
            debug!("refresh already in flight, skipping");
            return;
        }
    };

    app.is_loading = true;
    let store = Arc::clone(store);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = match store.lock() {
            Ok(mut store) => store.fetch_jobs(),
            Err(_) => Err(JobDeckError::StoreUnavailable {
                message: "store lock poisoned".to_string(),
            }),
        };
        drop(token);
        let _ = tx.send(StoreEvent::Jobs(result));
    });
}

fn request_cancel(
    app: &mut AppState,
    id: String,
    store: &SharedStore,
    tx: &mpsc::Sender<StoreEvent>,
) {
    match app.view().find(&id).map(Job::class) {
        None => {
            app.push_history(format!("error: no job '{id}'"));
            return;
        }
        Some(Some(StatusClass::Active)) => {}
        Some(_) => {
            app.push_history(format!("Job {id} is not active."));
            return;
        }
    }

    if !app.cancelling.begin(&id) {
        app.push_history(format!("Job {id} is already being canceled."));
        return;
    }
    app.push_history(format!("Canceling {id}..."));

    let store = Arc::clone(store);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = match store.lock() {
            Ok(mut store) => store.cancel_job(&id),
            Err(_) => Err(JobDeckError::StoreUnavailable {
                message: "store lock poisoned".to_string(),
            }),
        };
        let _ = tx.send(StoreEvent::Canceled { id, result });
    });
}

fn request_clear(
    app: &mut AppState,
    days: Option<i64>,
    store: &SharedStore,
    tx: &mpsc::Sender<StoreEvent>,
) {
    let scope = match ClearHistory::from_days(days, app.retention_days) {
        Ok(scope) => scope,
        Err(err) => {
            app.push_history(format!("error: {err}"));
            return;
        }
    };

    let store = Arc::clone(store);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = match store.lock() {
            Ok(mut store) => store.clear_history(scope),
            Err(_) => Err(JobDeckError::StoreUnavailable {
                message: "store lock poisoned".to_string(),
            }),
        };
        let _ = tx.send(StoreEvent::Cleared(result));
    });
}

fn request_delete(
    app: &mut AppState,
    id: String,
    store: &SharedStore,
    tx: &mpsc::Sender<StoreEvent>,
) {
    app.push_history(format!("Deleting {id}..."));

    let store = Arc::clone(store);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = match store.lock() {
            Ok(mut store) => store.delete_job(&id),
            Err(_) => Err(JobDeckError::StoreUnavailable {
                message: "store lock poisoned".to_string(),
            }),
        };
        let _ = tx.send(StoreEvent::Deleted { id, result });
    });
}

fn request_cancel_session(
    app: &mut AppState,
    session_id: String,
    store: &SharedStore,
    tx: &mpsc::Sender<StoreEvent>,
) {
    // Mark the session's active jobs right away; the refresh reconciles them.
    let ids: Vec<String> = app
        .view()
        .active
        .iter()
        .filter(|job| job.session_id.as_deref() == Some(session_id.as_str()))
        .map(|job| job.id.clone())
        .collect();
    for id in &ids {
        app.cancelling.begin(id);
    }
    app.push_history(format!("Canceling jobs of session {session_id}..."));

    let store = Arc::clone(store);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = match store.lock() {
            Ok(mut store) => store.cancel_session_jobs(&session_id),
            Err(_) => Err(JobDeckError::StoreUnavailable {
                message: "store lock poisoned".to_string(),
            }),
        };
        let _ = tx.send(StoreEvent::SessionCanceled { session_id, result });
    });
}

fn handle_store_event(
    app: &mut AppState,
    event: StoreEvent,
    store: &SharedStore,
    tx: &mpsc::Sender<StoreEvent>,
) {
    match event {
        StoreEvent::Jobs(Ok(jobs)) => {
            app.is_loading = false;
            app.live_jobs = jobs;
            app.last_error = None;
        }
        StoreEvent::Jobs(Err(err)) => {
            app.is_loading = false;
            warn!(error = %err, "refresh failed");
            app.last_error = Some(err.to_string());
        }
        StoreEvent::Canceled { id, result } => {
            match result {
                Ok(()) => app.push_history(format!("Cancel requested for {id}.")),
                Err(err) => {
                    app.cancelling.finish(&id);
                    app.push_history(format!("error: {err}"));
                }
            }
            request_refresh(app, store, tx);
        }
        StoreEvent::Deleted { id, result } => {
            match result {
                Ok(()) => {
                    if app.details.as_deref() == Some(id.as_str()) {
                        app.close_details();
                    }
                    app.push_history(format!("Deleted {id}."));
                }
                Err(err) => app.push_history(format!("error: {err}")),
            }
            request_refresh(app, store, tx);
        }
        StoreEvent::SessionCanceled { session_id, result } => {
            match result {
                Ok(count) => {
                    app.push_history(format!("Canceled {count} jobs of session {session_id}."))
                }
                Err(err) => {
                    let ids: Vec<String> = app
                        .view()
                        .active
                        .iter()
                        .filter(|job| job.session_id.as_deref() == Some(session_id.as_str()))
                        .map(|job| job.id.clone())
                        .collect();
                    for id in &ids {
                        app.cancelling.finish(id);
                    }
                    app.push_history(format!("error: {err}"));
                }
            }
            request_refresh(app, store, tx);
        }
        StoreEvent::Cleared(result) => {
            match result {
                Ok(count) => app.push_history(format!("Cleared {count} jobs from history.")),
                Err(err) => app.push_history(format!("error: {err}")),
            }
            request_refresh(app, store, tx);
        }
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent, store: &SharedStore, tx: &mpsc::Sender<StoreEvent>) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.command_mode {
        match key.code {
            KeyCode::Char(ch) => app.input.push(ch),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Enter => {
                let line = app.input.trim().to_string();
                app.input.clear();
                app.command_mode = false;
                if !line.is_empty() {
                    handle_line(app, &line, store, tx);
                }
            }
            KeyCode::Esc => {
                app.input.clear();
                app.command_mode = false;
            }
            _ => {}
        }
        return;
    }

    if app.details.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_details(),
            KeyCode::Up => app.details_scroll = app.details_scroll.saturating_sub(1),
            KeyCode::Down => app.details_scroll = app.details_scroll.saturating_add(1),
            KeyCode::PageUp => app.details_scroll = app.details_scroll.saturating_sub(10),
            KeyCode::PageDown => app.details_scroll = app.details_scroll.saturating_add(10),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char(':') => app.command_mode = true,
        KeyCode::Char('r') => request_refresh(app, store, tx),
        KeyCode::Char('c') => {
            if let Some(id) = app.selected_job().map(|job| job.id.clone()) {
                request_cancel(app, id, store, tx);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Home => app.selected = 0,
        KeyCode::End => app.selected = app.view().len().saturating_sub(1),
        KeyCode::Enter => {
            if let Some(id) = app.selected_job().map(|job| job.id.clone()) {
                app.open_details(&id);
            }
        }
        _ => {}
    }
}

fn handle_line(app: &mut AppState, line: &str, store: &SharedStore, tx: &mpsc::Sender<StoreEvent>) {
    app.push_history(format!(">> {line}"));

    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        app.should_quit = true;
        return;
    }

    if line.eq_ignore_ascii_case("help") {
        for help in cli::HELP_LINES {
            app.push_history(help);
        }
        return;
    }

    match cli::parse_line(line) {
        Ok(Commands::Refresh) => request_refresh(app, store, tx),
        Ok(Commands::Cancel { id }) => request_cancel(app, id, store, tx),
        Ok(Commands::CancelSession { session_id }) => {
            request_cancel_session(app, session_id, store, tx)
        }
        Ok(Commands::Delete { id }) => request_delete(app, id, store, tx),
        Ok(Commands::Show { id }) => {
            if !app.open_details(&id) {
                app.push_history(format!("error: no job '{id}'"));
            }
        }
        Ok(Commands::ClearHistory(args)) => request_clear(app, args.days, store, tx),
        Err(err) => {
            let message = err.to_string();
            for line in message.lines().filter(|line| !line.trim().is_empty()) {
                app.push_history(line.to_string());
            }
        }
    }
}

fn render(frame: &mut Frame, app: &AppState) {
    let has_error = app.last_error.is_some();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(if has_error { 1 } else { 0 }),
            Constraint::Length(3),
        ])
        .split(frame.size());

    frame.render_widget(render_header(app), layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    render_sidebar(frame, body[0], app);
    frame.render_widget(render_history(app, body[1].height as usize), body[1]);

    if let Some(error) = &app.last_error {
        let line = Paragraph::new(format!(" error: {error}")).style(Style::default().fg(Color::Red));
        frame.render_widget(line, layout[2]);
    }

    let prompt = if app.command_mode {
        format!(":{}", app.input)
    } else {
        String::new()
    };
    let input = Paragraph::new(prompt)
        .block(Block::default().title("Command").borders(Borders::ALL));
    frame.render_widget(input, layout[3]);
    if app.command_mode {
        frame.set_cursor(input_cursor_x(layout[3], &app.input), layout[3].y + 1);
    }

    if let Some(id) = &app.details {
        if let Some(job) = app.view().find(id) {
            render_details(frame, job, app.details_scroll);
        }
    }
}

// Border plus the ':' prompt precede the input; count chars, not bytes.
fn input_cursor_x(area: Rect, input: &str) -> u16 {
    let offset = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(2)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

fn render_header(app: &AppState) -> Paragraph<'static> {
    let view = app.view();
    let spinner = ["|", "/", "-", "\\"];
    let refresh = if app.is_loading {
        format!("refreshing {}", spinner[(app.tick as usize / 2) % spinner.len()])
    } else {
        "idle".to_string()
    };

    let mut counts = vec![
        Span::styled(
            format!("{} active", view.active.len()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} completed", view.completed.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} failed", view.failed.len()),
            Style::default().fg(Color::Red),
        ),
    ];
    if !view.unknown.is_empty() {
        counts.push(Span::raw("  "));
        counts.push(Span::styled(
            format!("{} other", view.unknown.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    counts.push(Span::raw(format!("   [{refresh}]")));

    Paragraph::new(Line::from(counts)).block(Block::default().title("jobdeck").borders(Borders::ALL))
}

fn status_style(job: &Job) -> Style {
    match job.class() {
        Some(StatusClass::Active) => Style::default().fg(Color::Yellow),
        Some(StatusClass::Completed) => Style::default().fg(Color::Green),
        Some(StatusClass::Failed) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::DarkGray),
    }
}

/// Builds the sidebar list items and the list index of every job row.
fn sidebar_items(
    view: &JobView,
    cancelling: &CancellingJobs,
    now: i64,
) -> (Vec<ListItem<'static>>, Vec<usize>) {
    let mut items = Vec::new();
    let mut positions = Vec::new();

    for section in Section::ORDER {
        let jobs = view.section(section);
        if jobs.is_empty() {
            continue;
        }

        items.push(ListItem::new(Line::from(Span::styled(
            format!("{} ({})", section.title(), jobs.len()),
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ))));

        for job in jobs {
            let style = status_style(job);
            let status = if cancelling.contains(&job.id) {
                "Canceling...".to_string()
            } else {
                status_label(job)
            };
            positions.push(items.len());
            items.push(ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!(" {} ", status_symbol(job)), style),
                    Span::raw(job_title(job)),
                    Span::raw("  "),
                    Span::styled(status, style),
                ]),
                Line::from(Span::styled(
                    format!("   {}", card_detail_line(job, now)),
                    Style::default().fg(Color::Gray),
                )),
            ]));
        }
    }

    (items, positions)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &AppState) {
    let view = app.view();
    let block = Block::default().title("Background Jobs").borders(Borders::ALL);

    if view.should_show_loading {
        let placeholder = Paragraph::new("Loading jobs...").block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    if view.should_show_empty {
        let placeholder = Paragraph::new("No background jobs.").block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let (items, positions) = sidebar_items(view, &app.cancelling, now_ms());
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    state.select(positions.get(app.selected).copied());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_history(app: &AppState, height: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let start = app.history.len().saturating_sub(max_lines);
    let lines: Vec<Line> = app.history[start..]
        .iter()
        .map(|line| Line::from(line.clone()))
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Session").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn render_details(frame: &mut Frame, job: &Job, scroll: usize) {
    let area = centered_rect(80, 80, frame.size());
    let lines: Vec<Line> = details_lines(job, now_ms())
        .into_iter()
        .map(Line::from)
        .collect();
    let max_scroll = lines.len().saturating_sub(1);
    let scroll = scroll.min(max_scroll) as u16;

    let title = format!("{} · {}", job_title(job), status_label(job));
    let details = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(status_style(job)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(Clear, area);
    frame.render_widget(details, area);
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
