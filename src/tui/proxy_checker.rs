//! TUI for proxy checker with progress display

use crate::proxy::{
    CheckSummary, ProbeClient, ProbeOutcome, ProxyAddress, ProxyChecker, ReportAggregator,
};
use crate::{save_report, Config, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::Duration;

/// Maximum number of recent proxies to keep for display
const MAX_RECENT_PROXIES: usize = 100;

/// Which result list has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Working,
    NotWorking,
}

/// Outcomes received so far, independent of the terminal
pub(crate) struct CheckProgress {
    /// Total number of proxies
    total: usize,
    /// Working proxies and counts, in completion order
    aggregator: ReportAggregator,
    /// Recent working proxies
    recent_working: VecDeque<ProbeOutcome>,
    /// Recent failed proxies
    recent_failed: VecDeque<ProbeOutcome>,
    /// Status message
    status_message: String,
    /// Whether the outcome channel has closed
    is_complete: bool,
}

impl CheckProgress {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            aggregator: ReportAggregator::new(),
            recent_working: VecDeque::new(),
            recent_failed: VecDeque::new(),
            status_message: "Starting proxy check... Press 'q' to quit.".to_string(),
            is_complete: false,
        }
    }

    pub(crate) fn record(&mut self, outcome: ProbeOutcome) {
        let recent = if outcome.is_working() {
            &mut self.recent_working
        } else {
            &mut self.recent_failed
        };
        recent.push_back(outcome.clone());
        if recent.len() > MAX_RECENT_PROXIES {
            recent.pop_front();
        }

        self.aggregator.record(outcome);

        let summary = self.aggregator.summary();
        self.status_message = format!(
            "Checking... {}% ({}/{}) | Working: {} | Not working: {}",
            percent(summary.total, self.total),
            summary.total,
            self.total,
            summary.working,
            summary.not_working
        );
    }

    /// Record everything that completed since the last call without blocking
    pub(crate) fn drain(&mut self, rx: &mut mpsc::Receiver<ProbeOutcome>) {
        loop {
            match rx.try_recv() {
                Ok(outcome) => self.record(outcome),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.mark_complete();
                    break;
                }
            }
        }
    }

    fn mark_complete(&mut self) {
        if self.is_complete {
            return;
        }
        self.is_complete = true;
        let summary = self.aggregator.summary();
        self.status_message = format!(
            "Complete! Checked: {} | Working: {} | Not working: {} | Press 'q' to save and quit",
            summary.total, summary.working, summary.not_working
        );
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub(crate) fn summary(&self) -> CheckSummary {
        self.aggregator.summary()
    }

    /// Save the working proxies seen so far to the configured report
    pub(crate) fn finish(self, config: &Config) -> Result<CheckSummary> {
        let (records, summary) = self.aggregator.finish();
        save_report(config, &records)?;
        Ok(summary)
    }
}

/// Proxy checker TUI application state
pub struct ProxyCheckerApp<C> {
    /// Proxies to check
    proxies: Vec<ProxyAddress>,
    /// Checker running the probes
    checker: ProxyChecker<C>,
    /// Run configuration, for the report path
    config: Config,
    /// Outcomes received so far
    progress: CheckProgress,
    /// Focused list
    pane: Pane,
    /// Selected item in the focused list
    list_state: ListState,
    /// Whether the user wants to quit
    should_quit: bool,
}

impl<C: ProbeClient + 'static> ProxyCheckerApp<C> {
    /// Create a new proxy checker TUI application
    pub fn new(proxies: Vec<ProxyAddress>, checker: ProxyChecker<C>, config: Config) -> Self {
        let progress = CheckProgress::new(proxies.len());
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            proxies,
            checker,
            config,
            progress,
            pane: Pane::Working,
            list_state,
            should_quit: false,
        }
    }

    /// Run the TUI, then save whatever working proxies were found
    pub async fn run(mut self) -> Result<CheckSummary> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_app(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result?;

        self.progress.finish(&self.config)
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut rx = self
            .checker
            .check_proxies_stream(std::mem::take(&mut self.proxies));

        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code);
                        if self.should_quit {
                            break;
                        }
                    }
                }
            }

            self.progress.drain(&mut rx);
        }

        Ok(())
    }

    fn focused_len(&self) -> usize {
        match self.pane {
            Pane::Working => self.progress.recent_working.len(),
            Pane::NotWorking => self.progress.recent_failed.len(),
        }
    }

    fn handle_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::Working => Pane::NotWorking,
                    Pane::NotWorking => Pane::Working,
                };
                self.list_state.select(Some(0));
            }
            KeyCode::Down => {
                let len = self.focused_len();
                let i = match self.list_state.selected() {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                };
                self.list_state.select(Some(i));
            }
            KeyCode::Up => {
                let len = self.focused_len();
                let i = match self.list_state.selected() {
                    Some(0) | None => len.saturating_sub(1),
                    Some(i) => i - 1,
                };
                self.list_state.select(Some(i));
            }
            _ => {}
        }
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Progress bar
                Constraint::Min(0),    // Proxy lists
                Constraint::Length(3), // Status bar
            ])
            .split(f.size());

        let title = Paragraph::new("Proxy Sieve")
            .style(Style::default().fg(Color::Cyan))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, chunks[0]);

        let summary = self.progress.summary();
        let progress = percent(summary.total, self.progress.total);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(progress)
            .label(format!("{}/{} ({}%)", summary.total, self.progress.total, progress));
        f.render_widget(gauge, chunks[1]);

        let proxy_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);

        render_outcomes(
            f,
            proxy_chunks[0],
            "Working",
            &self.progress.recent_working,
            summary.working,
            Color::Green,
            (self.pane == Pane::Working).then_some(&mut self.list_state),
        );

        render_outcomes(
            f,
            proxy_chunks[1],
            "Not working",
            &self.progress.recent_failed,
            summary.not_working,
            Color::Red,
            (self.pane == Pane::NotWorking).then_some(&mut self.list_state),
        );

        let status = Paragraph::new(self.progress.status_message.clone())
            .style(if self.progress.is_complete() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Yellow)
            })
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, chunks[3]);
    }
}

fn percent(done: usize, total: usize) -> u16 {
    if total == 0 {
        return 100;
    }
    (done as f64 / total as f64 * 100.0) as u16
}

/// One list entry: the address, plus type and category for working proxies
fn outcome_line(outcome: &ProbeOutcome) -> String {
    if outcome.is_working() {
        format!(
            "{} | {} | {}",
            outcome.address, outcome.class, outcome.anonymity
        )
    } else {
        outcome.address.to_string()
    }
}

fn render_outcomes(
    f: &mut Frame,
    area: Rect,
    title: &str,
    outcomes: &VecDeque<ProbeOutcome>,
    total_count: usize,
    color: Color,
    list_state: Option<&mut ListState>,
) {
    let items: Vec<ListItem> = outcomes
        .iter()
        .rev() // Show newest first
        .map(|outcome| ListItem::new(outcome_line(outcome)).style(Style::default().fg(color)))
        .collect();

    let border_style = if list_state.is_some() {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} ({})", title, total_count))
                .border_style(border_style),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    match list_state {
        Some(state) => f.render_stateful_widget(list, area, state),
        None => f.render_widget(list, area),
    }
}
