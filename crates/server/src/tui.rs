use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Row, Table, TableState, Tabs};

use asteroids::net::{ClientInfo, ServerStats};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Connections,
    Log,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Connections, Tab::Log];

    fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Connections => "Connections",
            Tab::Log => "Log",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
enum LogLevel {
    Info,
    Warn,
    Error,
}

struct LogLine {
    level: LogLevel,
    message: String,
}

pub struct TuiState {
    tab: Tab,
    log: VecDeque<LogLine>,
    /// Lines scrolled up from the bottom of the log.
    scroll: usize,
    selected: usize,
    pending_kick: Option<usize>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            tab: Tab::Overview,
            log: VecDeque::new(),
            scroll: 0,
            selected: 0,
            pending_kick: None,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.tab
    }

    pub fn next_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
    }

    pub fn prev_tab(&mut self) {
        self.tab = Tab::ALL[(self.tab.index() + Tab::ALL.len() - 1) % Tab::ALL.len()];
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Warn, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push_log(LogLevel::Error, message.into());
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(LogLine { level, message });
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 10).min(self.log.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(10);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn select_prev_connection(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }

    pub fn select_next_connection(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn request_kick(&mut self, clients: &[ClientInfo]) {
        if let Some(client) = clients.get(self.selected) {
            self.pending_kick = Some(client.slot);
        }
    }

    pub fn take_pending_kick(&mut self) -> Option<usize> {
        self.pending_kick.take()
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &ServerStats, clients: &[ClientInfo]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_tabs(frame, chunks[1], state.tab);
    match state.tab {
        Tab::Overview => render_overview(frame, chunks[2], state, stats),
        Tab::Connections => render_connections(frame, chunks[2], state, clients),
        Tab::Log => render_log(frame, chunks[2], state),
    }
    render_help(frame, chunks[3], state.tab);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let title = format!(" Asteroids Server - Uptime: {} ", format_duration(stats.uptime_secs));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Tick: {} @ {} Hz  |  Ships: {}  |  Asteroids: {}  |  Lasers: {}",
        stats.tick, stats.tick_rate, stats.ship_count, stats.asteroid_count, stats.laser_count
    );
    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, area: Rect, active: Tab) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
        .block(Block::default().borders(Borders::ALL))
        .select(active.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_overview(frame: &mut Frame, area: Rect, state: &TuiState, stats: &ServerStats) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(0),
        ])
        .split(area);

    let max_clients = stats.max_clients.max(1);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Status ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((stats.client_count as f64 / max_clients as f64).min(1.0))
        .label(format!("{}/{} clients", stats.client_count, max_clients));
    frame.render_widget(gauge, chunks[0]);

    render_network(frame, chunks[1], stats);
    render_log(frame, chunks[2], state);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let net = &stats.network_stats;
    let lines = vec![
        stat_line(
            "Frames: ",
            format!("{} sent / {} recv", net.frames_sent, net.frames_received),
        ),
        stat_line(
            "Bytes: ",
            format!(
                "{} sent / {} recv",
                format_bytes(net.bytes_sent),
                format_bytes(net.bytes_received)
            ),
        ),
        stat_line(
            "Snapshots: ",
            format!(
                "{} ({} raw -> {} compressed, {:.1}x)",
                stats.snapshots_sent,
                format_bytes(stats.snapshot_bytes_raw),
                format_bytes(stats.snapshot_bytes_compressed),
                stats.compression_ratio()
            ),
        ),
        stat_line(
            "Last snapshot: ",
            format!(
                "{}  |  Inputs: {}",
                format_bytes(stats.last_snapshot_bytes as u64),
                stats.inputs_received
            ),
        ),
        Line::from(vec![
            Span::styled("Deferred sends: ", Style::default().fg(Color::Gray)),
            Span::styled(
                net.sends_deferred.to_string(),
                Style::default().fg(if net.sends_deferred > 0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn render_connections(frame: &mut Frame, area: Rect, state: &TuiState, clients: &[ClientInfo]) {
    let header = Row::new(["Slot", "Ship", "Address", "Connected", "Inputs", "Last snapshot", "Sent"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

    let rows = clients.iter().map(|client| {
        Row::new([
            client.slot.to_string(),
            client.ship_id.to_string(),
            client
                .addr
                .map_or_else(|| "-".to_string(), |addr| addr.to_string()),
            format_duration(client.connected_secs),
            client.inputs_received.to_string(),
            format_bytes(client.last_snapshot_bytes as u64),
            format_bytes(client.network_stats.bytes_sent),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Min(21),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Connections ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray));

    let mut table_state = TableState::default();
    if !clients.is_empty() {
        table_state.select(Some(state.selected.min(clients.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let visible = area.height.saturating_sub(2) as usize;
    let end = state.log.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = state
        .log
        .range(start..end)
        .map(|line| {
            let (tag, color) = match line.level {
                LogLevel::Info => ("INFO ", Color::Green),
                LogLevel::Warn => ("WARN ", Color::Yellow),
                LogLevel::Error => ("ERROR", Color::Red),
            };
            Line::from(vec![
                Span::styled(tag, Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(line.message.as_str()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect, tab: Tab) {
    let hint = match tab {
        Tab::Connections => "Up/Down select  |  k kick  |  a spawn asteroid  |  Tab switch  |  q quit",
        Tab::Log => "PgUp/PgDn scroll  |  End follow  |  a spawn asteroid  |  Tab switch  |  q quit",
        Tab::Overview => "a spawn asteroid  |  Tab switch  |  q quit",
    };
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let text = Paragraph::new(hint).block(block).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
