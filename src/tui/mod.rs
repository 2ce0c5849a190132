//! Ratatui-based terminal UI.
//!
//! Left to right: a list of valid dates, a ticker multi-select, and the
//! rounded correlation table with a rolling chart of the first two selected
//! tickers underneath.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
    Terminal,
};

use crate::app::pipeline::{load_dataset, Dataset};
use crate::app::DEFAULT_SELECTION;
use crate::domain::{CorrelationOutcome, EmptyReason, DISPLAY_DECIMALS, WINDOW_LEN};
use crate::engine::{correlate, rolling_pair, RollingPoint};
use crate::error::AppError;
use crate::report::CorrelationTable;

mod plotters_chart;

use plotters_chart::RollingPlottersChart;

/// Start the TUI on the price source at `path`.
pub fn run(path: &Path) -> Result<(), AppError> {
    // Load before touching the terminal so errors print normally.
    let dataset = load_dataset(path)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(dataset);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Dates,
    Tickers,
}

struct App {
    dataset: Dataset,
    focus: Focus,
    /// Index into `dataset.valid_dates()`.
    date_idx: usize,
    ticker_cursor: usize,
    /// Selected instrument indices, in the order they were picked.
    selection: Vec<usize>,
    outcome: CorrelationOutcome,
    table: CorrelationTable,
    pair: Option<(String, String)>,
    rolling: Vec<RollingPoint>,
    status: String,
}

impl App {
    fn new(dataset: Dataset) -> Self {
        let n = dataset.instruments().len();
        let selection = (0..n.min(DEFAULT_SELECTION)).collect();
        let date_idx = dataset.valid_dates().len().saturating_sub(1);

        let mut app = Self {
            dataset,
            focus: Focus::Dates,
            date_idx,
            ticker_cursor: 0,
            selection,
            outcome: CorrelationOutcome::Empty(EmptyReason::TooFewInstruments { requested: 0 }),
            table: CorrelationTable::empty(),
            pair: None,
            rolling: Vec::new(),
            status: String::new(),
        };
        app.recompute();
        app
    }

    fn current_date(&self) -> Option<NaiveDate> {
        self.dataset.valid_dates().get(self.date_idx).copied()
    }

    fn selected_tickers(&self) -> Vec<String> {
        let instruments = self.dataset.instruments();
        self.selection
            .iter()
            .filter_map(|&i| instruments.get(i).cloned())
            .collect()
    }

    /// Re-run the correlation query (and the rolling series if the pair changed).
    fn recompute(&mut self) {
        let tickers = self.selected_tickers();

        self.outcome = match self.current_date() {
            Some(date) => correlate(&self.dataset.returns, &tickers, date),
            None => CorrelationOutcome::Empty(EmptyReason::InsufficientHistory {
                position: self.dataset.returns.n_rows().saturating_sub(1),
                window: WINDOW_LEN,
            }),
        };
        self.table = CorrelationTable::from_outcome(&self.outcome);

        let pair = match tickers.as_slice() {
            [a, b, ..] => Some((a.clone(), b.clone())),
            _ => None,
        };
        if pair != self.pair {
            self.rolling = match &pair {
                Some((a, b)) => rolling_pair(&self.dataset.returns, a, b),
                None => Vec::new(),
            };
            self.pair = pair;
        }

        self.status = match &self.outcome {
            CorrelationOutcome::Matrix(m) => {
                format!("{} tickers, window {} .. {}", m.len(), m.window_start, m.window_end)
            }
            CorrelationOutcome::Empty(reason) => format!("No data: {reason}"),
        };
        tracing::debug!(tickers = tickers.len(), date = ?self.current_date(), "recomputed correlation");
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Dates => Focus::Tickers,
                    Focus::Tickers => Focus::Dates,
                };
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') if self.focus == Focus::Tickers => {
                self.toggle(self.ticker_cursor);
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.focus {
            Focus::Dates => {
                let len = self.dataset.valid_dates().len();
                let next = step(self.date_idx, delta, len);
                if next != self.date_idx {
                    self.date_idx = next;
                    self.recompute();
                }
            }
            Focus::Tickers => {
                let len = self.dataset.instruments().len();
                self.ticker_cursor = step(self.ticker_cursor, delta, len);
            }
        }
    }

    /// Deselect `idx` if picked, otherwise append it to the selection.
    fn toggle(&mut self, idx: usize) {
        if idx >= self.dataset.instruments().len() {
            return;
        }
        match self.selection.iter().position(|&i| i == idx) {
            Some(pos) => {
                self.selection.remove(pos);
            }
            None => self.selection.push(idx),
        }
        self.recompute();
    }

    fn export(&mut self) {
        let Some(as_of) = self.table.as_of else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = PathBuf::from(format!("correlation_{}.csv", as_of.format("%Y-%m-%d")));
        self.status = match crate::io::export::write_table_csv(&path, &self.table) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.dataset.stats;
        let lines = vec![
            Line::from(vec![
                Span::styled("corrx", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {WINDOW_LEN}-day correlation explorer | {}", self.dataset.source.display())),
            ]),
            Line::from(Span::styled(
                format!(
                    "files: {} | rows kept: {} | tickers: {} | valid dates: {}",
                    stats.resources_read,
                    stats.rows_kept,
                    self.dataset.instruments().len(),
                    self.dataset.valid_dates().len(),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(16), Constraint::Length(16), Constraint::Min(0)])
            .split(area);

        self.draw_dates(frame, cols[0]);
        self.draw_tickers(frame, cols[1]);

        let table_height = (self.table.rows.len() as u16).saturating_add(4).max(5);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(table_height), Constraint::Min(0)])
            .split(cols[2]);

        self.draw_table(frame, right[0]);
        self.draw_chart(frame, right[1]);
    }

    fn focus_block(&self, title: &'static str, focus: Focus) -> Block<'static> {
        let style = if self.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Block::default().title(title).borders(Borders::ALL).border_style(style)
    }

    fn draw_dates(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .dataset
            .valid_dates()
            .iter()
            .map(|d| ListItem::new(d.format("%Y-%m-%d").to_string()))
            .collect();
        let list = List::new(items)
            .block(self.focus_block("Date", Focus::Dates))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if self.current_date().is_some() {
            state.select(Some(self.date_idx));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_tickers(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .dataset
            .instruments()
            .iter()
            .enumerate()
            .map(|(i, id)| {
                // Pick order, so the table's row order is visible in the list.
                let mark = match self.selection.iter().position(|&s| s == i) {
                    Some(pos) => format!("{:>2}", pos + 1),
                    None => "  ".to_string(),
                };
                ListItem::new(format!("[{mark}] {id}"))
            })
            .collect();
        let list = List::new(items)
            .block(self.focus_block("Tickers", Focus::Tickers))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if !self.dataset.instruments().is_empty() {
            state.select(Some(self.ticker_cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match self.table.as_of {
            Some(d) => format!("Correlation as of {d}"),
            None => "Correlation".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if self.table.is_empty() {
            let msg = Paragraph::new(self.status.clone())
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        }

        let prec = DISPLAY_DECIMALS as usize;
        let label_w = self.table.instruments.iter().map(String::len).max().unwrap_or(0).max(6) as u16;
        let col_w = (prec as u16 + 3).max(label_w);

        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(self.table.instruments.iter().map(|id| Cell::from(id.clone())))
                .collect::<Vec<_>>(),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.table.rows.iter().map(|row| {
            let mut cells = vec![Cell::from(row.instrument.clone()).style(Style::default().add_modifier(Modifier::BOLD))];
            cells.extend(
                row.values
                    .iter()
                    .map(|v| Cell::from(format!("{v:>+.prec$}")).style(value_style(*v))),
            );
            Row::new(cells)
        });

        let widths = std::iter::once(Constraint::Length(label_w))
            .chain(self.table.instruments.iter().map(|_| Constraint::Length(col_w)))
            .collect::<Vec<_>>();

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match &self.pair {
            Some((a, b)) => format!("Rolling {WINDOW_LEN}-day correlation {a}/{b}"),
            None => "Rolling correlation".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.rolling.is_empty() {
            let msg = Paragraph::new("Select at least two tickers with history.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let (points, dates, x_bounds) = chart_series(&self.rolling);
        let widget = RollingPlottersChart {
            points: &points,
            dates: &dates,
            x_bounds,
            y_bounds: [-1.05, 1.05],
            y_label: "corr",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab focus  ↑/↓ move  Space toggle  e export csv  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Move `cur` by `delta`, clamped to `0..len`.
fn step(cur: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cur.saturating_add_signed(delta).min(len - 1)
}

fn value_style(v: f64) -> Style {
    if v >= 0.5 {
        Style::default().fg(Color::Green)
    } else if v <= -0.5 {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    }
}

/// Index the series by position so gaps (weekends, missing days) don't stretch the x axis.
fn chart_series(series: &[RollingPoint]) -> (Vec<(f64, f64)>, Vec<NaiveDate>, [f64; 2]) {
    let points = series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect::<Vec<_>>();
    let dates = series.iter().map(|p| p.date).collect();
    let x_max = (series.len().saturating_sub(1) as f64).max(1.0);
    (points, dates, [0.0, x_max])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_sample, write_sample, SampleConfig};

    fn sample_app(days: usize) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices");
        let sample = generate_sample(&SampleConfig {
            tickers: ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"].iter().map(|s| s.to_string()).collect(),
            days,
            ..SampleConfig::default()
        })
        .unwrap();
        write_sample(&sample, &path).unwrap();
        let app = App::new(load_dataset(&path).unwrap());
        (dir, app)
    }

    #[test]
    fn defaults_to_last_date_and_first_five_tickers() {
        let (_dir, app) = sample_app(30);
        assert_eq!(app.current_date(), app.dataset.valid_dates().last().copied());
        assert_eq!(app.selected_tickers(), vec!["AAA", "BBB", "CCC", "DDD", "EEE"]);
        assert_eq!(app.table.rows.len(), 5);
        assert_eq!(app.pair, Some(("AAA".to_string(), "BBB".to_string())));
        assert_eq!(app.rolling.len(), app.dataset.valid_dates().len());
    }

    #[test]
    fn deselecting_down_to_one_ticker_empties_table() {
        let (_dir, mut app) = sample_app(30);
        app.handle_key(KeyCode::Tab);
        for _ in 0..4 {
            app.handle_key(KeyCode::Char(' '));
            app.handle_key(KeyCode::Down);
        }
        assert_eq!(app.selected_tickers(), vec!["EEE"]);
        assert!(app.table.is_empty());
        assert!(app.rolling.is_empty());
        assert!(app.status.starts_with("No data"));
    }

    #[test]
    fn table_follows_pick_order() {
        let (_dir, mut app) = sample_app(30);
        app.handle_key(KeyCode::Tab);
        // Drop AAA, then pick it again: it moves to the end.
        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.selected_tickers(), vec!["BBB", "CCC", "DDD", "EEE", "AAA"]);
        assert_eq!(app.table.instruments, vec!["BBB", "CCC", "DDD", "EEE", "AAA"]);
        assert_eq!(app.pair, Some(("BBB".to_string(), "CCC".to_string())));

        // FFF picked last lands after AAA.
        for _ in 0..5 {
            app.handle_key(KeyCode::Down);
        }
        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.table.rows.last().map(|r| r.instrument.as_str()), Some("FFF"));
    }

    #[test]
    fn moving_date_changes_query() {
        let (_dir, mut app) = sample_app(30);
        let last = app.table.as_of;
        app.handle_key(KeyCode::Up);
        assert_ne!(app.table.as_of, last);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn no_valid_dates_shows_empty_state() {
        let (_dir, app) = sample_app(10);
        assert!(app.current_date().is_none());
        assert!(app.table.is_empty());
        assert!(app.rolling.is_empty());
        assert!(app.status.starts_with("No data: not enough history"));
    }

    #[test]
    fn step_clamps() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 1, 5), 3);
        assert_eq!(step(3, 1, 0), 0);
    }

    #[test]
    fn chart_series_indexes_by_position() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 7, day).unwrap();
        let series = vec![
            RollingPoint { date: d(1), value: 0.5 },
            RollingPoint { date: d(7), value: -0.2 },
        ];
        let (points, dates, x) = chart_series(&series);
        assert_eq!(points, vec![(0.0, 0.5), (1.0, -0.2)]);
        assert_eq!(dates, vec![d(1), d(7)]);
        assert_eq!(x, [0.0, 1.0]);
    }
}
