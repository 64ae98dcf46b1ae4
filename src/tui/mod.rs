//! TUI module - Session dashboard with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};
use std::io::{stdout, Stdout};

use crate::coach::Mode;
use crate::db::{Database, Store, StoredSession};
use crate::drills::{BodyPart, Catalog};

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Normal => Color::Green,
        Mode::Regressed => Color::Yellow,
        Mode::Reset => Color::LightRed,
        Mode::Blocked => Color::Red,
    }
}

/// App state for TUI
pub struct App {
    db: Database,
    catalog: Catalog,
    body_part: BodyPart,
    session: Option<StoredSession>,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database, catalog: Catalog, body_part: BodyPart) -> Result<Self> {
        let session = db.load_session(body_part)?;
        Ok(Self {
            db,
            catalog,
            body_part,
            session,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(9),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let (title, color) = match &self.session {
            Some(s) => {
                let mode = s.progress.state.mode;
                (format!("rehab-coach | {} | {}", self.body_part, mode), mode_color(mode))
            }
            None => (format!("rehab-coach | {} | no session", self.body_part), Color::Cyan),
        };
        let header = Paragraph::new(title)
            .style(Style::default().fg(color).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        frame.render_widget(self.plan_table(), chunks[1]);
        frame.render_widget(self.detail(), chunks[2]);

        // Footer
        let footer = Paragraph::new("q: quit | r: refresh")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn plan_table(&self) -> Table<'static> {
        let rows: Vec<Row> = match &self.session {
            Some(s) => s
                .progress
                .state
                .plan
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let marker = match i.cmp(&s.progress.position) {
                        std::cmp::Ordering::Less => "done",
                        std::cmp::Ordering::Equal => ">>",
                        std::cmp::Ordering::Greater => "",
                    };
                    let (title, dosage) = match self.catalog.drill(id) {
                        Ok(d) => (d.title.to_string(), d.dosage.format()),
                        Err(e) => (e.to_string(), String::new()),
                    };
                    Row::new(vec![
                        Cell::from(marker),
                        Cell::from(title),
                        Cell::from(dosage),
                    ])
                })
                .collect(),
            None => Vec::new(),
        };

        Table::new(
            rows,
            [Constraint::Length(6), Constraint::Min(24), Constraint::Length(24)],
        )
        .header(Row::new(vec!["", "Drill", "Dosage"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Plan"))
    }

    fn detail(&self) -> Paragraph<'static> {
        let mut lines: Vec<Line> = Vec::new();
        match &self.session {
            None => lines.push(Line::from("Run `rehab-coach check-in` to start a session.")),
            Some(s) if s.progress.state.is_blocked() => {
                if let Some(flag) = &s.flag {
                    lines.push(Line::from(flag.title.clone()).bold());
                    lines.push(Line::from(flag.description.clone()));
                    lines.push(Line::from(flag.recommended_action.clone()).fg(Color::Red));
                }
            }
            Some(s) if s.progress.is_complete() => {
                lines.push(Line::from("Session complete.").fg(Color::Green));
            }
            Some(s) => {
                if let Some(focus) = &s.focus {
                    lines.push(Line::from(format!("Focus zone: {} (severity {:.1})", focus.label, focus.severity)));
                }
                match s.progress.current_drill_id().map(|id| self.catalog.drill(id)) {
                    Some(Ok(drill)) => {
                        lines.push(Line::from(format!("{} - {}", drill.title, drill.dosage.format())).bold());
                        lines.push(Line::from(drill.intent).italic());
                        for cue in drill.cues {
                            lines.push(Line::from(format!("  - {}", cue)));
                        }
                    }
                    Some(Err(e)) => lines.push(Line::from(e.to_string()).fg(Color::Red)),
                    None => {}
                }
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Current"))
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => {
                            self.session = self.db.load_session(self.body_part)?;
                        }
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
