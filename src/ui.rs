use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typetrial::{
    scoring::{Classification, ClassifiedChar},
    session::SessionPhase,
    stats::{overall_summary, BestStats},
    surface::Notice,
};

use crate::app::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Trial => render_trial(self, area, buf),
            Screen::History => render_history(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_trial(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Min(3),    // target text
            Constraint::Length(5), // typing area
            Constraint::Length(1), // name + personal bests
            Constraint::Length(1), // notice
            Constraint::Length(1), // help
        ])
        .split(area);

    stats_line(app).render(chunks[0], buf);

    let target = app.controller.session().target();
    let fits_one_line = target.width() <= chunks[2].width as usize;
    Paragraph::new(Line::from(classified_spans(&app.view().classification)))
        .alignment(if fits_one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let input_style = if app.phase() == SessionPhase::Running {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    Paragraph::new(app.input.as_str())
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Type the text above here"),
        )
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    name_line(app).render(chunks[4], buf);

    if let Some(notice) = app.view().last_notice() {
        notice_line(notice).render(chunks[5], buf);
    }

    Paragraph::new(Span::styled(
        help_text(app.phase()),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);
}

fn stats_line(app: &App) -> Paragraph<'static> {
    let m = app.view().metrics;
    let time = match app.phase() {
        SessionPhase::Expired | SessionPhase::Submitted => "Time: 0s - Test Complete!".to_string(),
        _ => format!("Time: {}s", m.remaining_secs),
    };

    Paragraph::new(Line::from(vec![
        Span::styled(time, bold().fg(Color::Blue)),
        Span::raw("   "),
        Span::styled(format!("WPM: {}", m.wpm), bold().fg(Color::Green)),
        Span::raw("   "),
        Span::styled(format!("Accuracy: {}%", m.accuracy), bold().fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled(format!("Chars: {}", m.total_chars), bold().fg(Color::Magenta)),
    ]))
    .alignment(Alignment::Center)
}

fn classified_spans(chars: &[ClassifiedChar]) -> Vec<Span<'static>> {
    let dim = Style::default().add_modifier(Modifier::DIM);

    chars
        .iter()
        .map(|c| match c.class {
            Classification::Correct => Span::styled(c.char.to_string(), bold().fg(Color::Green)),
            Classification::Incorrect => Span::styled(
                match c.char {
                    ' ' => "·".to_owned(),
                    ch => ch.to_string(),
                },
                bold().fg(Color::Red),
            ),
            Classification::Current => Span::styled(
                c.char.to_string(),
                bold().add_modifier(Modifier::UNDERLINED),
            ),
            Classification::Pending => Span::styled(c.char.to_string(), dim),
        })
        .collect()
}

fn best_stats_text(best: &BestStats) -> String {
    format!(
        "Best: {} WPM, {}% | Avg: {:.1} WPM | Tests: {}",
        best.best_wpm, best.best_accuracy, best.avg_wpm, best.total_tests
    )
}

fn name_line(app: &App) -> Paragraph<'static> {
    let mut spans = vec![
        Span::raw("Your Name: "),
        Span::styled(app.name.clone(), bold()),
    ];

    match app.best_hint {
        Some(best) if best.total_tests > 0 => {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                best_stats_text(&best),
                Style::default().fg(Color::Green),
            ));
        }
        Some(_) => spans.push(Span::styled(
            "   New user - no previous tests",
            Style::default().add_modifier(Modifier::DIM),
        )),
        None => {}
    }

    Paragraph::new(Line::from(spans))
}

fn notice_line(notice: &Notice) -> Paragraph<'static> {
    let (text, color) = notice_text(notice);
    Paragraph::new(Span::styled(text, bold().fg(color))).alignment(Alignment::Center)
}

fn notice_text(notice: &Notice) -> (String, Color) {
    match notice {
        Notice::Rejected(msg) => (msg.clone(), Color::Red),
        Notice::TimeUp => (
            "Time's up! Press Enter to submit your results.".to_string(),
            Color::Yellow,
        ),
        Notice::Submitted { result, tier, best } => {
            let mut text = format!(
                "{} WPM | {} CPM | {}% accuracy | {} typed, {} correct, {} incorrect | {}",
                result.wpm,
                result.cpm,
                result.accuracy,
                result.total_chars,
                result.correct_chars,
                result.incorrect_chars,
                tier.message()
            );
            // Personal records only mean something once there is more than this result.
            if best.total_tests > 1 {
                text.push_str(" | ");
                text.push_str(&best_stats_text(best));
            }
            (text, Color::Green)
        }
        Notice::SubmitFailed(msg) => (
            format!("Could not save result ({msg}). Press Enter to retry."),
            Color::Red,
        ),
    }
}

fn help_text(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle | SessionPhase::Submitted => {
            "(enter) start   (tab) history   (ctrl+r) new text   (esc) quit"
        }
        SessionPhase::Running => "(ctrl+r) reset   (esc) quit",
        SessionPhase::Expired => "(enter) submit   (ctrl+r) discard   (esc) quit",
    }
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(3),    // table
            Constraint::Length(1), // summary
            Constraint::Length(1), // help
        ])
        .split(area);

    let header = Row::new(
        [
            "Username",
            "WPM",
            "Accuracy %",
            "Total Chars",
            "Correct",
            "Incorrect",
            "CPM",
            "Date",
            "Time",
        ]
        .map(Cell::from),
    )
    .style(bold().fg(Color::Yellow));

    let rows: Vec<Row> = app
        .history
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.username.clone()),
                Cell::from(r.wpm.to_string()),
                Cell::from(format!("{}%", r.accuracy)),
                Cell::from(r.total_chars.to_string()),
                Cell::from(r.correct_chars.to_string()),
                Cell::from(r.incorrect_chars.to_string()),
                Cell::from(r.chars_per_minute.to_string()),
                Cell::from(r.date.clone()),
                Cell::from(r.time.clone()),
            ])
        })
        .collect();

    let title = match app.history_filter() {
        Some(name) => format!("History for {name}"),
        None => "History (all users)".to_string(),
    };

    Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .render(chunks[0], buf);

    let summary = if app.history.is_empty() {
        "No test records found.".to_string()
    } else {
        match (app.history_filter(), app.best_hint) {
            (Some(name), Some(best)) => format!("Stats for {name}: {}", best_stats_text(&best)),
            _ => {
                let s = overall_summary(&app.history);
                format!(
                    "Total Tests: {} | Unique Users: {} | Average WPM: {:.1} | Average Accuracy: {:.1}%",
                    s.total_tests, s.unique_users, s.avg_wpm, s.avg_accuracy
                )
            }
        }
    };

    Paragraph::new(Span::styled(summary, Style::default().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(tab) back   (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}
