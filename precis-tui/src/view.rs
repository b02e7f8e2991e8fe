use crate::presentation::{Panel, summary_lines};
use crate::styles;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io::Stdout;
use textwrap::wrap;

pub const HELP_LINES: &[&str] = &[
    "  /page          summarize the current page",
    "  /video         summarize the current YouTube video",
    "  /key <key>     save your Gemini API key",
    "  /help          show this help",
    "  /quit          exit",
    "  F1 / F2        same as /page and /video",
];

pub struct ViewSnap {
    pub input: String,
    pub caret_col: u16,
    pub panel: Panel,
    pub show_help: bool,
    pub notice: Option<(String, Style)>,
    pub scroll: usize,
    pub spinner: &'static str,
    pub target: String,
}

/// Panel contents as styled lines, before wrapping.
pub fn panel_lines(panel: &Panel, show_help: bool, spinner: &str) -> Vec<(String, Style)> {
    let mut out = Vec::new();
    if show_help {
        out.push(("Commands:".to_string(), styles::label()));
        out.extend(HELP_LINES.iter().map(|l| (l.to_string(), styles::value())));
        out.push((String::new(), Style::default()));
    }
    match panel {
        Panel::Hidden => {
            if !show_help {
                out.push(("Type /page or /video, or /help.".to_string(), styles::dim()));
            }
        }
        Panel::Loading => out.push((format!("{spinner} Summarizing…"), styles::label())),
        Panel::Error(message) => {
            out.extend(message.split('\n').map(|l| (l.to_string(), styles::error())));
        }
        Panel::Summary(text) => {
            out.extend(
                summary_lines(text)
                    .into_iter()
                    .map(|l| (l.to_string(), styles::summary())),
            );
        }
    }
    out
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap) -> Result<()> {
    term.draw(|frame| {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(" Precis ", styles::title()),
            Span::styled(snap.target.clone(), styles::dim()),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(header, layout[0]);

        // Result panel
        let visible_h = layout[1].height.saturating_sub(2) as usize;
        let content_width = layout[1].width.saturating_sub(2) as usize;
        let wrapped = wrap_lines(
            &panel_lines(&snap.panel, snap.show_help, snap.spinner),
            content_width,
        );
        let total = wrapped.len();
        let scroll = snap.scroll.min(total.saturating_sub(visible_h));
        let start = scroll.min(total);
        let end = (start + visible_h).min(total);

        let items: Vec<ListItem> = wrapped[start..end]
            .iter()
            .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
            .collect();
        let body = List::new(items).block(Block::default().borders(Borders::ALL).title(" Summary "));
        frame.render_widget(body, layout[1]);

        let input_box = Paragraph::new(snap.input.clone())
            .block(Block::default().borders(Borders::ALL).title(" Input "));
        frame.render_widget(Clear, layout[2]);
        frame.render_widget(input_box, layout[2]);

        frame.set_cursor_position(Position {
            x: layout[2].x + 1 + snap.caret_col,
            y: layout[2].y + 1,
        });

        let status_line = match &snap.notice {
            Some((text, style)) => Line::from(vec![Span::raw(" "), Span::styled(text.clone(), *style)]),
            None if snap.panel.is_loading() => Line::from(vec![
                Span::raw(" "),
                Span::styled(snap.spinner, Style::default().fg(Color::Yellow)),
                Span::styled(" Working…", Style::default().fg(Color::Yellow)),
            ]),
            None => Line::from(vec![
                Span::raw(" "),
                Span::styled("Ready", Style::default().fg(Color::Green)),
            ]),
        };
        let status =
            Paragraph::new(status_line).block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[3]);
    })?;

    Ok(())
}

pub fn visual_caret_col(displayed: &str) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(displayed) as u16
}

fn wrap_lines(lines: &[(String, Style)], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for (text, style) in lines {
        if text.is_empty() {
            out.push((String::new(), *style));
            continue;
        }
        let segments = wrap(text, effective_width);
        if segments.is_empty() {
            out.push((String::new(), *style));
        } else {
            out.extend(segments.into_iter().map(|seg| (seg.into_owned(), *style)));
        }
    }

    out
}
