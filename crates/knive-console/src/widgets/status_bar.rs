//! Status bar — phase headline and keybindings footer.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_LOADING, C_MUTED, C_ON_AIR, C_SECONDARY, C_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    CreateShow,
    Settings,
    Editing,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::CreateShow => "NEW SHOW",
            Self::Settings => "SETTINGS",
            Self::Editing => "EDIT",
        }
    }

    fn keys(self) -> &'static str {
        match self {
            Self::Normal => {
                " ←→/Tab shows  ↑↓/jk tree  Enter open  b broadcast  e episodes  1-3 add outlet  d remove outlet  x close  n new  s settings  r reload  q quit"
            }
            Self::CreateShow => " type a name  Enter create  Esc cancel",
            Self::Settings => " ↑↓ select  Enter edit  Esc hide",
            Self::Editing => " type value  Enter save  Esc cancel",
        }
    }
}

/// Draw the status line: load state bulb plus the orchestrator's headline.
pub fn draw_status_bar(frame: &mut Frame, area: Rect, status: &str) {
    let bulb = if status.starts_with("ready") {
        Span::styled("●", Style::default().fg(C_ON_AIR))
    } else if status.starts_with("loading") {
        Span::styled("●", Style::default().fg(C_LOADING))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    };
    let line = Line::from(vec![
        bulb,
        Span::raw(" "),
        Span::styled(status, Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default()
                .fg(C_SECONDARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(mode.keys(), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
