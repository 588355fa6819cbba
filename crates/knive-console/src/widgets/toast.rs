//! Toasts — expiring notices stacked in the top-right corner.
//!
//! A notice that repeats while still visible is folded into the existing
//! toast: its lifetime restarts and a repeat count is shown.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::shell::Severity;
use crate::theme::{C_MUTED, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

const MAX_VISIBLE: usize = 4;
const MAX_QUEUED: usize = 8;

struct Toast {
    message: String,
    severity: Severity,
    repeats: u32,
    expires: Instant,
}

impl Toast {
    fn marker(&self) -> (&'static str, ratatui::style::Color) {
        match self.severity {
            Severity::Info => ("·", C_TOAST_INFO),
            Severity::Success => ("✓", C_TOAST_SUCCESS),
            Severity::Warning => ("!", C_TOAST_WARNING),
            Severity::Error => ("✗", C_TOAST_ERROR),
        }
    }
}

fn lifetime(severity: Severity) -> Duration {
    match severity {
        Severity::Info | Severity::Success => Duration::from_secs(3),
        Severity::Warning => Duration::from_secs(4),
        Severity::Error => Duration::from_secs(6),
    }
}

#[derive(Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for as long as its severity warrants.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.push_for(message.into(), severity, lifetime(severity));
    }

    fn push_for(&mut self, message: String, severity: Severity, ttl: Duration) {
        let expires = Instant::now() + ttl;
        if let Some(pos) = self
            .toasts
            .iter()
            .position(|t| t.message == message && t.severity == severity)
        {
            if let Some(mut toast) = self.toasts.remove(pos) {
                toast.repeats += 1;
                toast.expires = expires;
                self.toasts.push_back(toast);
            }
            return;
        }
        self.toasts.push_back(Toast {
            message,
            severity,
            repeats: 1,
            expires,
        });
        while self.toasts.len() > MAX_QUEUED {
            self.toasts.pop_front();
        }
    }

    /// Drop expired toasts. Called on every UI tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Newest toast on top, right-aligned inside `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let max_width = (area.width / 2).clamp(30, 60).min(area.width);
        let bottom = area.y + area.height;
        let rows = (area.y + 1..bottom).zip(self.toasts.iter().rev().take(MAX_VISIBLE));
        for (y, toast) in rows {
            let (icon, color) = toast.marker();
            let mut spans = vec![Span::styled(
                format!(" {} {} ", icon, toast.message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if toast.repeats > 1 {
                spans.push(Span::styled(
                    format!("×{} ", toast.repeats),
                    Style::default().fg(C_MUTED),
                ));
            }
            let line = Line::from(spans);
            let width = (line.width() as u16).min(max_width);
            let slot = Rect {
                x: area.x + area.width.saturating_sub(width + 1),
                y,
                width,
                height: 1,
            };
            frame.render_widget(Clear, slot);
            frame.render_widget(Paragraph::new(line), slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeats_fold_into_one_toast() {
        let mut toasts = ToastManager::new();
        toasts.notify(Severity::Error, "backend down");
        toasts.notify(Severity::Error, "backend down");
        toasts.notify(Severity::Info, "reloading");
        assert_eq!(toasts.len(), 2);
        let folded = toasts
            .toasts
            .iter()
            .find(|t| t.message == "backend down")
            .map(|t| t.repeats);
        assert_eq!(folded, Some(2));
    }

    #[test]
    fn test_same_text_different_severity_stays_separate() {
        let mut toasts = ToastManager::new();
        toasts.notify(Severity::Info, "alpha");
        toasts.notify(Severity::Error, "alpha");
        assert_eq!(toasts.len(), 2);
    }

    #[test]
    fn test_expired_toasts_are_dropped_on_tick() {
        let mut toasts = ToastManager::new();
        toasts.push_for("gone".to_string(), Severity::Info, Duration::ZERO);
        toasts.notify(Severity::Warning, "stays");
        toasts.tick();
        assert_eq!(toasts.len(), 1);
        assert!(!toasts.is_empty());
    }

    #[test]
    fn test_queue_is_capped() {
        let mut toasts = ToastManager::new();
        for i in 0..20 {
            toasts.notify(Severity::Info, format!("notice {}", i));
        }
        assert_eq!(toasts.len(), MAX_QUEUED);
    }
}
