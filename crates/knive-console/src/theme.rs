//! Color palette and style constants for the knive console.

use ratatui::style::{Color, Modifier, Style};

use knive_proto::pipeline::NodeKind;

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_ON_AIR: Color = Color::Rgb(80, 200, 120);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_INPUT_BG: Color = Color::Rgb(20, 20, 32);
pub const C_INPUT_FG: Color = Color::Rgb(255, 200, 80);
pub const C_OUTLET: Color = Color::Rgb(80, 140, 200);
pub const C_QUALITY: Color = Color::Rgb(100, 160, 130);
pub const C_GROUP: Color = Color::Rgb(180, 120, 220);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

pub fn style_selected() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_input() -> Style {
    Style::default().fg(C_INPUT_FG).bg(C_INPUT_BG)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

/// Tree label color by node shape.
pub fn style_node(kind: NodeKind) -> Style {
    match kind {
        NodeKind::OutletsGroup | NodeKind::QualitiesGroup => Style::default().fg(C_GROUP),
        NodeKind::Outlet(_) => Style::default().fg(C_OUTLET),
        NodeKind::Quality => Style::default().fg(C_QUALITY),
        _ => style_default(),
    }
}
