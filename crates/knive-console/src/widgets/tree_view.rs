//! TreeView — a pipeline tree flattened into selectable rows.

use knive_proto::pipeline::{NodeKind, PipelineNode};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{style_muted, style_node, style_selected};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    /// Label path from the root, as accepted by `PipelineNode::select`.
    pub path: Vec<String>,
    pub kind: NodeKind,
}

impl TreeRow {
    pub fn label(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

/// Depth-first rows for every node below the root.
pub fn flatten(root: &PipelineNode) -> Vec<TreeRow> {
    root.walk()
        .into_iter()
        .map(|(path, node)| TreeRow {
            depth: path.len().saturating_sub(1),
            path,
            kind: node.kind,
        })
        .collect()
}

/// Cut `text` to `width` terminal columns, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub fn draw_tree(frame: &mut Frame, area: Rect, block: Block<'_>, rows: &[TreeRow], cursor: usize) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let glyph = if row.kind.is_leaf() { "· " } else { "▾ " };
            let room = inner_width.saturating_sub(indent.width() + glyph.width());
            ListItem::new(Line::from(vec![
                Span::raw(indent),
                Span::styled(glyph, style_muted()),
                Span::styled(truncate(row.label(), room), style_node(row.kind)),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(style_selected());
    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(cursor.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
