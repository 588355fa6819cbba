//! Shell — the presentation collaborator the orchestrator renders through.
//!
//! The orchestrator and show contexts never draw anything themselves; they
//! hand value types (trees, tables, panels, notifications) to a `Shell`.
//! `TuiShell` is the terminal implementation; tests record the calls.

use std::fmt;

use knive_proto::model::ConfigSection;
use knive_proto::pipeline::{NodeKind, PipelineNode};
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::event::UiAction;

/// Opaque reference to a display surface owned by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle(pub u64);

/// Opaque reference to a form window owned by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    CreateShow,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("No room for another tab (limit {0})")]
    TabLimit(usize),
    #[error("Display surface unavailable: {0}")]
    Unavailable(String),
}

/// Column headers plus string rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Content shown beside a show's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel {
    Overview {
        name: String,
        slug: String,
        url: String,
        recording: bool,
        outlets: Vec<String>,
    },
    Node {
        path: Vec<String>,
        kind: NodeKind,
    },
    Loading(String),
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Overview { name, .. } => write!(f, "{}", name),
            Panel::Node { path, .. } => write!(f, "{}", path.join(" › ")),
            Panel::Loading(what) => write!(f, "loading {}…", what),
        }
    }
}

pub trait Shell {
    /// Open a new tab for a show.
    fn request_tab(&mut self, slug: &str, title: &str) -> Result<TabHandle, ShellError>;

    fn close_tab(&mut self, tab: TabHandle);

    fn set_tab_title(&mut self, tab: TabHandle, title: &str);

    fn render_tree(&mut self, tab: TabHandle, tree: &PipelineNode);

    fn render_table(&mut self, tab: TabHandle, table: Table);

    fn render_panel(&mut self, tab: TabHandle, panel: Panel);

    /// Create a form window and show it.
    fn open_form(&mut self, kind: FormKind) -> FormHandle;

    /// Show a previously opened form again.
    fn reveal_form(&mut self, form: FormHandle);

    fn close_form(&mut self, form: FormHandle);

    fn fill_settings(&mut self, form: FormHandle, sections: &[ConfigSection]);

    fn notify(&mut self, severity: Severity, message: String);

    /// Headline status (phase, show count).
    fn set_status(&mut self, _status: String) {}

    /// Translate a key press into operator intents.
    fn handle_key(&mut self, _key: KeyEvent) -> Vec<UiAction> {
        Vec::new()
    }

    /// Called on every UI tick.
    fn tick(&mut self) {}
}
