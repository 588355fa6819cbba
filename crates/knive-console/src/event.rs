//! Everything that flows into the orchestrator loop.

use knive_proto::error::BackendError;
use knive_proto::model::{ConfigSection, Episode, Setting, ShowRecord};
use knive_proto::pipeline::OutletKind;
use ratatui::crossterm::event::Event;

use crate::context::EpisodeRequest;
use crate::shell::FormHandle;
use crate::store::LoadOutcome;

/// Operator intents, produced by the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    // ── Global ───────────────────────────────────────────────────────────────
    CreateShow,
    SubmitCreateShow { name: String },
    OpenSettings,
    SubmitSetting {
        section: String,
        key: String,
        value: String,
    },
    Reload,
    Quit,

    // ── Per show ─────────────────────────────────────────────────────────────
    CloseShow(String),
    Broadcast(String),
    Episodes(String),
    NodeClicked { slug: String, path: Vec<String> },
    AddOutlet { slug: String, kind: OutletKind },
    RemoveOutlet { slug: String, name: String },
}

/// Inputs into the orchestrator loop.
#[derive(Debug)]
pub enum ConsoleEvent {
    /// Raw terminal input, translated into `UiAction`s by the shell.
    Input(Event),
    Ui(UiAction),
    /// A `ShowStore::load` future resolved.
    StoreLoaded(LoadOutcome),
    /// Deferred creation of one show context.
    Materialize { ticket: u64, record: ShowRecord },
    /// A backend create for `slug` returned; `ticket` is the submit's.
    ShowCreated {
        ticket: u64,
        slug: String,
        result: Result<ShowRecord, BackendError>,
    },
    EpisodesLoaded {
        request: EpisodeRequest,
        result: Result<Vec<Episode>, BackendError>,
    },
    SettingsLoaded {
        form: FormHandle,
        result: Result<Vec<ConfigSection>, BackendError>,
    },
    SettingSaved {
        section: String,
        result: Result<Setting, BackendError>,
    },
    /// UI animation tick (toast expiry).
    Tick,
}
