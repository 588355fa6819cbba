//! Orchestrator — owns every open show and routes events to it.
//!
//! Architecture:
//! - One `Orchestrator` per process, driven by `app::run`, handling one
//!   `ConsoleEvent` at a time.
//! - Backend calls are spawned tokio tasks that post their result back over
//!   a bounded `mpsc` channel.
//! - Context creation is scheduled as a ticketed `Materialize` event on an
//!   internal queue that drains before the channel.  A ticket that no longer
//!   matches `pending[slug]` when it is processed was cancelled by a close.
//! - Backend creates are ticketed the same way in `creating`; a close while
//!   the create is in flight keeps the record in the store but opens no tab.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;

use knive_proto::api::Backend;
use knive_proto::config::{ConsoleConfig, ReloadPolicy};
use knive_proto::error::BackendError;
use knive_proto::model::{Episode, ShowDraft, ShowRecord};
use knive_proto::pipeline::PipelineTreeBuilder;
use ratatui::crossterm::event::{Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::context::{ContextCreationError, EpisodeRequest, Selection, ShowContext};
use crate::event::{ConsoleEvent, UiAction};
use crate::shell::{FormHandle, FormKind, Severity, Shell};
use crate::store::{LoadOutcome, ShowStore};

const EVENT_QUEUE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Ready,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Uninitialized => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
        }
    }
}

/// What `ensure_context` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensure {
    Active,
    Pending,
    Scheduled(u64),
}

pub struct Orchestrator<B: Backend, S: Shell> {
    phase: Phase,
    store: ShowStore<B>,
    shell: S,
    builder: PipelineTreeBuilder,
    reload_policy: ReloadPolicy,
    contexts: HashMap<String, ShowContext>,
    /// Slug → ticket of the creation currently allowed to complete.
    pending: HashMap<String, u64>,
    /// Slug → ticket of the backend create in flight.
    creating: HashMap<String, u64>,
    /// Tickets of the initial load still to be processed.
    batch: HashSet<u64>,
    next_ticket: u64,
    deferred: VecDeque<ConsoleEvent>,
    create_form: Option<FormHandle>,
    settings_form: Option<FormHandle>,
    event_tx: mpsc::Sender<ConsoleEvent>,
    event_rx: mpsc::Receiver<ConsoleEvent>,
    should_quit: bool,
}

impl<B: Backend, S: Shell> Orchestrator<B, S> {
    pub fn new(backend: Arc<B>, shell: S, config: &ConsoleConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
        Self {
            phase: Phase::Uninitialized,
            store: ShowStore::new(backend),
            shell,
            builder: PipelineTreeBuilder::new().with_extra_qualities(config.extra_qualities.clone()),
            reload_policy: config.reload_policy,
            contexts: HashMap::new(),
            pending: HashMap::new(),
            creating: HashMap::new(),
            batch: HashSet::new(),
            next_ticket: 0,
            deferred: VecDeque::new(),
            create_form: None,
            settings_form: None,
            event_tx,
            event_rx,
            should_quit: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Sender for events produced outside the orchestrator (input, ticks).
    pub fn sender(&self) -> mpsc::Sender<ConsoleEvent> {
        self.event_tx.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &ShowStore<B> {
        &self.store
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn context(&self, slug: &str) -> Option<&ShowContext> {
        self.contexts.get(slug)
    }

    /// Active slugs, sorted.
    pub fn active(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    pub fn is_active(&self, slug: &str) -> bool {
        self.contexts.contains_key(slug)
    }

    pub fn is_pending(&self, slug: &str) -> bool {
        self.pending.contains_key(slug)
    }

    /// A backend create for `slug` has been submitted and not yet returned.
    pub fn is_creating(&self, slug: &str) -> bool {
        self.creating.contains_key(slug)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ── Loop plumbing ─────────────────────────────────────────────────────────

    /// Next event to handle: deferred work first, then the channel.
    pub async fn next_event(&mut self) -> Option<ConsoleEvent> {
        if let Some(ev) = self.deferred.pop_front() {
            return Some(ev);
        }
        self.event_rx.recv().await
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ConsoleEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let ev = task.await;
            if tx.send(ev).await.is_err() {
                debug!("orchestrator gone; dropping backend result");
            }
        });
    }

    fn spawn_load(&mut self) {
        let load = self.store.load();
        self.spawn(async move { ConsoleEvent::StoreLoaded(load.await) });
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Start the initial store load.  A second call does nothing.
    pub fn initialize(&mut self) {
        if self.phase != Phase::Uninitialized {
            debug!("initialize(): already {}", self.phase.label());
            return;
        }
        info!("orchestrator: loading shows");
        self.phase = Phase::Loading;
        self.spawn_load();
        self.update_status();
    }

    /// Dispose every context and stop the loop.
    pub fn shutdown(&mut self) {
        info!("orchestrator: shutting down ({} shows open)", self.contexts.len());
        for (_, mut ctx) in self.contexts.drain() {
            ctx.dispose(&mut self.shell);
        }
        self.pending.clear();
        self.creating.clear();
        self.batch.clear();
        self.deferred.clear();
        if let Some(form) = self.create_form.take() {
            self.shell.close_form(form);
        }
        if let Some(form) = self.settings_form.take() {
            self.shell.close_form(form);
        }
        self.should_quit = true;
    }

    fn mark_ready(&mut self) {
        if self.phase == Phase::Loading {
            info!("orchestrator: ready with {} shows", self.contexts.len());
            self.phase = Phase::Ready;
        }
    }

    fn update_status(&mut self) {
        let status = format!(
            "{} · {} show{} open",
            self.phase.label(),
            self.contexts.len(),
            if self.contexts.len() == 1 { "" } else { "s" }
        );
        self.shell.set_status(status);
    }

    // ── Contexts ──────────────────────────────────────────────────────────────

    /// Make sure a context for `record.slug` exists or is on its way.
    pub fn ensure_context(&mut self, record: ShowRecord) -> Ensure {
        if self.contexts.contains_key(&record.slug) {
            return Ensure::Active;
        }
        if self.pending.contains_key(&record.slug) {
            return Ensure::Pending;
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        debug!("ensure_context: '{}' scheduled as #{}", record.slug, ticket);
        self.pending.insert(record.slug.clone(), ticket);
        self.deferred
            .push_back(ConsoleEvent::Materialize { ticket, record });
        Ensure::Scheduled(ticket)
    }

    fn materialize(&mut self, ticket: u64, record: ShowRecord) {
        let slug = record.slug.clone();
        if self.pending.get(&slug) == Some(&ticket) {
            self.pending.remove(&slug);
            match self.create_context(record, ticket) {
                Ok(ctx) => {
                    info!("opened show '{}'", slug);
                    self.contexts.insert(slug, ctx);
                }
                Err(e) => {
                    error!("{}", e);
                    self.shell.notify(Severity::Error, e.to_string());
                }
            }
        } else {
            debug!("materialize: creation #{} for '{}' was cancelled", ticket, slug);
        }

        if self.batch.remove(&ticket) && self.batch.is_empty() {
            self.mark_ready();
        }
    }

    fn create_context(
        &mut self,
        record: ShowRecord,
        ticket: u64,
    ) -> Result<ShowContext, ContextCreationError> {
        let mut ctx = ShowContext::create(record, ticket, &self.builder)?;
        let tab = self
            .shell
            .request_tab(ctx.slug(), &ctx.record().name)
            .map_err(|source| ContextCreationError::Surface {
                slug: ctx.slug().to_string(),
                source,
            })?;
        ctx.render_into(tab, &mut self.shell);
        Ok(ctx)
    }

    fn close_show(&mut self, slug: &str) {
        let scheduled = self.pending.remove(slug).is_some();
        let cancelled = self.creating.remove(slug).is_some() || scheduled;
        match self.contexts.remove(slug) {
            Some(mut ctx) => {
                ctx.dispose(&mut self.shell);
                info!("closed show '{}'", slug);
            }
            None if cancelled => debug!("close: cancelled pending creation of '{}'", slug),
            None => debug!("close: '{}' is not open", slug),
        }
    }

    // ── Event handling ────────────────────────────────────────────────────────

    pub fn handle(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                for action in self.shell.handle_key(key) {
                    self.on_ui(action);
                }
            }
            ConsoleEvent::Input(_) => {}
            ConsoleEvent::Ui(action) => self.on_ui(action),
            ConsoleEvent::StoreLoaded(outcome) => self.on_store_loaded(outcome),
            ConsoleEvent::Materialize { ticket, record } => self.materialize(ticket, record),
            ConsoleEvent::ShowCreated {
                ticket,
                slug,
                result,
            } => self.on_show_created(ticket, slug, result),
            ConsoleEvent::EpisodesLoaded { request, result } => {
                self.on_episodes(request, result)
            }
            ConsoleEvent::SettingsLoaded { form, result } => match result {
                Ok(sections) if self.settings_form == Some(form) => {
                    debug!("settings: {} sections", sections.len());
                    self.shell.fill_settings(form, &sections);
                }
                Ok(_) => debug!("settings: form {:?} is gone", form),
                Err(e) => {
                    warn!("settings load failed: {}", e);
                    self.shell
                        .notify(Severity::Error, format!("Could not load settings: {}", e));
                    // Next open fetches again.
                    if self.settings_form == Some(form) {
                        self.settings_form = None;
                        self.shell.close_form(form);
                    }
                }
            },
            ConsoleEvent::SettingSaved { section, result } => match result {
                Ok(setting) => {
                    info!("settings: {}.{} = {}", section, setting.key, setting.value);
                    self.shell.notify(
                        Severity::Success,
                        format!("{}.{} = {}", section, setting.key, setting.value),
                    );
                }
                Err(e) => {
                    warn!("settings: saving in [{}] failed: {}", section, e);
                    self.shell
                        .notify(Severity::Error, format!("Could not save setting: {}", e));
                }
            },
            ConsoleEvent::Tick => self.shell.tick(),
        }
        self.update_status();
    }

    fn on_store_loaded(&mut self, outcome: LoadOutcome) {
        let records = match self.store.complete(outcome) {
            None => return,
            Some(Ok(records)) => records,
            Some(Err(e)) => {
                warn!("show list load failed: {}", e);
                self.shell
                    .notify(Severity::Error, format!("Could not load shows: {}", e));
                return;
            }
        };

        if self.phase == Phase::Ready && self.reload_policy == ReloadPolicy::Refresh {
            self.refresh_contexts(&records);
        }

        let tracking = self.phase == Phase::Loading;
        for record in records {
            if let Ensure::Scheduled(ticket) = self.ensure_context(record) {
                if tracking {
                    self.batch.insert(ticket);
                }
            }
        }
        if tracking && self.batch.is_empty() {
            self.mark_ready();
        }
    }

    /// Apply reloaded records to open contexts; close shows that vanished.
    fn refresh_contexts(&mut self, records: &[ShowRecord]) {
        let open: Vec<String> = self.contexts.keys().cloned().collect();
        for slug in open {
            match records.iter().find(|r| r.slug == slug) {
                Some(record) => {
                    if let Some(ctx) = self.contexts.get_mut(&slug) {
                        match ctx.refresh(record.clone(), &self.builder, &mut self.shell) {
                            Ok(true) => debug!("refreshed '{}'", slug),
                            Ok(false) => {}
                            Err(e) => {
                                warn!("refresh of '{}' failed: {}", slug, e);
                                self.shell
                                    .notify(Severity::Warning, format!("{}: {}", slug, e));
                            }
                        }
                    }
                }
                None => {
                    info!("show '{}' no longer exists on the backend", slug);
                    self.close_show(&slug);
                }
            }
        }
    }

    fn on_episodes(
        &mut self,
        request: EpisodeRequest,
        result: Result<Vec<Episode>, BackendError>,
    ) {
        let Some(ctx) = self.contexts.get_mut(&request.slug) else {
            debug!("episodes for closed show '{}' dropped", request.slug);
            return;
        };
        match result {
            Ok(episodes) => {
                if !ctx.show_episodes(&request, &episodes, &mut self.shell) {
                    debug!("stale episodes reply for '{}' dropped", request.slug);
                }
            }
            Err(e) => {
                warn!("episodes for '{}' failed: {}", request.slug, e);
                self.shell.notify(
                    Severity::Error,
                    format!("Episodes of {}: {}", ctx.record().name, e),
                );
            }
        }
    }

    fn fetch_episodes(&self, request: EpisodeRequest) {
        let backend = self.store.backend();
        self.spawn(async move {
            let result = backend.list_episodes(&request.slug).await;
            ConsoleEvent::EpisodesLoaded { request, result }
        });
    }

    pub fn on_ui(&mut self, action: UiAction) {
        debug!("on_ui: {:?}", action);
        match action {
            // ── Global ────────────────────────────────────────────────────────
            UiAction::CreateShow => {
                if let Some(old) = self.create_form.take() {
                    self.shell.close_form(old);
                }
                self.create_form = Some(self.shell.open_form(FormKind::CreateShow));
            }
            UiAction::SubmitCreateShow { name } => self.submit_create_show(&name),
            UiAction::OpenSettings => match self.settings_form {
                Some(form) => self.shell.reveal_form(form),
                None => {
                    let form = self.shell.open_form(FormKind::Settings);
                    self.settings_form = Some(form);
                    let backend = self.store.backend();
                    self.spawn(async move {
                        let result = backend.list_config().await;
                        ConsoleEvent::SettingsLoaded { form, result }
                    });
                }
            },
            UiAction::SubmitSetting {
                section,
                key,
                value,
            } => {
                let backend = self.store.backend();
                self.spawn(async move {
                    let result = backend.put_setting(&section, &key, &value).await;
                    ConsoleEvent::SettingSaved { section, result }
                });
            }
            UiAction::Reload => {
                if self.phase == Phase::Uninitialized {
                    self.initialize();
                } else {
                    info!("orchestrator: reloading shows");
                    self.spawn_load();
                }
            }
            UiAction::Quit => self.shutdown(),

            // ── Per show ──────────────────────────────────────────────────────
            UiAction::CloseShow(slug) => self.close_show(&slug),
            UiAction::Broadcast(slug) => match self.contexts.get_mut(&slug) {
                Some(ctx) => ctx.broadcast(&mut self.shell),
                None => debug!("broadcast: '{}' is not open", slug),
            },
            UiAction::Episodes(slug) => match self.contexts.get_mut(&slug) {
                Some(ctx) => {
                    let request = ctx.episodes(&mut self.shell);
                    self.fetch_episodes(request);
                }
                None => debug!("episodes: '{}' is not open", slug),
            },
            UiAction::NodeClicked { slug, path } => {
                let Some(ctx) = self.contexts.get_mut(&slug) else {
                    debug!("select: '{}' is not open", slug);
                    return;
                };
                match ctx.select(&path, &mut self.shell) {
                    Ok(Selection::Episodes(request)) => self.fetch_episodes(request),
                    Ok(_) => {}
                    Err(e) => self.shell.notify(Severity::Warning, e.to_string()),
                }
            }
            UiAction::AddOutlet { slug, kind } => {
                let Some(ctx) = self.contexts.get_mut(&slug) else {
                    debug!("add outlet: '{}' is not open", slug);
                    return;
                };
                match ctx.add_outlet(kind, &self.builder, &mut self.shell) {
                    Ok(()) => self
                        .shell
                        .notify(Severity::Info, format!("{}: added {}", slug, kind)),
                    Err(e) => self.shell.notify(Severity::Warning, e.to_string()),
                }
            }
            UiAction::RemoveOutlet { slug, name } => {
                let Some(ctx) = self.contexts.get_mut(&slug) else {
                    debug!("remove outlet: '{}' is not open", slug);
                    return;
                };
                match ctx.remove_outlet(&name, &mut self.shell) {
                    Ok(removed) => self
                        .shell
                        .notify(Severity::Info, format!("{}: removed {}", slug, removed.label)),
                    Err(e) => self.shell.notify(Severity::Warning, e.to_string()),
                }
            }
        }
    }

    fn submit_create_show(&mut self, name: &str) {
        let draft = match ShowDraft::from_name(name) {
            Ok(draft) => draft,
            Err(e) => {
                // Form stays open for correction.
                self.shell.notify(Severity::Warning, e.to_string());
                return;
            }
        };
        if let Some(form) = self.create_form.take() {
            self.shell.close_form(form);
        }
        if self.is_active(&draft.slug) || self.is_pending(&draft.slug) {
            self.shell
                .notify(Severity::Info, format!("Show '{}' is already open", draft.slug));
            return;
        }
        if self.is_creating(&draft.slug) {
            self.shell.notify(
                Severity::Info,
                format!("Show '{}' is already being created", draft.slug),
            );
            return;
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        info!("creating show '{}' as #{}", draft.slug, ticket);
        self.creating.insert(draft.slug.clone(), ticket);
        let backend = self.store.backend();
        self.spawn(async move {
            let result = backend.create_channel(&draft).await;
            ConsoleEvent::ShowCreated {
                ticket,
                slug: draft.slug,
                result,
            }
        });
    }

    fn on_show_created(
        &mut self,
        ticket: u64,
        slug: String,
        result: Result<ShowRecord, BackendError>,
    ) {
        let wanted = self.creating.get(&slug) == Some(&ticket);
        if wanted {
            self.creating.remove(&slug);
        }
        match result {
            Ok(record) => {
                info!("backend created show '{}'", record.slug);
                self.shell
                    .notify(Severity::Success, format!("Created show {}", record.name));
                self.store.upsert(record.clone());
                if wanted {
                    self.ensure_context(record);
                } else {
                    debug!("create #{}: '{}' was closed before it returned", ticket, slug);
                }
            }
            Err(e) => {
                warn!("create show '{}' failed: {}", slug, e);
                self.shell
                    .notify(Severity::Error, format!("Could not create show: {}", e));
            }
        }
    }
}
