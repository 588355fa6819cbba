//! In-memory backend and recording shell shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use knive_proto::api::Backend;
use knive_proto::error::BackendError;
use knive_proto::model::{ConfigSection, Episode, Setting, ShowDraft, ShowRecord};
use knive_proto::pipeline::PipelineNode;

use crate::shell::{FormHandle, FormKind, Panel, Severity, Shell, ShellError, TabHandle, Table};

/// A record whose name is the capitalised slug.
pub fn record(id: i64, slug: &str) -> ShowRecord {
    let mut chars = slug.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    ShowRecord {
        id,
        name,
        slug: slug.to_string(),
        url: format!("http://{}.example", slug),
        recording: false,
        outlets: Vec::new(),
    }
}

#[derive(Default)]
struct MockState {
    shows: Vec<ShowRecord>,
    channel_error: Option<BackendError>,
    episodes: HashMap<String, Vec<Episode>>,
    create_error: Option<BackendError>,
    created: Vec<ShowDraft>,
    config: Vec<ConfigSection>,
    puts: Vec<(String, String, String)>,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    channel_calls: AtomicUsize,
    episode_calls: AtomicUsize,
    config_calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_shows(slugs: &[&str]) -> Self {
        let backend = Self::default();
        backend.set_shows(slugs);
        backend
    }

    pub fn set_shows(&self, slugs: &[&str]) {
        let shows = slugs
            .iter()
            .enumerate()
            .map(|(i, slug)| record(i as i64 + 1, slug))
            .collect();
        self.set_records(shows);
    }

    pub fn set_records(&self, shows: Vec<ShowRecord>) {
        let mut state = self.state.lock().unwrap();
        state.shows = shows;
        state.channel_error = None;
    }

    pub fn fail_channels(&self, err: BackendError) {
        self.state.lock().unwrap().channel_error = Some(err);
    }

    pub fn fail_create(&self, err: BackendError) {
        self.state.lock().unwrap().create_error = Some(err);
    }

    pub fn set_episodes(&self, slug: &str, episodes: Vec<Episode>) {
        self.state
            .lock()
            .unwrap()
            .episodes
            .insert(slug.to_string(), episodes);
    }

    pub fn set_config(&self, sections: Vec<ConfigSection>) {
        self.state.lock().unwrap().config = sections;
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.load(Ordering::SeqCst)
    }

    pub fn episode_calls(&self) -> usize {
        self.episode_calls.load(Ordering::SeqCst)
    }

    pub fn config_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<ShowDraft> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn puts(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().puts.clone()
    }
}

impl Backend for MockBackend {
    async fn list_channels(&self) -> Result<Vec<ShowRecord>, BackendError> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        match &state.channel_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.shows.clone()),
        }
    }

    async fn list_episodes(&self, slug: &str) -> Result<Vec<Episode>, BackendError> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        state
            .episodes
            .get(slug)
            .cloned()
            .ok_or_else(|| BackendError::Rejected {
                status: 404,
                message: "No Such Resource".to_string(),
            })
    }

    async fn create_channel(&self, draft: &ShowDraft) -> Result<ShowRecord, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.create_error {
            return Err(err.clone());
        }
        state.created.push(draft.clone());
        let record = ShowRecord {
            id: state.shows.len() as i64 + 100,
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            url: draft.url.clone(),
            recording: false,
            outlets: Vec::new(),
        };
        state.shows.push(record.clone());
        Ok(record)
    }

    async fn list_config(&self) -> Result<Vec<ConfigSection>, BackendError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().config.clone())
    }

    async fn put_setting(
        &self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<Setting, BackendError> {
        self.state.lock().unwrap().puts.push((
            section.to_string(),
            key.to_string(),
            value.to_string(),
        ));
        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// Shell that records every call.
#[derive(Default)]
pub struct RecordingShell {
    next_handle: u64,
    /// Slugs for which `request_tab` fails.
    pub refuse: HashSet<String>,
    /// Every successful tab request, in order.
    pub requested: Vec<(TabHandle, String)>,
    pub closed: Vec<TabHandle>,
    pub titles: HashMap<TabHandle, String>,
    pub trees: HashMap<TabHandle, PipelineNode>,
    pub tables: HashMap<TabHandle, Table>,
    pub panels: HashMap<TabHandle, Panel>,
    pub opened_forms: Vec<(FormHandle, FormKind)>,
    pub revealed_forms: Vec<FormHandle>,
    pub closed_forms: Vec<FormHandle>,
    pub filled: Vec<(FormHandle, Vec<ConfigSection>)>,
    pub notices: Vec<(Severity, String)>,
    pub status: String,
}

impl RecordingShell {
    pub fn refusing(slugs: &[&str]) -> Self {
        Self {
            refuse: slugs.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Tab most recently opened for `slug` that is still open.
    pub fn tab_for(&self, slug: &str) -> Option<TabHandle> {
        self.requested
            .iter()
            .rev()
            .find(|(tab, s)| s == slug && !self.closed.contains(tab))
            .map(|(tab, _)| *tab)
    }

    pub fn notices_of(&self, severity: Severity) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl Shell for RecordingShell {
    fn request_tab(&mut self, slug: &str, title: &str) -> Result<TabHandle, ShellError> {
        if self.refuse.contains(slug) {
            return Err(ShellError::Unavailable(format!("refused {}", slug)));
        }
        let tab = TabHandle(self.handle());
        self.requested.push((tab, slug.to_string()));
        self.titles.insert(tab, title.to_string());
        Ok(tab)
    }

    fn close_tab(&mut self, tab: TabHandle) {
        self.closed.push(tab);
    }

    fn set_tab_title(&mut self, tab: TabHandle, title: &str) {
        self.titles.insert(tab, title.to_string());
    }

    fn render_tree(&mut self, tab: TabHandle, tree: &PipelineNode) {
        self.trees.insert(tab, tree.clone());
    }

    fn render_table(&mut self, tab: TabHandle, table: Table) {
        self.tables.insert(tab, table);
    }

    fn render_panel(&mut self, tab: TabHandle, panel: Panel) {
        self.panels.insert(tab, panel);
    }

    fn open_form(&mut self, kind: FormKind) -> FormHandle {
        let form = FormHandle(self.handle());
        self.opened_forms.push((form, kind));
        form
    }

    fn reveal_form(&mut self, form: FormHandle) {
        self.revealed_forms.push(form);
    }

    fn close_form(&mut self, form: FormHandle) {
        self.closed_forms.push(form);
    }

    fn fill_settings(&mut self, form: FormHandle, sections: &[ConfigSection]) {
        self.filled.push((form, sections.to_vec()));
    }

    fn notify(&mut self, severity: Severity, message: String) {
        self.notices.push((severity, message));
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
    }
}
