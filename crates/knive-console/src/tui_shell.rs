//! TuiShell — the terminal `Shell`: one tab per show, a tree pane on the
//! left, a content pane on the right, modal forms and toasts on top.

use knive_proto::model::ConfigSection;
use knive_proto::pipeline::{NodeKind, OutletKind, PipelineNode, LABEL_OUTLETS};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Tabs, Wrap},
    Frame,
};
use tracing::debug;

use crate::event::UiAction;
use crate::shell::{FormHandle, FormKind, Panel, Severity, Shell, ShellError, TabHandle, Table};
use crate::theme::{
    style_accent, style_default, style_focused_border, style_muted, style_secondary,
    style_selected, style_unfocused_border, C_ON_AIR, C_PRIMARY,
};
use crate::widgets::{
    form_input::{FieldAction, FormInput},
    status_bar::{self, InputMode},
    toast::ToastManager,
    tree_view::{self, TreeRow},
};

enum Content {
    Empty,
    Panel(Panel),
    Table(Table),
}

struct ShowTab {
    handle: TabHandle,
    slug: String,
    title: String,
    rows: Vec<TreeRow>,
    cursor: usize,
    content: Content,
}

impl ShowTab {
    fn selected(&self) -> Option<&TreeRow> {
        self.rows.get(self.cursor)
    }

    /// The outlet under the cursor, if the cursor is on or inside one.
    fn selected_outlet(&self) -> Option<&str> {
        let path = &self.selected()?.path;
        match path.as_slice() {
            [group, outlet, ..] if group == LABEL_OUTLETS => Some(outlet.as_str()),
            _ => None,
        }
    }
}

struct CreateForm {
    handle: FormHandle,
    field: FormInput,
}

struct SettingRow {
    section: String,
    key: String,
    value: String,
}

struct SettingsForm {
    handle: FormHandle,
    visible: bool,
    loaded: bool,
    rows: Vec<SettingRow>,
    cursor: usize,
    editing: Option<FormInput>,
}

pub struct TuiShell {
    tabs: Vec<ShowTab>,
    active: usize,
    max_tabs: usize,
    next_handle: u64,
    status: String,
    toasts: ToastManager,
    create_form: Option<CreateForm>,
    settings: Option<SettingsForm>,
}

impl TuiShell {
    pub fn new(max_tabs: usize) -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
            max_tabs,
            next_handle: 0,
            status: String::new(),
            toasts: ToastManager::new(),
            create_form: None,
            settings: None,
        }
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn tab_mut(&mut self, handle: TabHandle) -> Option<&mut ShowTab> {
        self.tabs.iter_mut().find(|t| t.handle == handle)
    }

    fn current(&self) -> Option<&ShowTab> {
        self.tabs.get(self.active)
    }

    pub fn mode(&self) -> InputMode {
        if self.create_form.is_some() {
            return InputMode::CreateShow;
        }
        match &self.settings {
            Some(s) if s.visible && s.editing.is_some() => InputMode::Editing,
            Some(s) if s.visible => InputMode::Settings,
            _ => InputMode::Normal,
        }
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    fn create_form_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        let Some(form) = self.create_form.as_mut() else {
            return Vec::new();
        };
        match form.field.handle_key(key) {
            FieldAction::Submitted(name) => vec![UiAction::SubmitCreateShow { name }],
            FieldAction::Cancelled => {
                self.create_form = None;
                Vec::new()
            }
            FieldAction::Edited => Vec::new(),
        }
    }

    fn settings_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        let Some(form) = self.settings.as_mut() else {
            return Vec::new();
        };
        if let Some(field) = form.editing.as_mut() {
            return match field.handle_key(key) {
                FieldAction::Submitted(value) => {
                    form.editing = None;
                    match form.rows.get_mut(form.cursor) {
                        Some(row) => {
                            row.value = value.clone();
                            vec![UiAction::SubmitSetting {
                                section: row.section.clone(),
                                key: row.key.clone(),
                                value,
                            }]
                        }
                        None => Vec::new(),
                    }
                }
                FieldAction::Cancelled => {
                    form.editing = None;
                    Vec::new()
                }
                FieldAction::Edited => Vec::new(),
            };
        }
        match key.code {
            KeyCode::Esc => form.visible = false,
            KeyCode::Up | KeyCode::Char('k') => form.cursor = form.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if form.cursor + 1 < form.rows.len() {
                    form.cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(row) = form.rows.get(form.cursor) {
                    form.editing = Some(FormInput::with_value("value", &row.value));
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn normal_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        match key.code {
            KeyCode::Char('q') => return vec![UiAction::Quit],
            KeyCode::Char('n') => return vec![UiAction::CreateShow],
            KeyCode::Char('s') => return vec![UiAction::OpenSettings],
            KeyCode::Char('r') => return vec![UiAction::Reload],
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                if !self.tabs.is_empty() {
                    self.active = (self.active + 1) % self.tabs.len();
                }
                return Vec::new();
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                if !self.tabs.is_empty() {
                    self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
                }
                return Vec::new();
            }
            _ => {}
        }

        let Some(tab) = self.tabs.get_mut(self.active) else {
            return Vec::new();
        };
        let slug = tab.slug.clone();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                tab.cursor = tab.cursor.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if tab.cursor + 1 < tab.rows.len() {
                    tab.cursor += 1;
                }
                Vec::new()
            }
            KeyCode::Enter => match tab.selected() {
                Some(row) => vec![UiAction::NodeClicked {
                    slug,
                    path: row.path.clone(),
                }],
                None => Vec::new(),
            },
            KeyCode::Char('b') => vec![UiAction::Broadcast(slug)],
            KeyCode::Char('e') => vec![UiAction::Episodes(slug)],
            KeyCode::Char('x') => vec![UiAction::CloseShow(slug)],
            KeyCode::Char(c @ '1'..='3') => {
                let kind = OutletKind::ALL[(c as u8 - b'1') as usize];
                vec![UiAction::AddOutlet { slug, kind }]
            }
            KeyCode::Char('d') => match tab.selected_outlet() {
                Some(name) => vec![UiAction::RemoveOutlet {
                    slug,
                    name: name.to_string(),
                }],
                None => {
                    self.toasts
                        .notify(Severity::Info, "Select an outlet to remove it");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        status_bar::draw_separator(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        status_bar::draw_status_bar(frame, chunks[3], &self.status);
        status_bar::draw_keys_bar(frame, chunks[4], self.mode());

        if let Some(form) = &self.create_form {
            draw_create_form(frame, chunks[2], form);
        } else if let Some(form) = self.settings.as_ref().filter(|s| s.visible) {
            draw_settings_form(frame, chunks[2], form);
        }
        self.toasts.draw(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        if self.tabs.is_empty() {
            frame.render_widget(Paragraph::new(Span::styled(" knive", style_accent())), area);
            return;
        }
        let titles: Vec<Line> = self
            .tabs
            .iter()
            .map(|t| Line::from(tree_view::truncate(&t.title, 24)))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.active)
            .style(style_secondary())
            .highlight_style(Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD))
            .divider(Span::styled("│", style_muted()));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut Frame, area: Rect) {
        let Some(tab) = self.current() else {
            let hint = Paragraph::new(Line::from(Span::styled(
                "No shows open.  n creates one, r reloads the list.",
                style_muted(),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(hint, area);
            return;
        };

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let focused = self.mode() == InputMode::Normal;
        let tree_block = Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                style_focused_border()
            } else {
                style_unfocused_border()
            })
            .title(Span::styled(format!(" {} ", tab.title), style_default()));
        tree_view::draw_tree(frame, cols[0], tree_block, &tab.rows, tab.cursor);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_unfocused_border());
        match &tab.content {
            Content::Empty => frame.render_widget(block, cols[1]),
            Content::Panel(panel) => {
                let block = block.title(Span::styled(format!(" {} ", panel), style_default()));
                let paragraph = Paragraph::new(panel_lines(panel))
                    .block(block)
                    .wrap(Wrap { trim: false });
                frame.render_widget(paragraph, cols[1]);
            }
            Content::Table(table) => draw_table(frame, cols[1], block, table),
        }
    }
}

fn field_line<'a>(key: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<11}", key), style_secondary()),
        Span::styled(value, style_default()),
    ])
}

fn panel_lines(panel: &Panel) -> Vec<Line<'_>> {
    match panel {
        Panel::Overview {
            name,
            slug,
            url,
            recording,
            outlets,
        } => vec![
            field_line("Show", name.clone()),
            field_line("Slug", slug.clone()),
            field_line("URL", url.clone()),
            Line::from(vec![
                Span::styled(format!(" {:<11}", "Recording"), style_secondary()),
                if *recording {
                    Span::styled("● on air", Style::default().fg(C_ON_AIR))
                } else {
                    Span::styled("○ idle", style_muted())
                },
            ]),
            field_line("Outlets", outlets.join(", ")),
        ],
        Panel::Node { path, kind } => vec![
            field_line("Node", path.join(" › ")),
            field_line("Kind", describe(*kind).to_string()),
        ],
        Panel::Loading(what) => vec![Line::from(Span::styled(
            format!(" loading {}…", what),
            style_muted(),
        ))],
    }
}

fn describe(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "show",
        NodeKind::Overview => "broadcast overview",
        NodeKind::Settings => "settings",
        NodeKind::Inlet => "inlet (source stream)",
        NodeKind::OutletsGroup => "outlets",
        NodeKind::Outlet(OutletKind::FileWriter) => "outlet: file writer",
        NodeKind::Outlet(OutletKind::HttpLiveStreamer) => "outlet: HTTP live streaming",
        NodeKind::Outlet(OutletKind::IceCast2) => "outlet: Icecast 2",
        NodeKind::QualitiesGroup => "encoding qualities",
        NodeKind::Quality => "encoding quality",
        NodeKind::Statistics => "statistics",
        NodeKind::Episodes => "episodes",
    }
}

fn draw_table(frame: &mut Frame, area: Rect, block: Block<'_>, table: &Table) {
    let block = block.title(Span::styled(format!(" {} ", table.title), style_default()));
    if table.rows.is_empty() {
        let empty = Paragraph::new(Span::styled(" nothing here yet", style_muted())).block(block);
        frame.render_widget(empty, area);
        return;
    }
    let header = Row::new(
        table
            .columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(style_secondary().add_modifier(Modifier::BOLD))),
    );
    let rows = table
        .rows
        .iter()
        .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))).style(style_default()));
    let columns = table.columns.len().max(1) as u32;
    let widths = vec![Constraint::Ratio(1, columns); columns as usize];
    let widget = ratatui::widgets::Table::new(rows, widths)
        .header(header)
        .block(block);
    frame.render_widget(widget, area);
}

fn draw_create_form(frame: &mut Frame, area: Rect, form: &CreateForm) {
    let popup = centered_rect(60, 5, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_focused_border())
        .title(Span::styled(" New show ", style_default()));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(Span::styled(" Name of the new show:", style_secondary())),
        rows[0],
    );
    form.field.draw(frame, rows[1], true);
}

fn draw_settings_form(frame: &mut Frame, area: Rect, form: &SettingsForm) {
    let height = (form.rows.len() as u16 + 4).clamp(6, area.height.max(6));
    let popup = centered_rect(70, height, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_focused_border())
        .title(Span::styled(" Settings ", style_default()));

    if !form.loaded {
        let loading = Paragraph::new(Span::styled(" loading configuration…", style_muted()))
            .block(block);
        frame.render_widget(loading, popup);
        return;
    }

    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let items: Vec<ListItem> = form
        .rows
        .iter()
        .map(|r| {
            ListItem::new(Line::from(vec![
                Span::styled(format!(" [{}] ", r.section), style_muted()),
                Span::styled(r.key.as_str(), style_secondary()),
                Span::raw(" = "),
                Span::styled(r.value.as_str(), style_default()),
            ]))
        })
        .collect();
    let mut state = ListState::default();
    if !form.rows.is_empty() {
        state.select(Some(form.cursor));
    }
    frame.render_stateful_widget(
        List::new(items).highlight_style(style_selected()),
        rows[0],
        &mut state,
    );
    if let Some(field) = &form.editing {
        field.draw(frame, rows[1], true);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

impl Shell for TuiShell {
    fn request_tab(&mut self, slug: &str, title: &str) -> Result<TabHandle, ShellError> {
        if self.tabs.len() >= self.max_tabs {
            return Err(ShellError::TabLimit(self.max_tabs));
        }
        let handle = TabHandle(self.next_handle());
        self.tabs.push(ShowTab {
            handle,
            slug: slug.to_string(),
            title: title.to_string(),
            rows: Vec::new(),
            cursor: 0,
            content: Content::Empty,
        });
        Ok(handle)
    }

    fn close_tab(&mut self, tab: TabHandle) {
        self.tabs.retain(|t| t.handle != tab);
        if self.active >= self.tabs.len() {
            self.active = self.tabs.len().saturating_sub(1);
        }
    }

    fn set_tab_title(&mut self, tab: TabHandle, title: &str) {
        if let Some(t) = self.tab_mut(tab) {
            t.title = title.to_string();
        }
    }

    fn render_tree(&mut self, tab: TabHandle, tree: &PipelineNode) {
        if let Some(t) = self.tab_mut(tab) {
            t.rows = tree_view::flatten(tree);
            t.cursor = t.cursor.min(t.rows.len().saturating_sub(1));
        }
    }

    fn render_table(&mut self, tab: TabHandle, table: Table) {
        if let Some(t) = self.tab_mut(tab) {
            t.content = Content::Table(table);
        }
    }

    fn render_panel(&mut self, tab: TabHandle, panel: Panel) {
        if let Some(t) = self.tab_mut(tab) {
            t.content = Content::Panel(panel);
        }
    }

    fn open_form(&mut self, kind: FormKind) -> FormHandle {
        let handle = FormHandle(self.next_handle());
        match kind {
            FormKind::CreateShow => {
                self.create_form = Some(CreateForm {
                    handle,
                    field: FormInput::new("show name"),
                });
            }
            FormKind::Settings => {
                self.settings = Some(SettingsForm {
                    handle,
                    visible: true,
                    loaded: false,
                    rows: Vec::new(),
                    cursor: 0,
                    editing: None,
                });
            }
        }
        handle
    }

    fn reveal_form(&mut self, form: FormHandle) {
        match self.settings.as_mut() {
            Some(s) if s.handle == form => s.visible = true,
            _ => debug!("reveal: unknown form {:?}", form),
        }
    }

    fn close_form(&mut self, form: FormHandle) {
        if self.create_form.as_ref().map(|f| f.handle) == Some(form) {
            self.create_form = None;
        }
        if self.settings.as_ref().map(|f| f.handle) == Some(form) {
            self.settings = None;
        }
    }

    fn fill_settings(&mut self, form: FormHandle, sections: &[ConfigSection]) {
        let Some(s) = self.settings.as_mut().filter(|s| s.handle == form) else {
            return;
        };
        s.rows = sections
            .iter()
            .flat_map(|section| {
                section.settings.iter().map(|setting| SettingRow {
                    section: section.section_name.clone(),
                    key: setting.key.clone(),
                    value: setting.value.clone(),
                })
            })
            .collect();
        s.cursor = 0;
        s.loaded = true;
    }

    fn notify(&mut self, severity: Severity, message: String) {
        self.toasts.notify(severity, message);
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<UiAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![UiAction::Quit];
        }
        match self.mode() {
            InputMode::CreateShow => self.create_form_key(key),
            InputMode::Settings | InputMode::Editing => self.settings_key(key),
            InputMode::Normal => self.normal_key(key),
        }
    }

    fn tick(&mut self) {
        self.toasts.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knive_proto::model::Setting;
    use knive_proto::pipeline::PipelineTreeBuilder;
    use ratatui::{backend::TestBackend, Terminal};

    fn press(shell: &mut TuiShell, code: KeyCode) -> Vec<UiAction> {
        shell.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(shell: &mut TuiShell, text: &str) {
        for c in text.chars() {
            press(shell, KeyCode::Char(c));
        }
    }

    fn with_show(slug: &str) -> (TuiShell, TabHandle) {
        let mut shell = TuiShell::new(4);
        let tab = shell.request_tab(slug, "Alpha").unwrap();
        shell.render_tree(tab, &PipelineTreeBuilder::new().build(None));
        (shell, tab)
    }

    #[test]
    fn test_tree_navigation_emits_node_paths() {
        let (mut shell, _) = with_show("alpha");
        press(&mut shell, KeyCode::Down);
        assert_eq!(
            press(&mut shell, KeyCode::Enter),
            vec![UiAction::NodeClicked {
                slug: "alpha".into(),
                path: vec!["Settings".to_string()],
            }]
        );
        assert_eq!(
            press(&mut shell, KeyCode::Char('3')),
            vec![UiAction::AddOutlet {
                slug: "alpha".into(),
                kind: OutletKind::IceCast2,
            }]
        );
    }

    #[test]
    fn test_remove_needs_an_outlet_under_the_cursor() {
        let (mut shell, _) = with_show("alpha");
        assert!(press(&mut shell, KeyCode::Char('d')).is_empty());

        // Overview, Settings, Inlet, Outlets, FileWriter, HttpLiveStreamer, Settings
        for _ in 0..6 {
            press(&mut shell, KeyCode::Down);
        }
        assert_eq!(
            press(&mut shell, KeyCode::Char('d')),
            vec![UiAction::RemoveOutlet {
                slug: "alpha".into(),
                name: "HttpLiveStreamer".into(),
            }]
        );
    }

    #[test]
    fn test_tab_limit_and_switching() {
        let mut shell = TuiShell::new(2);
        let a = shell.request_tab("alpha", "Alpha").unwrap();
        shell.request_tab("beta", "Beta").unwrap();
        assert_eq!(
            shell.request_tab("gamma", "Gamma"),
            Err(ShellError::TabLimit(2))
        );

        press(&mut shell, KeyCode::Tab);
        assert_eq!(press(&mut shell, KeyCode::Char('x')), vec![UiAction::CloseShow("beta".into())]);
        press(&mut shell, KeyCode::Tab);
        assert_eq!(press(&mut shell, KeyCode::Char('b')), vec![UiAction::Broadcast("alpha".into())]);

        shell.close_tab(a);
        assert!(press(&mut shell, KeyCode::Char('e')) == vec![UiAction::Episodes("beta".into())]);
    }

    #[test]
    fn test_create_form_captures_keys() {
        let mut shell = TuiShell::new(4);
        assert_eq!(press(&mut shell, KeyCode::Char('n')), vec![UiAction::CreateShow]);
        shell.open_form(FormKind::CreateShow);

        type_text(&mut shell, "quiet");
        assert_eq!(
            press(&mut shell, KeyCode::Enter),
            vec![UiAction::SubmitCreateShow {
                name: "quiet".into()
            }]
        );
        press(&mut shell, KeyCode::Esc);
        assert_eq!(shell.mode(), InputMode::Normal);
        assert_eq!(press(&mut shell, KeyCode::Char('q')), vec![UiAction::Quit]);
    }

    #[test]
    fn test_settings_edit_submits_one_setting() {
        let mut shell = TuiShell::new(4);
        let form = shell.open_form(FormKind::Settings);
        shell.fill_settings(
            form,
            &[ConfigSection {
                section_name: "httplive".into(),
                settings: vec![
                    Setting {
                        key: "segmenter".into(),
                        value: "live_segmenter".into(),
                    },
                    Setting {
                        key: "duration".into(),
                        value: "10".into(),
                    },
                ],
            }],
        );

        press(&mut shell, KeyCode::Down);
        press(&mut shell, KeyCode::Enter);
        assert_eq!(shell.mode(), InputMode::Editing);
        press(&mut shell, KeyCode::Backspace);
        press(&mut shell, KeyCode::Backspace);
        type_text(&mut shell, "8");
        assert_eq!(
            press(&mut shell, KeyCode::Enter),
            vec![UiAction::SubmitSetting {
                section: "httplive".into(),
                key: "duration".into(),
                value: "8".into(),
            }]
        );

        press(&mut shell, KeyCode::Esc);
        assert_eq!(shell.mode(), InputMode::Normal);
        shell.reveal_form(form);
        assert_eq!(shell.mode(), InputMode::Settings);
    }

    #[test]
    fn test_draw_create_form_uses_input_style() {
        let mut shell = TuiShell::new(4);
        shell.open_form(FormKind::CreateShow);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal.draw(|f| shell.draw(f)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("New show"));
        assert!(screen.contains("show name"));

        type_text(&mut shell, "quiet");
        terminal.draw(|f| shell.draw(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("› quiet"));
        let prompt = buffer
            .content()
            .iter()
            .find(|c| c.symbol() == "›")
            .map(|c| (c.fg, c.bg));
        assert_eq!(prompt, Some((crate::theme::C_INPUT_FG, crate::theme::C_INPUT_BG)));
    }

    #[test]
    fn test_draw_shows_tabs_and_panel() {
        let (mut shell, tab) = with_show("alpha");
        shell.render_panel(
            tab,
            Panel::Overview {
                name: "Alpha".into(),
                slug: "alpha".into(),
                url: "http://alpha.example".into(),
                recording: true,
                outlets: vec!["FileWriter".into()],
            },
        );
        shell.notify(Severity::Error, "backend down".into());
        shell.set_status("ready · 1 show open".into());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| shell.draw(f)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Alpha"));
        assert!(screen.contains("http://alpha.example"));
        assert!(screen.contains("backend down"));
        assert!(screen.contains("ready"));
    }
}
