//! ShowContext — the live state of one open show tab.
//!
//! A context owns its record copy, its pipeline tree and its tab.  Actions
//! reach it only through the orchestrator's slug lookup, and anything that
//! leaves the context (an episode fetch) carries the slug and generation it
//! was issued for, so a reply can never land in another show.

use knive_proto::error::TreeError;
use knive_proto::model::{Episode, ShowRecord};
use knive_proto::pipeline::{
    NodeKind, OutletKind, PipelineNode, PipelineTreeBuilder, LABEL_EPISODES, LABEL_OVERVIEW,
};
use thiserror::Error;
use tracing::debug;

use crate::shell::{Panel, Shell, ShellError, TabHandle, Table};

#[derive(Debug, Error)]
pub enum ContextCreationError {
    #[error("Could not open show '{slug}': {source}")]
    Tree {
        slug: String,
        #[source]
        source: TreeError,
    },
    #[error("Could not open show '{slug}': {source}")]
    Surface {
        slug: String,
        #[source]
        source: ShellError,
    },
}

/// Handler values bound to one show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowBindings {
    slug: String,
    generation: u64,
}

impl ShowBindings {
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn episodes(&self) -> EpisodeRequest {
        EpisodeRequest {
            slug: self.slug.clone(),
            generation: self.generation,
        }
    }

    /// True if `request` was issued by these bindings.
    pub fn issued(&self, request: &EpisodeRequest) -> bool {
        request.slug == self.slug && request.generation == self.generation
    }
}

/// An episode fetch in flight for one show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRequest {
    pub slug: String,
    pub generation: u64,
}

/// What a tree click resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A grouping node; nothing to open.
    Group,
    Panel,
    Episodes(EpisodeRequest),
}

pub struct ShowContext {
    record: ShowRecord,
    tree: PipelineNode,
    tab: Option<TabHandle>,
    bindings: ShowBindings,
    selection: Vec<String>,
    disposed: bool,
}

impl ShowContext {
    /// Build and validate the tree and bind actions to `record.slug`.
    pub fn create(
        record: ShowRecord,
        generation: u64,
        builder: &PipelineTreeBuilder,
    ) -> Result<Self, ContextCreationError> {
        let tree = builder.build(record.hint().as_ref());
        tree.validate()
            .map_err(|source| ContextCreationError::Tree {
                slug: record.slug.clone(),
                source,
            })?;
        let bindings = ShowBindings {
            slug: record.slug.clone(),
            generation,
        };
        Ok(Self {
            record,
            tree,
            tab: None,
            bindings,
            selection: vec![LABEL_OVERVIEW.to_string()],
            disposed: false,
        })
    }

    pub fn slug(&self) -> &str {
        self.bindings.slug()
    }

    pub fn record(&self) -> &ShowRecord {
        &self.record
    }

    pub fn tree(&self) -> &PipelineNode {
        &self.tree
    }

    pub fn tab(&self) -> Option<TabHandle> {
        self.tab
    }

    pub fn bindings(&self) -> &ShowBindings {
        &self.bindings
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Attach to a display surface and draw the tree and overview.
    pub fn render_into<S: Shell>(&mut self, tab: TabHandle, shell: &mut S) {
        self.tab = Some(tab);
        shell.render_tree(tab, &self.tree);
        shell.render_panel(tab, self.overview());
    }

    fn overview(&self) -> Panel {
        Panel::Overview {
            name: self.record.name.clone(),
            slug: self.record.slug.clone(),
            url: self.record.url.clone(),
            recording: self.record.recording,
            outlets: self
                .tree
                .outlet_kinds()
                .into_iter()
                .map(|k| k.label().to_string())
                .collect(),
        }
    }

    /// Show the broadcast overview for this show.
    pub fn broadcast<S: Shell>(&mut self, shell: &mut S) {
        self.selection = vec![LABEL_OVERVIEW.to_string()];
        if let Some(tab) = self.tab {
            shell.render_panel(tab, self.overview());
        }
    }

    /// Switch to the episodes panel; the caller performs the fetch.
    pub fn episodes<S: Shell>(&mut self, shell: &mut S) -> EpisodeRequest {
        self.selection = vec![LABEL_EPISODES.to_string()];
        if let Some(tab) = self.tab {
            shell.render_panel(tab, Panel::Loading(format!("episodes of {}", self.record.name)));
        }
        self.bindings.episodes()
    }

    /// Render fetched episodes.  Returns false for a reply this context did
    /// not ask for.
    pub fn show_episodes<S: Shell>(
        &mut self,
        request: &EpisodeRequest,
        episodes: &[Episode],
        shell: &mut S,
    ) -> bool {
        if !self.bindings.issued(request) {
            return false;
        }
        if let Some(tab) = self.tab {
            shell.render_table(tab, episode_table(&self.record.name, episodes));
        }
        true
    }

    /// Resolve a tree click.
    pub fn select<S: Shell>(
        &mut self,
        path: &[String],
        shell: &mut S,
    ) -> Result<Selection, TreeError> {
        let kind = self.tree.select(path)?.kind;
        if !kind.is_selectable() {
            return Ok(Selection::Group);
        }
        match kind {
            NodeKind::Overview => {
                self.broadcast(shell);
                Ok(Selection::Panel)
            }
            NodeKind::Episodes => Ok(Selection::Episodes(self.episodes(shell))),
            _ => {
                self.selection = path.to_vec();
                if let Some(tab) = self.tab {
                    shell.render_panel(
                        tab,
                        Panel::Node {
                            path: path.to_vec(),
                            kind,
                        },
                    );
                }
                Ok(Selection::Panel)
            }
        }
    }

    pub fn add_outlet<S: Shell>(
        &mut self,
        kind: OutletKind,
        builder: &PipelineTreeBuilder,
        shell: &mut S,
    ) -> Result<(), TreeError> {
        builder.add_outlet(&mut self.tree, kind)?;
        self.redraw_tree(shell);
        Ok(())
    }

    pub fn remove_outlet<S: Shell>(
        &mut self,
        name: &str,
        shell: &mut S,
    ) -> Result<PipelineNode, TreeError> {
        let removed = self.tree.remove_outlet(name)?;
        // A panel under the removed outlet no longer exists.
        if self.selection.get(1) == Some(&removed.label) {
            self.broadcast(shell);
        }
        self.redraw_tree(shell);
        Ok(removed)
    }

    /// Take an updated record from the backend.  The tree is rebuilt only
    /// when the configured outlets changed.  Returns whether anything changed.
    pub fn refresh<S: Shell>(
        &mut self,
        record: ShowRecord,
        builder: &PipelineTreeBuilder,
        shell: &mut S,
    ) -> Result<bool, TreeError> {
        if record == self.record {
            return Ok(false);
        }
        if record.outlets != self.record.outlets {
            let tree = builder.build(record.hint().as_ref());
            tree.validate()?;
            self.tree = tree;
        }
        self.record = record;
        if let Some(tab) = self.tab {
            shell.set_tab_title(tab, &self.record.name);
        }
        self.redraw_tree(shell);
        self.broadcast(shell);
        Ok(true)
    }

    fn redraw_tree<S: Shell>(&self, shell: &mut S) {
        if let Some(tab) = self.tab {
            shell.render_tree(tab, &self.tree);
        }
    }

    /// Close the tab and drop the tree.  Safe to call more than once.
    pub fn dispose<S: Shell>(&mut self, shell: &mut S) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(tab) = self.tab.take() {
            shell.close_tab(tab);
        }
        self.tree.children.clear();
        self.selection.clear();
        debug!("context '{}' disposed", self.slug());
    }
}

fn episode_table(show: &str, episodes: &[Episode]) -> Table {
    fn fmt(ts: Option<chrono::DateTime<chrono::Local>>) -> String {
        ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string())
    }

    Table {
        title: format!("Episodes · {}", show),
        columns: vec![
            "Name".to_string(),
            "Start Time".to_string(),
            "End Time".to_string(),
        ],
        rows: episodes
            .iter()
            .map(|e| vec![e.name.clone(), fmt(e.start_local()), fmt(e.end_local())])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, RecordingShell};

    fn open(slug: &str, generation: u64, shell: &mut RecordingShell) -> ShowContext {
        let mut ctx =
            ShowContext::create(record(generation as i64, slug), generation, &PipelineTreeBuilder::new())
                .unwrap();
        let tab = shell.request_tab(slug, slug).unwrap();
        ctx.render_into(tab, shell);
        ctx
    }

    #[test]
    fn test_create_renders_tree_and_overview() {
        let mut shell = RecordingShell::default();
        let ctx = open("alpha", 1, &mut shell);
        let tab = ctx.tab().unwrap();
        assert_eq!(shell.trees[&tab], *ctx.tree());
        assert!(matches!(shell.panels[&tab], Panel::Overview { ref slug, .. } if slug == "alpha"));
    }

    #[test]
    fn test_create_fails_on_malformed_tree() {
        let builder = PipelineTreeBuilder::new().with_extra_qualities(["EDGE"]);
        let err = ShowContext::create(record(1, "alpha"), 1, &builder)
            .err()
            .unwrap();
        assert!(matches!(err, ContextCreationError::Tree { ref slug, .. } if slug == "alpha"));
    }

    #[test]
    fn test_mutating_one_context_leaves_the_other_alone() {
        let mut shell = RecordingShell::default();
        let builder = PipelineTreeBuilder::new();

        let mut alpha_record = record(1, "alpha");
        alpha_record.outlets = vec!["FileWriter".to_string()];
        let mut alpha = ShowContext::create(alpha_record, 1, &builder).unwrap();
        let alpha_tab = shell.request_tab("alpha", "Alpha").unwrap();
        alpha.render_into(alpha_tab, &mut shell);
        let mut beta = open("beta", 2, &mut shell);
        let beta_tree = beta.tree().clone();
        let beta_tab = beta.tab().unwrap();

        alpha
            .add_outlet(OutletKind::IceCast2, &builder, &mut shell)
            .unwrap();
        alpha.broadcast(&mut shell);

        assert_eq!(
            alpha.tree().outlet_kinds(),
            vec![OutletKind::FileWriter, OutletKind::IceCast2]
        );
        assert_eq!(*beta.tree(), beta_tree);
        assert_eq!(shell.trees[&beta_tab], beta_tree);
        assert!(matches!(shell.panels[&beta_tab], Panel::Overview { ref slug, .. } if slug == "beta"));

        let request = beta.episodes(&mut shell);
        assert!(!alpha.show_episodes(&request, &[], &mut shell));
        assert!(!shell.tables.contains_key(&alpha_tab));
        assert!(beta.show_episodes(&request, &[], &mut shell));
        assert!(shell.tables.contains_key(&beta_tab));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut shell = RecordingShell::default();
        let mut old = open("alpha", 1, &mut shell);
        let stale = old.episodes(&mut shell);
        old.dispose(&mut shell);

        let mut fresh = open("alpha", 2, &mut shell);
        assert!(!fresh.show_episodes(&stale, &[], &mut shell));
    }

    #[test]
    fn test_select_resolves_panels_and_groups() {
        let mut shell = RecordingShell::default();
        let mut ctx = open("alpha", 1, &mut shell);
        let path = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(ctx.select(&path(&["Outlets"]), &mut shell), Ok(Selection::Group));
        assert_eq!(
            ctx.select(&path(&["Outlets", "HttpLiveStreamer", "Qualities", "EDGE"]), &mut shell),
            Ok(Selection::Panel)
        );
        assert_eq!(ctx.selection(), path(&["Outlets", "HttpLiveStreamer", "Qualities", "EDGE"]));
        assert!(matches!(
            ctx.select(&path(&["Episodes"]), &mut shell),
            Ok(Selection::Episodes(EpisodeRequest { ref slug, .. })) if slug == "alpha"
        ));
        assert!(matches!(
            ctx.select(&path(&["Outlets", "Nope"]), &mut shell),
            Err(TreeError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_remove_selected_outlet_falls_back_to_overview() {
        let mut shell = RecordingShell::default();
        let mut ctx = open("alpha", 1, &mut shell);
        let path: Vec<String> = vec!["Outlets".into(), "IceCast2".into()];
        ctx.select(&path, &mut shell).unwrap();

        ctx.remove_outlet("IceCast2", &mut shell).unwrap();
        assert_eq!(ctx.selection(), ["Overview".to_string()]);
        assert!(matches!(
            ctx.remove_outlet("IceCast2", &mut shell),
            Err(TreeError::NotFound(_))
        ));
    }

    #[test]
    fn test_refresh_rebuilds_only_on_outlet_change() {
        let mut shell = RecordingShell::default();
        let builder = PipelineTreeBuilder::new();
        let mut ctx = open("alpha", 1, &mut shell);
        ctx.remove_outlet("FileWriter", &mut shell).unwrap();

        let mut renamed = ctx.record().clone();
        renamed.name = "Alpha Live".to_string();
        assert_eq!(ctx.refresh(renamed.clone(), &builder, &mut shell), Ok(true));
        assert!(!ctx.tree().has_outlet(OutletKind::FileWriter));
        assert_eq!(shell.titles[&ctx.tab().unwrap()], "Alpha Live");
        assert_eq!(ctx.refresh(renamed.clone(), &builder, &mut shell), Ok(false));

        let mut rewired = renamed;
        rewired.outlets = vec!["httplive".to_string()];
        assert_eq!(ctx.refresh(rewired, &builder, &mut shell), Ok(true));
        assert_eq!(ctx.tree().outlet_kinds(), vec![OutletKind::HttpLiveStreamer]);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut shell = RecordingShell::default();
        let mut ctx = open("alpha", 1, &mut shell);
        let tab = ctx.tab().unwrap();
        ctx.dispose(&mut shell);
        ctx.dispose(&mut shell);
        assert!(ctx.is_disposed());
        assert!(ctx.tree().children.is_empty());
        assert_eq!(shell.closed, vec![tab]);
    }

    #[test]
    fn test_episode_table_columns() {
        let table = episode_table(
            "Alpha",
            &[Episode {
                name: "alpha-1".into(),
                starttime: Some(0.0),
                endtime: None,
            }],
        );
        assert_eq!(table.columns, vec!["Name", "Start Time", "End Time"]);
        assert_eq!(table.rows[0][0], "alpha-1");
        assert_eq!(table.rows[0][2], "—");
    }
}
