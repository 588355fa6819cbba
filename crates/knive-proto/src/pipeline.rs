//! Pipeline tree — the per-show navigation/configuration structure.
//!
//! ```text
//!  (root)
//!  ├─ Overview
//!  ├─ Settings
//!  ├─ Inlet
//!  ├─ Outlets
//!  │   ├─ FileWriter
//!  │   ├─ HttpLiveStreamer
//!  │   │   ├─ Settings
//!  │   │   └─ Qualities
//!  │   │       ├─ WiFi
//!  │   │       ├─ HSDPA
//!  │   │       ├─ EDGE
//!  │   │       └─ Audio 64kbps
//!  │   └─ IceCast2
//!  ├─ Statistics
//!  └─ Episodes
//! ```
//!
//! The top-level order is relied on by the console for stable navigation.
//! Node shapes are a closed `NodeKind` enum; whether a node is a leaf follows
//! from its kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TreeError;

pub const LABEL_OVERVIEW: &str = "Overview";
pub const LABEL_SETTINGS: &str = "Settings";
pub const LABEL_INLET: &str = "Inlet";
pub const LABEL_OUTLETS: &str = "Outlets";
pub const LABEL_QUALITIES: &str = "Qualities";
pub const LABEL_STATISTICS: &str = "Statistics";
pub const LABEL_EPISODES: &str = "Episodes";

/// Built-in encoding profiles offered under the HTTP live streaming outlet.
pub const BASE_QUALITIES: [&str; 4] = ["WiFi", "HSDPA", "EDGE", "Audio 64kbps"];

/// The closed set of outlet kinds a show can stream to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutletKind {
    FileWriter,
    HttpLiveStreamer,
    IceCast2,
}

impl OutletKind {
    /// Canonical order under the Outlets group.
    pub const ALL: [OutletKind; 3] = [Self::FileWriter, Self::HttpLiveStreamer, Self::IceCast2];

    pub fn label(self) -> &'static str {
        match self {
            Self::FileWriter => "FileWriter",
            Self::HttpLiveStreamer => "HttpLiveStreamer",
            Self::IceCast2 => "IceCast2",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::FileWriter => "filewriter",
            Self::HttpLiveStreamer => "httplive",
            Self::IceCast2 => "icecast2",
        }
    }

    /// Only the HTTP live streamer encodes into multiple qualities.
    pub fn owns_qualities(self) -> bool {
        match self {
            Self::HttpLiveStreamer => true,
            Self::FileWriter | Self::IceCast2 => false,
        }
    }

    fn matches_name(self, name: &str) -> bool {
        let squashed: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        squashed == self.label().to_ascii_lowercase() || squashed == self.slug()
    }
}

impl fmt::Display for OutletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutletKind {
    type Err = TreeError;

    /// Accepts labels and slugs, ignoring case, spaces, `-` and `_`
    /// ("HTTP Live Streamer", "httplive", "icecast2" all parse).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.matches_name(s))
            .ok_or_else(|| TreeError::UnknownOutletKind(s.to_string()))
    }
}

/// Shape of a pipeline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Overview,
    Settings,
    Inlet,
    OutletsGroup,
    Outlet(OutletKind),
    QualitiesGroup,
    Quality,
    Statistics,
    Episodes,
}

impl NodeKind {
    pub fn is_leaf(self) -> bool {
        match self {
            Self::Root | Self::OutletsGroup | Self::QualitiesGroup => false,
            Self::Outlet(kind) => !kind.owns_qualities(),
            Self::Overview
            | Self::Settings
            | Self::Inlet
            | Self::Quality
            | Self::Statistics
            | Self::Episodes => true,
        }
    }

    /// Groups exist for navigation only and never open a content panel.
    pub fn is_selectable(self) -> bool {
        !matches!(self, Self::Root | Self::OutletsGroup | Self::QualitiesGroup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineNode {
    pub label: String,
    pub kind: NodeKind,
    pub children: Vec<PipelineNode>,
}

impl PipelineNode {
    pub fn leaf(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(label: impl Into<String>, kind: NodeKind, children: Vec<PipelineNode>) -> Self {
        Self {
            label: label.into(),
            kind,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    pub fn child(&self, label: &str) -> Option<&PipelineNode> {
        self.children.iter().find(|c| c.label == label)
    }

    pub fn child_labels(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.label.as_str()).collect()
    }

    /// Resolve a label path from this node.
    pub fn select<S: AsRef<str>>(&self, path: &[S]) -> Result<&PipelineNode, TreeError> {
        let mut node = self;
        for segment in path {
            let segment = segment.as_ref();
            node = node.child(segment).ok_or_else(|| TreeError::InvalidPath {
                path: join_path(path),
                segment: segment.to_string(),
            })?;
        }
        Ok(node)
    }

    pub fn outlets(&self) -> Option<&PipelineNode> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::OutletsGroup)
    }

    fn outlets_mut(&mut self) -> Result<&mut PipelineNode, TreeError> {
        self.children
            .iter_mut()
            .find(|c| c.kind == NodeKind::OutletsGroup)
            .ok_or_else(|| TreeError::Malformed("no Outlets group".to_string()))
    }

    /// Outlet kinds currently present, in tree order.
    pub fn outlet_kinds(&self) -> Vec<OutletKind> {
        self.outlets()
            .map(|group| {
                group
                    .children
                    .iter()
                    .filter_map(|c| match c.kind {
                        NodeKind::Outlet(kind) => Some(kind),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_outlet(&self, kind: OutletKind) -> bool {
        self.outlet_kinds().contains(&kind)
    }

    /// Remove an outlet by label or slug.
    pub fn remove_outlet(&mut self, name: &str) -> Result<PipelineNode, TreeError> {
        let kind: OutletKind = name
            .parse()
            .map_err(|_| TreeError::NotFound(name.to_string()))?;
        let group = self.outlets_mut()?;
        let pos = group
            .children
            .iter()
            .position(|c| c.kind == NodeKind::Outlet(kind))
            .ok_or_else(|| TreeError::NotFound(name.to_string()))?;
        Ok(group.children.remove(pos))
    }

    /// Depth-first walk yielding `(path, node)` for every descendant.
    pub fn walk(&self) -> Vec<(Vec<String>, &PipelineNode)> {
        let mut out = Vec::new();
        walk_into(self, &mut Vec::new(), &mut out);
        out
    }

    /// Check every structural invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.kind != NodeKind::Root {
            return Err(TreeError::Malformed(format!(
                "root has kind {:?}",
                self.kind
            )));
        }
        if self.outlets().is_none() {
            return Err(TreeError::Malformed("no Outlets group".to_string()));
        }
        validate_node(self, None)
    }
}

fn walk_into<'a>(
    node: &'a PipelineNode,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, &'a PipelineNode)>,
) {
    for child in &node.children {
        prefix.push(child.label.clone());
        out.push((prefix.clone(), child));
        walk_into(child, prefix, out);
        prefix.pop();
    }
}

fn validate_node(node: &PipelineNode, parent: Option<NodeKind>) -> Result<(), TreeError> {
    if node.is_leaf() && !node.children.is_empty() {
        return Err(TreeError::Malformed(format!(
            "leaf '{}' has children",
            node.label
        )));
    }
    match node.kind {
        NodeKind::QualitiesGroup => match parent {
            Some(NodeKind::Outlet(kind)) if kind.owns_qualities() => {}
            _ => {
                return Err(TreeError::Malformed(format!(
                    "'{}' is not under an outlet that encodes qualities",
                    node.label
                )))
            }
        },
        NodeKind::Outlet(_) if parent != Some(NodeKind::OutletsGroup) => {
            return Err(TreeError::Malformed(format!(
                "outlet '{}' outside the Outlets group",
                node.label
            )));
        }
        NodeKind::Quality if parent != Some(NodeKind::QualitiesGroup) => {
            return Err(TreeError::Malformed(format!(
                "quality '{}' outside a Qualities group",
                node.label
            )));
        }
        _ => {}
    }

    let mut seen: Vec<&str> = Vec::with_capacity(node.children.len());
    let mut outlets: Vec<OutletKind> = Vec::new();
    for child in &node.children {
        if child.label.trim().is_empty() {
            return Err(TreeError::Malformed(format!(
                "empty label under '{}'",
                node.label
            )));
        }
        if seen.contains(&child.label.as_str()) {
            return Err(TreeError::Malformed(format!(
                "duplicate label '{}' under '{}'",
                child.label, node.label
            )));
        }
        seen.push(&child.label);
        if let NodeKind::Outlet(kind) = child.kind {
            if outlets.contains(&kind) {
                return Err(TreeError::DuplicateOutlet(kind));
            }
            outlets.push(kind);
        }
        validate_node(child, Some(node.kind))?;
    }
    Ok(())
}

fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}

/// Outlet kinds a show is known to use.  Unknown names are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowHint {
    pub outlets: Vec<String>,
}

/// Builds pipeline trees.  Holds the quality labels so every show built by
/// one builder offers the same profiles.
#[derive(Debug, Clone)]
pub struct PipelineTreeBuilder {
    qualities: Vec<String>,
}

impl PipelineTreeBuilder {
    pub fn new() -> Self {
        Self {
            qualities: BASE_QUALITIES.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// Append configured quality labels after the built-in ones.  Labels are
    /// taken as given; `PipelineNode::validate` rejects duplicates.
    pub fn with_extra_qualities<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualities.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn qualities(&self) -> &[String] {
        &self.qualities
    }

    /// Build a show's tree.  Never fails: an absent or unusable hint yields
    /// the full base skeleton.
    pub fn build(&self, hint: Option<&ShowHint>) -> PipelineNode {
        let kinds = hint
            .map(Self::known_kinds)
            .filter(|kinds| !kinds.is_empty())
            .unwrap_or_else(|| OutletKind::ALL.to_vec());

        let outlets = kinds.into_iter().map(|k| self.outlet_node(k)).collect();

        PipelineNode::group(
            "",
            NodeKind::Root,
            vec![
                PipelineNode::leaf(LABEL_OVERVIEW, NodeKind::Overview),
                PipelineNode::leaf(LABEL_SETTINGS, NodeKind::Settings),
                PipelineNode::leaf(LABEL_INLET, NodeKind::Inlet),
                PipelineNode::group(LABEL_OUTLETS, NodeKind::OutletsGroup, outlets),
                PipelineNode::leaf(LABEL_STATISTICS, NodeKind::Statistics),
                PipelineNode::leaf(LABEL_EPISODES, NodeKind::Episodes),
            ],
        )
    }

    fn known_kinds(hint: &ShowHint) -> Vec<OutletKind> {
        let mut kinds = Vec::new();
        for name in &hint.outlets {
            match name.parse::<OutletKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(_) => debug!("pipeline: ignoring unknown outlet kind {:?}", name),
            }
        }
        kinds.sort();
        kinds
    }

    /// The subtree for one outlet.
    pub fn outlet_node(&self, kind: OutletKind) -> PipelineNode {
        if kind.owns_qualities() {
            let qualities = self
                .qualities
                .iter()
                .map(|q| PipelineNode::leaf(q.clone(), NodeKind::Quality))
                .collect();
            PipelineNode::group(
                kind.label(),
                NodeKind::Outlet(kind),
                vec![
                    PipelineNode::leaf(LABEL_SETTINGS, NodeKind::Settings),
                    PipelineNode::group(LABEL_QUALITIES, NodeKind::QualitiesGroup, qualities),
                ],
            )
        } else {
            PipelineNode::leaf(kind.label(), NodeKind::Outlet(kind))
        }
    }

    /// Insert an outlet at its canonical position.  Leaves the tree untouched
    /// on error.
    pub fn add_outlet(&self, root: &mut PipelineNode, kind: OutletKind) -> Result<(), TreeError> {
        let group = root.outlets_mut()?;
        let existing: Vec<OutletKind> = group
            .children
            .iter()
            .filter_map(|c| match c.kind {
                NodeKind::Outlet(k) => Some(k),
                _ => None,
            })
            .collect();
        if existing.contains(&kind) {
            return Err(TreeError::DuplicateOutlet(kind));
        }
        let pos = group
            .children
            .iter()
            .position(|c| matches!(c.kind, NodeKind::Outlet(k) if k > kind))
            .unwrap_or(group.children.len());
        group.children.insert(pos, self.outlet_node(kind));
        Ok(())
    }
}

impl Default for PipelineTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
