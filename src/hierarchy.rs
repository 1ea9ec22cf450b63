//! The host's notebook tree as seen through a single snapshot.
//!
//! A [`HierarchyNode`] tree is built fresh from every host fetch and thrown away once the
//! operation that asked for it completes. The walker, the diff detector and the in-memory
//! host all share the helpers defined here so that they agree on which nodes are addressable.

use serde::{Deserialize, Serialize};

use crate::error::NotewalkError;

/// Separator used when joining node names into a path label.
pub const PATH_SEPARATOR: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Workspace,
    Notebook,
    SectionGroup,
    Section,
    Page,
    /// The host's "unfiled notes" container. It hangs off the tree but is not part of any path.
    UnfiledNotes,
}

impl NodeKind {
    /// Depth of this kind below the workspace, used when pruning to a [`Scope`].
    fn rank(&self) -> u8 {
        match self {
            NodeKind::Workspace => 0,
            NodeKind::Notebook | NodeKind::UnfiledNotes => 1,
            NodeKind::SectionGroup => 2,
            NodeKind::Section => 3,
            NodeKind::Page => 4,
        }
    }
}

/// Requested traversal depth for a host fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The addressed node only.
    #[serde(rename = "self")]
    Itself,
    /// The addressed node and its direct children.
    Children,
    /// Everything down to and including pages.
    Pages,
    /// Everything down to and including sections.
    Sections,
    /// Everything down to and including notebooks.
    Notebooks,
}

impl Scope {
    /// Deepest [`NodeKind`] rank kept by this scope, or `None` for the relative scopes.
    fn depth_rank(&self) -> Option<u8> {
        match self {
            Scope::Pages => Some(NodeKind::Page.rank()),
            Scope::Sections => Some(NodeKind::Section.rank()),
            Scope::Notebooks => Some(NodeKind::Notebook.rank()),
            Scope::Itself | Scope::Children => None,
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "self" => Ok(Scope::Itself),
            "children" => Ok(Scope::Children),
            "pages" => Ok(Scope::Pages),
            "sections" => Ok(Scope::Sections),
            "notebooks" => Ok(Scope::Notebooks),
            other => Err(format!(
                "unknown scope '{other}', expected one of: self, children, pages, sections, notebooks"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recycle_bin: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub currently_viewed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(kind: NodeKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        HierarchyNode {
            kind,
            id: id.into(),
            name: name.into(),
            recycle_bin: false,
            currently_viewed: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<HierarchyNode>) -> Self {
        self.children = children;
        self
    }

    pub fn in_recycle_bin(mut self) -> Self {
        self.recycle_bin = true;
        self
    }

    pub fn viewed(mut self) -> Self {
        self.currently_viewed = true;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, NotewalkError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, NotewalkError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_page(&self) -> bool {
        self.kind == NodeKind::Page
    }

    pub fn is_section(&self) -> bool {
        self.kind == NodeKind::Section
    }

    /// Containers that hang off a notebook or workspace without being part of the
    /// addressable path: a nested workspace ("Notebooks") or the unfiled notes bin.
    pub fn is_detached(&self) -> bool {
        matches!(self.kind, NodeKind::Workspace | NodeKind::UnfiledNotes)
    }

    /// Drop every recycle-bin subtree, at any depth.
    pub fn strip_recycle_bin(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.children.retain(|child| !child.recycle_bin);
            stack.extend(node.children.iter_mut());
        }
    }

    pub fn without_recycle_bin(mut self) -> Self {
        self.strip_recycle_bin();
        self
    }

    /// Ids of the direct children, in snapshot order, skipping recycle-bin children and
    /// children the host has not assigned an id to yet.
    pub fn child_ids(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter(|child| !child.recycle_bin && !child.id.is_empty())
            .map(|child| child.id.as_str())
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&HierarchyNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut HierarchyNode> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Locate the section flagged as currently viewed.
    ///
    /// Returns the section together with the names of its named ancestors, outermost first.
    pub fn find_current_section(&self) -> Option<(Vec<&str>, &HierarchyNode)> {
        let mut stack: Vec<(&HierarchyNode, Vec<&str>)> = vec![(self, Vec::new())];
        while let Some((node, ancestors)) = stack.pop() {
            if node.is_section() && node.currently_viewed {
                return Some((ancestors, node));
            }
            let mut chain = ancestors;
            if !node.name.is_empty() {
                chain.push(node.name.as_str());
            }
            for child in node.children.iter().rev() {
                stack.push((child, chain.clone()));
            }
        }
        None
    }

    /// Number of pages the walker will visit when started at this node.
    ///
    /// Follows the walker's rules: pages count only under sections, and detached or unnamed
    /// containers are skipped.
    pub fn count_pages(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node.kind {
                NodeKind::Section => {
                    total += node.children.iter().filter(|c| c.is_page()).count();
                }
                NodeKind::Workspace | NodeKind::Notebook | NodeKind::SectionGroup => {
                    stack.extend(
                        node.children
                            .iter()
                            .filter(|c| !c.is_detached() && !c.name.is_empty()),
                    );
                }
                NodeKind::Page | NodeKind::UnfiledNotes => {}
            }
        }
        total
    }

    /// Copy of this subtree cut down to what a fetch with `scope` returns.
    pub fn pruned(&self, scope: Scope) -> HierarchyNode {
        match scope {
            Scope::Itself => HierarchyNode {
                children: Vec::new(),
                ..self.clone()
            },
            Scope::Children => HierarchyNode {
                children: self
                    .children
                    .iter()
                    .map(|child| child.pruned(Scope::Itself))
                    .collect(),
                ..self.clone()
            },
            _ => {
                let max_rank = scope.depth_rank().unwrap_or(u8::MAX);
                let mut pruned = self.clone();
                let mut stack = vec![&mut pruned];
                while let Some(node) = stack.pop() {
                    node.children.retain(|child| child.kind.rank() <= max_rank);
                    stack.extend(node.children.iter_mut());
                }
                pruned
            }
        }
    }
}

/// Join a path prefix and a label, tolerating either side being empty.
pub fn join_path(prefix: &str, label: &str, separator: &str) -> String {
    match (prefix.is_empty(), label.is_empty()) {
        (true, _) => label.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}{separator}{label}"),
    }
}
