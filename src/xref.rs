//! Cross-reference index over a scoped slice of the notebook tree.
//!
//! [`Indexer::build_index`] fetches a snapshot for the requested [`Scope`], drops recycle-bin
//! subtrees and walks what is left depth first. Every page under a section gets a link string
//! from the host; the identity token embedded in that link keys a [`CrossReferenceEntry`] that
//! records where the page lives.
//!
//! The host has no "path of this page" query, so paths are assembled from ancestor names while
//! walking. Progress is reported once per page against a total counted up front, and a
//! cancellation request is honored at every node and before every page.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{btree_map, BTreeMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    hierarchy::{join_path, HierarchyNode, NodeKind, Scope, PATH_SEPARATOR},
    host::Host,
    retry::Invoker,
};

/// Identity token in a host link: the braced value following `page-id=`.
pub static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"page-id=(\{[^}]*\})").expect("token pattern is a valid regex")
});

/// Pull the identity token out of a host link string.
pub fn extract_token(link: &str) -> Option<&str> {
    TOKEN_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Cooperative cancellation, polled between units of work.
pub trait Cancellation {
    fn is_requested(&self) -> bool;
}

impl Cancellation for AtomicBool {
    fn is_requested(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<C: Cancellation + ?Sized> Cancellation for Arc<C> {
    fn is_requested(&self) -> bool {
        (**self).is_requested()
    }
}

/// Cancellation source that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_requested(&self) -> bool {
        false
    }
}

/// Receives the page total once, then one step per visited page.
pub trait Progress {
    fn set_count(&self, total: usize);
    fn step(&self);
}

impl<C, S> Progress for (C, S)
where
    C: Fn(usize),
    S: Fn(),
{
    fn set_count(&self, total: usize) {
        (self.0)(total)
    }

    fn step(&self) {
        (self.1)()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_count(&self, _total: usize) {}
    fn step(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceEntry {
    pub page_id: String,
    pub section_id: Option<String>,
    pub token: String,
    pub name: String,
    /// Path within the requested scope.
    pub local_path: String,
    /// Path from the root of the host tree.
    pub full_path: String,
    pub link: String,
}

/// Identity token → [`CrossReferenceEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(BTreeMap<String, CrossReferenceEntry>);

impl Index {
    pub fn get(&self, token: &str) -> Option<&CrossReferenceEntry> {
        self.0.get(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CrossReferenceEntry> {
        self.0.values()
    }

    /// Entry for a page id, for callers that know the page but not its token.
    pub fn by_page_id(&self, page_id: &str) -> Option<&CrossReferenceEntry> {
        self.0.values().find(|entry| entry.page_id == page_id)
    }

    pub fn into_inner(self) -> BTreeMap<String, CrossReferenceEntry> {
        self.0
    }

    /// Insert keyed by the entry's token. A token seen twice means the host handed out the same
    /// identity for two pages; the first entry is kept.
    fn insert(&mut self, entry: CrossReferenceEntry) {
        match self.0.entry(entry.token.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            btree_map::Entry::Occupied(existing) => {
                tracing::warn!(
                    "[Indexer::build_index] token {} already indexed for page {}, ignoring page {}",
                    entry.token,
                    existing.get().page_id,
                    entry.page_id
                );
            }
        }
    }
}

/// Builds cross-reference [`Index`]es against a [`Host`].
pub struct Indexer<'h, H: Host> {
    host: &'h H,
    invoker: Invoker,
    separator: String,
}

impl<'h, H: Host> Indexer<'h, H> {
    pub fn new(host: &'h H, invoker: Invoker) -> Self {
        Indexer {
            host,
            invoker,
            separator: PATH_SEPARATOR.to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Index every page in `scope`.
    ///
    /// Only [`Scope::Pages`] (current section), [`Scope::Sections`] (current notebook) and
    /// [`Scope::Notebooks`] (whole workspace) produce entries. On cancellation the entries
    /// gathered so far are returned.
    pub async fn build_index<C, P>(&self, scope: Scope, cancel: &C, progress: &P) -> Index
    where
        C: Cancellation + ?Sized,
        P: Progress + ?Sized,
    {
        let mut index = Index::default();

        let Some(mut container) = self.fetch_container(scope).await else {
            return index;
        };
        container.strip_recycle_bin();

        if cancel.is_requested() {
            return index;
        }

        let (prefix, start) = match scope {
            Scope::Pages => match container.find_current_section() {
                Some((ancestors, section)) => (ancestors.join(&self.separator), section),
                None => {
                    tracing::warn!("[Indexer::build_index] no current section in snapshot");
                    return index;
                }
            },
            Scope::Notebooks => (String::new(), &container),
            _ => (container.name.clone(), &container),
        };

        let total = start.count_pages();
        if total == 0 {
            tracing::debug!("[Indexer::build_index] nothing to index in {scope:?} scope");
            return index;
        }
        progress.set_count(total);

        self.walk(start, &prefix, cancel, progress, &mut index)
            .await;

        tracing::debug!(
            "[Indexer::build_index] indexed {} of {total} pages",
            index.len()
        );
        index
    }

    async fn fetch_container(&self, scope: Scope) -> Option<HierarchyNode> {
        let host = self.host;
        let node_id = match scope {
            Scope::Notebooks => None,
            Scope::Sections | Scope::Pages => {
                let current = self
                    .invoker
                    .invoke("current_notebook_id", move || host.current_notebook_id())
                    .await
                    .flatten();
                match current {
                    Some(id) => Some(id),
                    None => {
                        tracing::warn!("[Indexer::build_index] no current notebook");
                        return None;
                    }
                }
            }
            Scope::Itself | Scope::Children => return None,
        };

        let node_id = node_id.as_deref();
        self.invoker
            .invoke("fetch_subtree", move || {
                host.fetch_subtree(node_id, Scope::Pages)
            })
            .await
            .flatten()
    }

    /// Depth-first walk from `start`, filling `index`.
    ///
    /// The worklist carries each node with its path label relative to `start`; `None` means the
    /// node is the walk root and contributes its own name only if it is a section.
    async fn walk<C, P>(
        &self,
        start: &HierarchyNode,
        prefix: &str,
        cancel: &C,
        progress: &P,
        index: &mut Index,
    ) where
        C: Cancellation + ?Sized,
        P: Progress + ?Sized,
    {
        let sep = self.separator.as_str();
        let mut worklist: Vec<(&HierarchyNode, Option<String>)> = vec![(start, None)];

        while let Some((node, label)) = worklist.pop() {
            if cancel.is_requested() {
                tracing::debug!("[Indexer::walk] cancelled before '{}'", node.name);
                return;
            }
            match node.kind {
                NodeKind::Section => {
                    let local_path = label.unwrap_or_else(|| node.name.clone());
                    let full_path = join_path(prefix, &local_path, sep);
                    for page in node.children.iter().filter(|c| c.is_page()) {
                        if cancel.is_requested() {
                            tracing::debug!("[Indexer::walk] cancelled in '{full_path}'");
                            return;
                        }
                        let entry = self.index_page(node, page, &local_path, &full_path).await;
                        if let Some(entry) = entry {
                            index.insert(entry);
                        }
                        progress.step();
                    }
                }
                NodeKind::Workspace | NodeKind::Notebook | NodeKind::SectionGroup => {
                    let children = node
                        .children
                        .iter()
                        .filter(|c| !c.is_detached() && !c.name.is_empty());
                    for child in children.rev() {
                        let child_label = match &label {
                            Some(parent) => format!("{parent}{sep}{}", child.name),
                            None => child.name.clone(),
                        };
                        worklist.push((child, Some(child_label)));
                    }
                }
                NodeKind::Page | NodeKind::UnfiledNotes => {}
            }
        }
    }

    async fn index_page(
        &self,
        section: &HierarchyNode,
        page: &HierarchyNode,
        local_path: &str,
        full_path: &str,
    ) -> Option<CrossReferenceEntry> {
        let host = self.host;
        let page_id = page.id.as_str();
        let link = self
            .invoker
            .invoke("resolve_cross_reference", move || {
                host.resolve_cross_reference(page_id, None)
            })
            .await?;

        let Some(token) = extract_token(&link) else {
            tracing::debug!("[Indexer::walk] no identity token in link for page {page_id}");
            return None;
        };

        Some(CrossReferenceEntry {
            page_id: page.id.clone(),
            section_id: Some(section.id.clone()),
            token: token.to_string(),
            name: page.name.clone(),
            local_path: local_path.to_string(),
            full_path: full_path.to_string(),
            link,
        })
    }
}
