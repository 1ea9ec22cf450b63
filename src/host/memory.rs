use parking_lot::{Mutex, RwLock};
use std::{
    collections::BTreeMap,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::Host;
use crate::{
    error::{HostError, NotewalkError},
    hierarchy::{HierarchyNode, NodeKind, Scope},
};

/// Status returned when an id does not name a live object.
pub const OBJECT_NOT_FOUND: u32 = 0x8004_2014;
/// Status returned when a submitted snapshot cannot be applied.
pub const INVALID_SNAPSHOT: u32 = 0x8004_2001;

/// In-process [`Host`] backed by a [`HierarchyNode`] tree.
///
/// Used by the CLI to work on exported snapshots and by tests. Ids for objects created through
/// [`Host::mutate_container`] are assigned here and never reported back to the caller, which is
/// the situation the diff detector exists for.
pub struct MemoryHost {
    root: RwLock<HierarchyNode>,
    /// Injected status codes keyed by 1-based call number.
    faults: Mutex<BTreeMap<usize, u32>>,
    calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl MemoryHost {
    pub fn new(root: HierarchyNode) -> Self {
        MemoryHost {
            root: RwLock::new(root),
            faults: Mutex::new(BTreeMap::new()),
            calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Load a workspace from a JSON snapshot file.
    pub fn from_snapshot_file<P: AsRef<Path>>(path: P) -> Result<Self, NotewalkError> {
        tracing::debug!("Loading hierarchy snapshot from {:?}", path.as_ref());
        let content = std::fs::read_to_string(path)?;
        Ok(MemoryHost::new(HierarchyNode::from_json(&content)?))
    }

    /// Answer the next `times` host calls with `code` instead of serving them.
    pub fn fail_next(&self, code: u32, times: usize) {
        let next = self.calls() + 1;
        let mut faults = self.faults.lock();
        faults.extend((next..next + times).map(|call| (call, code)));
    }

    /// Answer the `call`-th host call (1-based, counted since creation) with `code`.
    pub fn fail_call(&self, call: usize, code: u32) {
        self.faults.lock().insert(call, code);
    }

    /// Total host calls received, including the ones answered with an injected fault.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> HierarchyNode {
        self.root.read().clone()
    }

    /// Host-side import: merge `pages` into the section `section_id`, assigning fresh ids.
    pub async fn import_pages(
        &self,
        section_id: &str,
        pages: Vec<HierarchyNode>,
    ) -> Result<(), HostError> {
        self.enter()?;
        let mut root = self.root.write();
        let section = root
            .find_mut(section_id)
            .filter(|node| node.is_section())
            .ok_or_else(|| not_found(section_id))?;
        for mut page in pages {
            page.kind = NodeKind::Page;
            page.id = String::new();
            self.assign_ids(&mut page);
            section.children.push(page);
        }
        Ok(())
    }

    fn enter(&self) -> Result<(), HostError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.faults.lock().remove(&call) {
            Some(code) => Err(HostError::new(code, "injected host fault")),
            None => Ok(()),
        }
    }

    fn fresh_id(&self) -> String {
        format!("mem-{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn assign_ids(&self, node: &mut HierarchyNode) {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            if node.id.is_empty() {
                node.id = self.fresh_id();
            }
            stack.extend(node.children.iter_mut());
        }
    }
}

fn not_found(id: &str) -> HostError {
    HostError::new(OBJECT_NOT_FOUND, format!("no object with id '{id}'"))
}

fn child_kind(parent: NodeKind) -> Option<NodeKind> {
    match parent {
        NodeKind::Workspace => Some(NodeKind::Notebook),
        NodeKind::Notebook | NodeKind::SectionGroup | NodeKind::UnfiledNotes => {
            Some(NodeKind::Section)
        }
        NodeKind::Section => Some(NodeKind::Page),
        NodeKind::Page => None,
    }
}

fn parent_section<'a>(root: &'a HierarchyNode, page_id: &str) -> Option<&'a HierarchyNode> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_section() && node.children.iter().any(|c| c.id == page_id) {
            return Some(node);
        }
        stack.extend(node.children.iter());
    }
    None
}

impl Host for MemoryHost {
    async fn fetch_subtree(
        &self,
        node_id: Option<&str>,
        scope: Scope,
    ) -> Result<Option<HierarchyNode>, HostError> {
        self.enter()?;
        let root = self.root.read();
        Ok(match node_id {
            None => Some(root.pruned(scope)),
            Some("") => None,
            Some(id) => root.find(id).map(|node| node.pruned(scope)),
        })
    }

    async fn resolve_cross_reference(
        &self,
        object_id: &str,
        sub_object_id: Option<&str>,
    ) -> Result<String, HostError> {
        self.enter()?;
        let root = self.root.read();
        let node = root.find(object_id).ok_or_else(|| not_found(object_id))?;
        let mut link = format!("notes://{}", node.name.replace(' ', "%20"));
        if node.is_page() {
            if let Some(section) = parent_section(&root, object_id) {
                link.push_str(&format!("?section-id={{{}}}&", section.id));
            } else {
                link.push('?');
            }
            link.push_str(&format!("page-id={{{object_id}}}"));
        } else {
            link.push_str(&format!("?object-id={{{object_id}}}"));
        }
        if let Some(sub) = sub_object_id {
            link.push_str(&format!("&sub-id={{{sub}}}"));
        }
        link.push_str("&end");
        Ok(link)
    }

    async fn mutate_container(&self, container_id: &str, snapshot: &str) -> Result<(), HostError> {
        self.enter()?;
        let update = HierarchyNode::from_json(snapshot)
            .map_err(|e| HostError::new(INVALID_SNAPSHOT, e.to_string()))?;
        if update.id != container_id {
            return Err(HostError::new(
                INVALID_SNAPSHOT,
                format!(
                    "snapshot root '{}' does not match container '{container_id}'",
                    update.id
                ),
            ));
        }
        let mut root = self.root.write();
        let container = root
            .find_mut(container_id)
            .ok_or_else(|| not_found(container_id))?;
        if update.kind != container.kind {
            return Err(HostError::new(
                INVALID_SNAPSHOT,
                format!("cannot change the kind of '{container_id}'"),
            ));
        }
        let mut existing = std::mem::take(&mut container.children);
        let mut children = Vec::with_capacity(update.children.len());
        for mut child in update.children {
            match existing.iter().position(|old| !child.id.is_empty() && old.id == child.id) {
                Some(pos) => {
                    let mut kept = existing.swap_remove(pos);
                    kept.name = child.name;
                    kept.recycle_bin = child.recycle_bin;
                    children.push(kept);
                }
                None => {
                    child.id = String::new();
                    self.assign_ids(&mut child);
                    children.push(child);
                }
            }
        }
        container.name = update.name;
        container.children = children;
        Ok(())
    }

    async fn create_child_object(&self, parent_id: &str) -> Result<String, HostError> {
        self.enter()?;
        let mut root = self.root.write();
        let parent = root.find_mut(parent_id).ok_or_else(|| not_found(parent_id))?;
        let kind = child_kind(parent.kind).ok_or_else(|| {
            HostError::new(
                INVALID_SNAPSHOT,
                format!("'{parent_id}' cannot hold children"),
            )
        })?;
        let id = self.fresh_id();
        parent
            .children
            .push(HierarchyNode::new(kind, id.clone(), "Untitled"));
        Ok(id)
    }

    async fn current_notebook_id(&self) -> Result<Option<String>, HostError> {
        self.enter()?;
        let root = self.root.read();
        let notebooks = || {
            root.children
                .iter()
                .filter(|node| node.kind == NodeKind::Notebook && !node.recycle_bin)
        };
        Ok(notebooks()
            .find(|nb| nb.find_current_section().is_some())
            .or_else(|| notebooks().next())
            .map(|nb| nb.id.clone()))
    }
}
