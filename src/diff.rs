//! Identity discovery by structural diff.
//!
//! Some host mutations create a child object without reporting its id. The detector records the
//! container's child ids, runs the mutation, re-reads the container and takes the difference.
//!
//! The host gives no way to lock a container, so a child added by another actor between the two
//! reads is indistinguishable from the one this mutation created. When more than one new id
//! appears, the first in the host's child order is returned and a warning is logged.

use std::{collections::BTreeSet, future::Future};

use crate::{
    error::HostError,
    hierarchy::{HierarchyNode, NodeKind, Scope},
    host::Host,
    retry::Invoker,
};

pub struct DiffDetector<'h, H: Host> {
    host: &'h H,
    invoker: Invoker,
}

impl<'h, H: Host> DiffDetector<'h, H> {
    pub fn new(host: &'h H, invoker: Invoker) -> Self {
        DiffDetector { host, invoker }
    }

    /// Run `mutation` against `container_id` and return the id of the child it created.
    ///
    /// `None` when the container cannot be read, the mutation fails, or no new child appears.
    pub async fn detect_created<F, Fut>(
        &self,
        container_id: &str,
        operation: &str,
        mutation: F,
    ) -> Option<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), HostError>>,
    {
        let before = self.fetch_children(container_id).await?;
        self.diff_after(container_id, &before, operation, mutation)
            .await
    }

    /// Add an empty section named `name` under `parent_id` and return its id.
    pub async fn create_section(&self, parent_id: &str, name: &str) -> Option<String> {
        let mut parent = self.fetch_children(parent_id).await?;
        if !matches!(parent.kind, NodeKind::Notebook | NodeKind::SectionGroup) {
            tracing::warn!(
                "[DiffDetector::create_section] '{parent_id}' is a {:?}, not a section container",
                parent.kind
            );
            return None;
        }
        let before = parent.clone();
        parent
            .children
            .push(HierarchyNode::new(NodeKind::Section, "", name));
        let snapshot = match parent.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("[DiffDetector::create_section] cannot serialize snapshot: {e}");
                return None;
            }
        };

        let host = self.host;
        let snapshot = snapshot.as_str();
        self.diff_after(parent_id, &before, "create_section", move || {
            host.mutate_container(parent_id, snapshot)
        })
        .await
    }

    /// Run an import or merge of external pages into `section_id` and return the id of the page
    /// it produced.
    pub async fn import_pages<F, Fut>(&self, section_id: &str, import: F) -> Option<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), HostError>>,
    {
        self.detect_created(section_id, "import_pages", import)
            .await
    }

    async fn fetch_children(&self, container_id: &str) -> Option<HierarchyNode> {
        let host = self.host;
        let fetched = self
            .invoker
            .invoke("fetch_subtree", move || {
                host.fetch_subtree(Some(container_id), Scope::Children)
            })
            .await
            .flatten();
        if fetched.is_none() {
            tracing::warn!("[DiffDetector] container '{container_id}' could not be read");
        }
        fetched
    }

    async fn diff_after<F, Fut>(
        &self,
        container_id: &str,
        before: &HierarchyNode,
        operation: &str,
        mutation: F,
    ) -> Option<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), HostError>>,
    {
        let before: BTreeSet<&str> = before.child_ids().into_iter().collect();
        self.invoker.invoke(operation, mutation).await?;
        let after = self.fetch_children(container_id).await?;
        new_child(&before, &after)
    }
}

/// First child of `after` whose id is not in `before`.
fn new_child(before: &BTreeSet<&str>, after: &HierarchyNode) -> Option<String> {
    let created: Vec<&str> = after
        .child_ids()
        .into_iter()
        .filter(|id| !before.contains(id))
        .collect();
    if created.len() > 1 {
        tracing::warn!(
            "[DiffDetector] {} new children under '{}', reporting the first: {created:?}",
            created.len(),
            after.id
        );
    }
    created.first().map(|id| id.to_string())
}
