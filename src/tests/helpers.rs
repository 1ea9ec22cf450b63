//! Shared test utilities for hierarchy, indexing and mutation testing

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use crate::{
    hierarchy::{HierarchyNode, NodeKind},
    xref::Progress,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Helper function to create a node whose id doubles as its name
pub fn create_test_node(kind: NodeKind, id: &str) -> HierarchyNode {
    HierarchyNode::new(kind, id, id)
}

pub fn page(id: &str) -> HierarchyNode {
    create_test_node(NodeKind::Page, id)
}

pub fn section(id: &str, pages: &[&str]) -> HierarchyNode {
    create_test_node(NodeKind::Section, id).with_children(pages.iter().map(|p| page(p)).collect())
}

/// Workspace used across the scenario tests:
///
/// ```text
/// (workspace)
/// ├── Home
/// │   └── Recipes: soup, bread
/// ├── Work                      (current notebook)
/// │   ├── Ideas: idea-1, idea-2
/// │   ├── Trash: gone-1         (recycle bin)
/// │   ├── Archive
/// │   │   ├── 2023: old-1, old-2, old-3   (currently viewed)
/// │   │   └── Deleted Pages     (recycle bin group)
/// │   │       └── Lost: gone-2
/// │   └── Unfiled Notes         (detached)
/// │       └── Quick: loose-1
/// └── (unnamed notebook)
///     └── Hidden: hidden-1
/// ```
pub fn create_test_workspace() -> HierarchyNode {
    init_logging();

    let home = create_test_node(NodeKind::Notebook, "Home")
        .with_children(vec![section("Recipes", &["soup", "bread"])]);

    let work = create_test_node(NodeKind::Notebook, "Work").with_children(vec![
        section("Ideas", &["idea-1", "idea-2"]),
        section("Trash", &["gone-1"]).in_recycle_bin(),
        create_test_node(NodeKind::SectionGroup, "Archive").with_children(vec![
            section("2023", &["old-1", "old-2", "old-3"]).viewed(),
            create_test_node(NodeKind::SectionGroup, "Deleted Pages")
                .in_recycle_bin()
                .with_children(vec![section("Lost", &["gone-2"])]),
        ]),
        create_test_node(NodeKind::UnfiledNotes, "Unfiled Notes")
            .with_children(vec![section("Quick", &["loose-1"])]),
    ]);

    let unnamed = HierarchyNode::new(NodeKind::Notebook, "nameless", "")
        .with_children(vec![section("Hidden", &["hidden-1"])]);

    HierarchyNode::new(NodeKind::Workspace, "", "").with_children(vec![home, work, unnamed])
}

/// Progress collaborator that records what it was told and can trip a cancellation flag after
/// a given number of steps.
#[derive(Default)]
pub struct RecordingProgress {
    pub counts: AtomicUsize,
    pub total: AtomicUsize,
    pub steps: AtomicUsize,
    pub cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl RecordingProgress {
    pub fn cancelling_after(steps: usize, flag: Arc<AtomicBool>) -> Self {
        RecordingProgress {
            cancel_after: Some((steps, flag)),
            ..Default::default()
        }
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }
}

impl Progress for RecordingProgress {
    fn set_count(&self, total: usize) {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn step(&self) {
        let done = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, flag)) = &self.cancel_after {
            if done >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
}
