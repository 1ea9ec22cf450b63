//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use notewalk::hierarchy::{HierarchyNode, NodeKind};
use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn section(id: &str, name: &str, pages: &[(&str, &str)]) -> HierarchyNode {
    HierarchyNode::new(NodeKind::Section, id, name).with_children(
        pages
            .iter()
            .map(|(id, name)| HierarchyNode::new(NodeKind::Page, *id, *name))
            .collect(),
    )
}

/// Two notebooks, a nested section group, and a recycle bin. "Design" is the viewed section.
#[allow(dead_code)]
pub fn create_test_hierarchy() -> HierarchyNode {
    HierarchyNode::new(NodeKind::Workspace, "", "").with_children(vec![
        HierarchyNode::new(NodeKind::Notebook, "nb-work", "Work").with_children(vec![
            section(
                "s-design",
                "Design",
                &[("p-arch", "Architecture"), ("p-api", "API Notes")],
            )
            .viewed(),
            HierarchyNode::new(NodeKind::SectionGroup, "g-team", "Team").with_children(vec![
                section("s-standup", "Standups", &[("p-mon", "Monday")]),
                section("s-old", "Old", &[("p-gone", "Gone")]).in_recycle_bin(),
            ]),
        ]),
        HierarchyNode::new(NodeKind::Notebook, "nb-home", "Home")
            .with_children(vec![section("s-garden", "Garden", &[("p-seeds", "Seeds")])]),
    ])
}

/// Write [`create_test_hierarchy`] to `<temp_dir>/workspace.json` and return its path.
#[allow(dead_code)]
pub fn create_snapshot_file(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("workspace.json");
    let json = create_test_hierarchy().to_json().unwrap();
    std::fs::write(&path, json).unwrap();
    path
}
