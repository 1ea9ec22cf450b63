//! Scenario tests for the cross-reference indexer against an in-memory host

use super::helpers::*;
use crate::{
    error::HOST_BUSY,
    hierarchy::{HierarchyNode, NodeKind, Scope},
    host::{memory::OBJECT_NOT_FOUND, MemoryHost},
    retry::Invoker,
    xref::{Index, Indexer, NeverCancel},
};
use std::sync::{atomic::AtomicBool, Arc};
use test_log::test;

async fn index_of(host: &MemoryHost, scope: Scope, progress: &RecordingProgress) -> Index {
    Indexer::new(host, Invoker::default())
        .build_index(scope, &NeverCancel, progress)
        .await
}

fn page_ids(index: &Index) -> Vec<String> {
    let mut ids: Vec<_> = index.entries().map(|e| e.page_id.clone()).collect();
    ids.sort();
    ids
}

#[test(tokio::test)]
async fn sections_scope_covers_current_notebook() {
    let host = MemoryHost::new(create_test_workspace());
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Sections, &progress).await;

    assert_eq!(
        page_ids(&index),
        vec!["idea-1", "idea-2", "old-1", "old-2", "old-3"]
    );
    let idea = index.get("{idea-1}").unwrap();
    assert_eq!(idea.local_path, "Ideas");
    assert_eq!(idea.full_path, "Work/Ideas");
    assert_eq!(idea.section_id.as_deref(), Some("Ideas"));
    assert_eq!(
        idea.link,
        "notes://idea-1?section-id={Ideas}&page-id={idea-1}&end"
    );
    let old = index.by_page_id("old-2").unwrap();
    assert_eq!(old.local_path, "Archive/2023");
    assert_eq!(old.full_path, "Work/Archive/2023");
}

#[test(tokio::test)]
async fn recycle_bin_pages_never_indexed() {
    let host = MemoryHost::new(create_test_workspace());
    for scope in [Scope::Pages, Scope::Sections, Scope::Notebooks] {
        let index = index_of(&host, scope, &RecordingProgress::default()).await;
        for entry in index.entries() {
            assert!(!entry.page_id.starts_with("gone"), "{entry:?}");
            assert!(!entry.full_path.contains("Trash"));
            assert!(!entry.full_path.contains("Deleted Pages"));
        }
    }
}

#[test(tokio::test)]
async fn pages_scope_prefixes_ancestor_names() {
    let host = MemoryHost::new(create_test_workspace());
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Pages, &progress).await;

    assert_eq!(page_ids(&index), vec!["old-1", "old-2", "old-3"]);
    for entry in index.entries() {
        assert_eq!(entry.local_path, "2023");
        assert_eq!(entry.full_path, "Work/Archive/2023");
    }
    assert_eq!(progress.total(), 3);
}

#[test(tokio::test)]
async fn notebooks_scope_skips_detached_and_unnamed_containers() {
    let host = MemoryHost::new(create_test_workspace());
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Notebooks, &progress).await;

    assert_eq!(
        page_ids(&index),
        vec!["bread", "idea-1", "idea-2", "old-1", "old-2", "old-3", "soup"]
    );
    let soup = index.get("{soup}").unwrap();
    assert_eq!(soup.local_path, "Home/Recipes");
    assert_eq!(soup.full_path, "Home/Recipes");
    assert!(index.by_page_id("loose-1").is_none());
    assert!(index.by_page_id("hidden-1").is_none());
}

#[test(tokio::test)]
async fn steps_match_reported_total() {
    let host = MemoryHost::new(create_test_workspace());
    for scope in [Scope::Pages, Scope::Sections, Scope::Notebooks] {
        let progress = RecordingProgress::default();
        index_of(&host, scope, &progress).await;
        assert_eq!(progress.count_calls(), 1);
        assert_eq!(progress.steps(), progress.total(), "{scope:?}");
    }
}

#[test(tokio::test)]
async fn relative_scopes_yield_nothing() {
    let host = MemoryHost::new(create_test_workspace());
    for scope in [Scope::Itself, Scope::Children] {
        let progress = RecordingProgress::default();
        let index = index_of(&host, scope, &progress).await;
        assert!(index.is_empty());
        assert_eq!(progress.count_calls(), 0);
    }
    assert_eq!(host.calls(), 0);
}

#[test(tokio::test)]
async fn empty_notebook_reports_no_progress() {
    let host = MemoryHost::new(
        HierarchyNode::new(NodeKind::Workspace, "", "")
            .with_children(vec![HierarchyNode::new(NodeKind::Notebook, "nb", "Empty")]),
    );
    let progress = RecordingProgress::default();
    let index = index_of(&host, Scope::Sections, &progress).await;
    assert!(index.is_empty());
    assert_eq!(progress.count_calls(), 0);
    assert_eq!(progress.steps(), 0);
}

#[test(tokio::test)]
async fn cancellation_after_k_steps_keeps_first_k_entries() {
    let host = MemoryHost::new(create_test_workspace());
    let cancel = Arc::new(AtomicBool::new(false));
    let progress = RecordingProgress::cancelling_after(3, cancel.clone());

    let index = Indexer::new(&host, Invoker::default())
        .build_index(Scope::Sections, &cancel, &progress)
        .await;

    assert_eq!(progress.steps(), 3);
    assert_eq!(progress.total(), 5);
    assert_eq!(page_ids(&index), vec!["idea-1", "idea-2", "old-1"]);
}

#[test(tokio::test)]
async fn cancelled_before_start_returns_empty() {
    let host = MemoryHost::new(create_test_workspace());
    let cancel = AtomicBool::new(true);
    let progress = RecordingProgress::default();

    let index = Indexer::new(&host, Invoker::default())
        .build_index(Scope::Notebooks, &cancel, &progress)
        .await;

    assert!(index.is_empty());
    assert_eq!(progress.count_calls(), 0);
}

#[test(tokio::test(start_paused = true))]
async fn busy_notebook_fetch_is_retried() {
    let host = MemoryHost::new(create_test_workspace());
    // call 2 is the notebook fetch, call 3 its first retry
    host.fail_call(2, HOST_BUSY);
    host.fail_call(3, HOST_BUSY);
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Sections, &progress).await;

    assert_eq!(index.len(), 5);
    assert_eq!(host.calls(), 9);
}

#[test(tokio::test(start_paused = true))]
async fn busy_link_resolution_is_retried_mid_walk() {
    let host = MemoryHost::new(create_test_workspace());
    // calls 1-3: current notebook, notebook fetch, link for idea-1; 4 and 5 are idea-2
    host.fail_call(4, HOST_BUSY);
    host.fail_call(5, HOST_BUSY);
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Sections, &progress).await;

    assert_eq!(index.len(), 5);
    assert_eq!(index.by_page_id("idea-2").unwrap().token, "{idea-2}");
    assert_eq!(progress.steps(), progress.total());
    assert_eq!(progress.total(), 5);
    assert_eq!(host.calls(), 9);
}

#[test(tokio::test(start_paused = true))]
async fn failed_link_skips_entry_but_still_steps() {
    let host = MemoryHost::new(create_test_workspace());
    host.fail_call(4, OBJECT_NOT_FOUND);
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Sections, &progress).await;

    assert_eq!(progress.steps(), 5);
    assert_eq!(index.len(), 4);
    assert!(index.by_page_id("idea-2").is_none());
}

#[test(tokio::test(start_paused = true))]
async fn unreachable_host_yields_empty_index() {
    let host = MemoryHost::new(create_test_workspace());
    host.fail_next(HOST_BUSY, 3);
    let progress = RecordingProgress::default();

    let index = index_of(&host, Scope::Sections, &progress).await;

    assert!(index.is_empty());
    assert_eq!(progress.count_calls(), 0);
    assert_eq!(host.calls(), 3);
}

#[test(tokio::test)]
async fn custom_separator_applies_to_both_paths() {
    let host = MemoryHost::new(create_test_workspace());
    let index = Indexer::new(&host, Invoker::default())
        .with_separator(" > ")
        .build_index(Scope::Pages, &NeverCancel, &RecordingProgress::default())
        .await;
    let entry = index.by_page_id("old-1").unwrap();
    assert_eq!(entry.full_path, "Work > Archive > 2023");
}
